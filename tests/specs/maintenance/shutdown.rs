//! Shutdown and online specs

use crate::prelude::*;

#[yare::parameterized(
    deny_attachments  = { ShutdownMode::DenyNewAttachments },
    deny_transactions = { ShutdownMode::DenyNewTransactions },
    force             = { ShutdownMode::Force },
)]
fn shutdown_then_online_leaves_the_database_attachable(mode: ShutdownMode) {
    block_on(async {
        let mut server = Server::start().await;
        server.manager.shutdown(DB, mode, 0).await.unwrap();
        assert_ne!(server.db().mode, OperationMode::Normal);

        server.manager.online(DB).await.unwrap();
        assert_eq!(server.db().mode, OperationMode::Normal);

        let mut again = connect(&server.fake).await;
        again.sweep(DB).await.unwrap();
    });
}

#[tokio::test]
async fn every_basic_mode_in_turn_on_one_attachment() {
    let mut server = Server::start().await;
    for mode in ShutdownMode::ALL {
        server.manager.shutdown(DB, mode, 0).await.unwrap();
        server.manager.online(DB).await.unwrap();
    }
    assert_eq!(server.db().mode, OperationMode::Normal);
}

#[tokio::test]
async fn extended_full_shutdown_and_normal_online() {
    let mut server = Server::start().await;
    server
        .manager
        .shutdown_ex(DB, OperationMode::Full, ShutdownModeEx::Force, 0)
        .await
        .unwrap();
    assert_eq!(server.db().mode, OperationMode::Full);

    let err = server.manager.sweep(DB).await.unwrap_err();
    assert_eq!(err.to_string(), format!("database {DB} shutdown\n"));

    server.manager.online_ex(DB, OperationMode::Normal).await.unwrap();
    assert_eq!(server.db().mode, OperationMode::Normal);
}

#[tokio::test]
async fn extended_single_user_shutdown() {
    let mut server = Server::start().await;
    server
        .manager
        .shutdown_ex(DB, OperationMode::Single, ShutdownModeEx::DenyNewAttachments, 5)
        .await
        .unwrap();
    assert_eq!(server.db().mode, OperationMode::Single);
}

#[tokio::test]
async fn negative_timeout_is_rejected_locally() {
    let mut server = Server::start().await;
    let err = server.manager.shutdown(DB, ShutdownMode::Force, -1).await.unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(_)));
    assert_eq!(server.db().mode, OperationMode::Normal);
}
