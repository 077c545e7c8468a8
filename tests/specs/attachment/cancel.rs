//! Cancellation and connection-loss specs

use std::time::Duration;

use crate::prelude::*;

#[tokio::test]
async fn cancelling_a_stalled_drain_fails_promptly() {
    let fake = FakeService::new().with_database(DB).stall_after_info_calls(2);
    let mut server = Server::with(fake).await;
    let token = server.manager.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), server.manager.sweep(DB))
        .await
        .expect("cancellation should unblock the drain");
    assert!(matches!(result, Err(Error::ConnectionLost)));
    assert!(server.manager.is_closed());
    assert!(server.fake.is_closed());
}

#[tokio::test]
async fn cancelling_while_a_full_channel_sink_blocks_fails_promptly() {
    let fake = FakeService::new().with_database(DB).with_chunk_size(8);
    let mut server = Server::with(fake).await;
    let (tx, _rx) = tokio::sync::mpsc::channel(1);
    server.manager.set_transcript_sink(TranscriptSink::channel(tx));

    let token = server.manager.cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(25)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), server.manager.sweep(DB))
        .await
        .expect("cancellation should unblock the sink");
    assert!(matches!(result, Err(Error::ConnectionLost)));
    assert!(server.manager.is_closed());
    assert!(server.fake.is_closed());
}

#[tokio::test]
async fn connection_loss_mid_drain_is_not_retried() {
    let fake = FakeService::new().with_database(DB).with_chunk_size(16).drop_after_info_calls(2);
    let mut server = Server::with(fake).await;

    let err = server.manager.sweep(DB).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionLost));
    assert_eq!(server.fake.info_calls(), 2);
}

#[tokio::test]
async fn already_cancelled_token_sends_nothing() {
    let mut server = Server::start().await;
    server.manager.cancellation_token().cancel();
    let before = server.fake.requests().len();

    let result = server.manager.set_dialect(DB, 3).await;
    assert!(matches!(result, Err(Error::ConnectionLost)));
    assert_eq!(server.fake.requests().len(), before);
}
