//! Attachment handshake specs

use std::time::Duration;

use fbsvc_wire::{ParameterBuffer, Request, SpbTag};

use crate::prelude::*;

#[tokio::test]
async fn options_shape_the_handshake_only() {
    let fake = FakeService::new().with_database(DB);
    let options = ServiceManagerOptions::from_toml_str(
        r#"
        connect_timeout_ms = 2500
        dialect = 1
        wire_crypt = "required"
        security_db = "security5.fdb"
        "#,
    )
    .unwrap();
    let mut manager = MaintenanceManager::with_transport(
        Box::new(fake.clone()),
        FakeService::USER,
        FakeService::PASSWORD,
        &options,
    )
    .await
    .unwrap();
    assert_eq!(options.connect_timeout(), Some(Duration::from_millis(2500)));

    let requests = fake.requests();
    assert_eq!(requests[0], Request::Connect { version: 0x800D, dialect: 1, wire_crypt: 2 });
    let Request::ServiceAttach { spb, .. } = &requests[1] else {
        panic!("expected service_attach, got {:?}", requests[1]);
    };
    let attach = ParameterBuffer::decode(spb).unwrap();
    assert_eq!(attach.int(SpbTag::ConnectTimeout), Some(2));
    assert_eq!(attach.text(SpbTag::ExpectedDb), Some("security5.fdb"));

    // action buffers carry no handshake settings
    manager.set_sweep_interval(DB, 100).await.unwrap();
    let started = fake.started();
    assert_eq!(started[0].items.len(), 2);
}

#[tokio::test]
async fn wrong_password_is_a_connection_error() {
    let fake = FakeService::new().with_credentials("SYSDBA", "s3cret");
    let result = MaintenanceManager::with_transport(
        Box::new(fake.clone()),
        "SYSDBA",
        "masterkey",
        &ServiceManagerOptions::default(),
    )
    .await;
    let Err(Error::Connection(message)) = result else {
        panic!("expected a connection error");
    };
    assert!(message.contains("user name and password"), "{message}");
    assert!(!fake.is_attached());
}

#[tokio::test]
async fn close_detaches_and_second_close_fails() {
    let mut server = Server::start().await;
    server.manager.close().await.unwrap();
    assert!(server.manager.is_closed());
    assert!(!server.fake.is_attached());

    assert!(matches!(server.manager.close().await, Err(Error::UseAfterClose)));
    assert!(matches!(server.manager.set_dialect(DB, 3).await, Err(Error::UseAfterClose)));
}

#[tokio::test]
async fn keep_alive_packets_do_not_disturb_operations() {
    let fake = FakeService::new().with_database(DB).with_dummy_replies();
    let mut server = Server::with(fake).await;
    let transcript = server.manager.sweep(DB).await.unwrap();
    assert!(transcript.contains("Sweep is finished"));
}

#[tokio::test]
async fn environment_queries() {
    let fake = FakeService::new().with_home_dir("/opt/fb5").with_min_info_buffer(20_000);
    let mut server = Server::with(fake).await;
    assert_eq!(server.manager.home_dir().await.unwrap(), "/opt/fb5");
    assert!(server.manager.server_version().await.unwrap().starts_with("LI-V5"));
}
