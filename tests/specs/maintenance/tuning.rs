//! Property setter specs
//!
//! Setters are immediate actions: one start, one status check. Domain
//! checks happen on the server and come back as service errors.

use fbsvc_wire::{Action, EncodingError, ParameterBuffer, SpbTag};

use crate::prelude::*;

#[tokio::test]
async fn read_only_twice_is_idempotent() {
    let mut server = Server::start().await;
    server.manager.set_access_mode_read_only(DB).await.unwrap();
    server.manager.set_access_mode_read_only(DB).await.unwrap();
    assert!(server.db().read_only);

    server.manager.set_access_mode(DB, AccessMode::ReadWrite).await.unwrap();
    assert!(!server.db().read_only);
}

#[yare::parameterized(
    one   = { 1 },
    three = { 3 },
)]
fn supported_dialects_are_accepted(dialect: u32) {
    block_on(async {
        let mut server = Server::start().await;
        server.manager.set_dialect(DB, dialect).await.unwrap();
        assert_eq!(server.db().dialect, dialect);
    });
}

#[tokio::test]
async fn dialect_ten_is_a_service_error() {
    let mut server = Server::start().await;
    let err = server.manager.set_dialect(DB, 10).await.unwrap_err();

    assert!(matches!(err, Error::Service(_)));
    similar_asserts::assert_eq!(
        err.to_string(),
        "bad parameters on attach or create database\n\
         Database dialect 10 is not a valid dialect.\n"
    );
    assert_eq!(server.db().dialect, 3);
    assert!(!server.manager.is_closed());
}

#[yare::parameterized(
    reset   = { 0 },
    hundred = { 100 },
)]
fn page_buffer_counts_are_accepted(buffers: u32) {
    block_on(async {
        let mut server = Server::start().await;
        server.manager.set_page_buffers(DB, buffers).await.unwrap();
        assert_eq!(server.db().page_buffers, buffers);
    });
}

#[tokio::test]
async fn thirty_page_buffers_is_a_service_error() {
    let mut server = Server::start().await;
    let err = server.manager.set_page_buffers(DB, 30).await.unwrap_err();

    let status = err.status().expect("service error");
    assert_eq!(status.fragments().len(), 2);
    assert!(err.to_string().starts_with("bad parameters on attach or create database\n"));
    assert_eq!(server.db().page_buffers, 0);
}

#[tokio::test]
async fn write_mode_page_fill_and_sweep_interval() {
    let mut server = Server::start().await;
    server.manager.set_write_mode_async(DB).await.unwrap();
    server.manager.set_page_fill_no_reserve(DB).await.unwrap();
    server.manager.set_sweep_interval(DB, 20_000).await.unwrap();
    assert!(!server.db().sync_writes);
    assert!(!server.db().reserve_space);
    assert_eq!(server.db().sweep_interval, 20_000);

    server.manager.set_write_mode_sync(DB).await.unwrap();
    server.manager.set_page_fill_reserve(DB).await.unwrap();
    assert!(server.db().sync_writes);
    assert!(server.db().reserve_space);
}

#[tokio::test]
async fn disabling_linger_releases_on_last_detach() {
    let mut server = Server::start().await;
    assert!(server.db().linger);
    server.manager.disable_linger(DB).await.unwrap();
    assert!(!server.db().linger);
}

#[yare::parameterized(
    byte_overflow  = { Action::SetPageFill, SpbTag::ReserveSpace, 256 },
    dword_overflow = { Action::SetSweepInterval, SpbTag::SweepInterval, 1 << 32 },
    negative       = { Action::SetDialect, SpbTag::SqlDialect, -1 },
)]
fn values_wider_than_their_tag_fail_before_sending(action: Action, tag: SpbTag, value: i64) {
    let mut spb = ParameterBuffer::action(action);
    let err = spb.put(tag, value).unwrap_err();
    assert!(matches!(err, EncodingError::OutOfRange { .. }), "{err}");
}
