//! Validation specs

use crate::prelude::*;

#[tokio::test]
async fn check_only_validation_reports_start_and_finish() {
    let mut server = Server::start().await;
    let transcript = server.manager.validate(DB, ValidationMode::CheckOnly).await.unwrap();

    let started = position(&transcript, "Validation started");
    let finished = position(&transcript, "Validation finished: 0 errors, 0 warnings, 0 fixed");
    assert!(started < finished);
    similar_asserts::assert_eq!(transcript.lines()[0], format!("Database {DB}"));
}

#[tokio::test]
async fn full_validation_and_mend_stream_the_same_shape() {
    let mut server = Server::start().await;
    let full = server.manager.validate(DB, ValidationMode::Full).await.unwrap();
    let mended = server.manager.mend(DB).await.unwrap();
    similar_asserts::assert_eq!(full, mended);
}

#[tokio::test]
async fn validation_refuses_a_shut_down_database() {
    let mut server = Server::start().await;
    server.manager.shutdown(DB, ShutdownMode::Force, 0).await.unwrap();

    let err = server.manager.validate(DB, ValidationMode::Full).await.unwrap_err();
    similar_asserts::assert_eq!(err.to_string(), format!("database {DB} shutdown\n"));

    server.manager.online(DB).await.unwrap();
    server.manager.validate(DB, ValidationMode::Full).await.unwrap();
}
