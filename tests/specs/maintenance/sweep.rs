//! Sweep specs
//!
//! A sweep streams its transcript; sink delivery and buffered return agree.

use std::sync::{Arc, Mutex};

use crate::prelude::*;

#[tokio::test]
async fn sweep_reports_start_summary_and_finish_in_order() {
    let mut server = Server::start().await;
    let transcript = server.manager.sweep(DB).await.unwrap();

    let started = position(&transcript, "Sweep is started by SYSDBA");
    let finished = position(&transcript, "Sweep is finished");
    let summary = transcript
        .lines()
        .iter()
        .rposition(|l| ["OIT", "OAT", "OST", "Next"].iter().all(|w| l.contains(w)))
        .expect("summary line");
    assert!(started < finished && finished < summary, "{}", transcript.text());
    assert!(transcript.contains(&format!("\tDatabase {DB}")));
}

#[tokio::test]
async fn callback_sink_sees_the_buffered_transcript() {
    let mut buffered = Server::start().await;
    let expected = buffered.manager.sweep(DB).await.unwrap();

    let mut streamed = Server::with(FakeService::new().with_database(DB).with_chunk_size(9)).await;
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = seen.clone();
    streamed.manager.set_transcript_sink(TranscriptSink::callback(move |line| {
        captured.lock().unwrap().push(line.to_string())
    }));
    let returned = streamed.manager.sweep(DB).await.unwrap();

    assert!(returned.is_empty());
    similar_asserts::assert_eq!(Transcript::from(seen.lock().unwrap().clone()), expected);
}

#[tokio::test]
async fn channel_sink_matches_buffered_output_line_for_line() {
    let fake = FakeService::new().with_database(DB).with_chunk_size(4);
    let mut streamed = Server::with(fake).await;
    let (tx, mut rx) = tokio::sync::mpsc::channel(64);
    streamed.manager.set_transcript_sink(TranscriptSink::channel(tx));
    streamed.manager.sweep(DB).await.unwrap();
    streamed.manager.clear_transcript_sink();

    let mut lines = Vec::new();
    while let Ok(line) = rx.try_recv() {
        lines.push(line);
    }

    // same starting state, no sink
    let mut buffered = Server::start().await;
    let expected = buffered.manager.sweep(DB).await.unwrap();
    similar_asserts::assert_eq!(lines.join("\n"), expected.lines().join("\n"));
}

#[tokio::test]
async fn sweep_of_a_missing_database_is_a_service_error() {
    let mut server = Server::start().await;
    let err = server.manager.sweep("/db/missing.fdb").await.unwrap_err();
    assert!(err.status().is_some());
    similar_asserts::assert_eq!(
        err.to_string(),
        "I/O error during \"open\" operation for file \"/db/missing.fdb\"\n\
         Error while trying to open file\n"
    );
}
