// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;
use std::time::Duration;

use fbsvc_wire::messages::codes;
use fbsvc_wire::spb::options;
use fbsvc_wire::{Request, SpbTag};
use parking_lot::Mutex;

use super::*;
use crate::fake::FakeService;
use crate::ServiceManagerOptions;

const DB: &str = "/db/employee.fdb";

fn sweep_lines() -> Vec<String> {
    vec![
        "Sweep is started by SYSDBA".to_string(),
        format!("\tDatabase {DB}"),
        "\tOIT 10, OAT 11, OST 11, Next 12".to_string(),
        "Sweep is finished".to_string(),
        format!("\tDatabase {DB}"),
        "\tOIT 12, OAT 13, OST 13, Next 13".to_string(),
    ]
}

async fn executor(fake: &FakeService, buffer_size: u32) -> ActionExecutor {
    let attachment = ServiceAttachment::attach(
        Box::new(fake.clone()),
        FakeService::USER,
        FakeService::PASSWORD,
        &ServiceManagerOptions::default(),
    )
    .await
    .unwrap();
    ActionExecutor::new(attachment, buffer_size)
}

fn sweep() -> ParameterBuffer {
    let mut spb = ParameterBuffer::action(Action::Sweep);
    spb.put(SpbTag::DbName, DB).unwrap().put(SpbTag::Options, options::SWEEP_DB).unwrap();
    spb
}

fn set_dialect(dialect: u32) -> ParameterBuffer {
    let mut spb = ParameterBuffer::action(Action::SetDialect);
    spb.put(SpbTag::DbName, DB).unwrap().put(SpbTag::SqlDialect, dialect).unwrap();
    spb
}

fn capture(exec: &mut ActionExecutor) -> Arc<Mutex<Vec<String>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let captured = seen.clone();
    exec.set_sink(Some(TranscriptSink::callback(move |line| {
        captured.lock().push(line.to_string())
    })));
    seen
}

fn info_items(requests: &[Request]) -> Vec<Vec<u8>> {
    requests
        .iter()
        .filter_map(|r| match r {
            Request::ServiceInfo { receive_items, .. } => Some(receive_items.clone()),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn immediate_action_is_one_status_round_trip() {
    let fake = FakeService::new().with_database(DB);
    let mut exec = executor(&fake, 8192).await;

    let result = exec.run(set_dialect(1)).await.unwrap();
    assert_eq!(result, MaintenanceResult::Unit);
    assert_eq!(info_items(&fake.requests()), vec![vec![InfoTag::Line.code()]]);
    assert_eq!(fake.database(DB).unwrap().dialect, 1);
}

#[yare::parameterized(
    one_byte   = { 1 },
    odd        = { 7 },
    default    = { 64 },
    whole      = { 4096 },
)]
fn transcript_does_not_depend_on_chunking(chunk: usize) {
    let runtime = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
    runtime.block_on(async {
        let fake = FakeService::new().with_database(DB).with_chunk_size(chunk);
        let mut exec = executor(&fake, 8192).await;

        let transcript = exec.run(sweep()).await.unwrap().into_transcript();
        assert_eq!(transcript.lines(), sweep_lines().as_slice());

        // drain polls end with exactly one status check
        let items = info_items(&fake.requests());
        assert_eq!(items.last(), Some(&vec![InfoTag::Line.code()]));
        assert!(items[..items.len() - 1].iter().all(|i| i == &vec![InfoTag::ToEof.code()]));
    });
}

#[tokio::test]
async fn not_ready_answers_keep_the_loop_polling() {
    let fake = FakeService::new().with_database(DB).with_not_ready_polls(2);
    let mut exec = executor(&fake, 8192).await;

    let transcript = exec.run(sweep()).await.unwrap().into_transcript();
    assert_eq!(transcript.lines(), sweep_lines().as_slice());
}

#[tokio::test]
async fn sink_receives_lines_and_transcript_stays_empty() {
    let fake = FakeService::new().with_database(DB).with_chunk_size(5);
    let mut exec = executor(&fake, 8192).await;
    let seen = capture(&mut exec);

    let transcript = exec.run(sweep()).await.unwrap().into_transcript();
    assert!(transcript.is_empty());
    assert_eq!(*seen.lock(), sweep_lines());
}

#[tokio::test]
async fn status_line_fails_an_immediate_action() {
    let fake = FakeService::new().with_database(DB);
    let mut exec = executor(&fake, 8192).await;
    fake.fail_next_status_with_line("database is in use");

    let err = exec.run(set_dialect(3)).await.unwrap_err();
    assert_eq!(err.status().map(|s| s.fragments().len()), Some(1));
    assert_eq!(err.to_string(), "database is in use\n");
}

#[tokio::test]
async fn error_sentinel_fails_a_streaming_action_after_the_drain() {
    let fake = FakeService::new().with_database(DB);
    let mut exec = executor(&fake, 8192).await;
    fake.fail_next_status_with_code(codes::UNAVAILABLE);

    let err = exec.run(sweep()).await.unwrap_err();
    assert_eq!(err.to_string(), "unavailable database\n");
}

#[tokio::test]
async fn server_rejection_surfaces_the_full_chain() {
    let fake = FakeService::new().with_database(DB);
    let mut exec = executor(&fake, 8192).await;

    let err = exec.run(set_dialect(10)).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "bad parameters on attach or create database\n\
         Database dialect 10 is not a valid dialect.\n"
    );
    assert_eq!(fake.database(DB).unwrap().dialect, 3);
}

#[tokio::test]
async fn connection_loss_mid_drain_keeps_delivered_lines() {
    let fake =
        FakeService::new().with_database(DB).with_chunk_size(30).drop_after_info_calls(3);
    let mut exec = executor(&fake, 8192).await;
    let seen = capture(&mut exec);

    let err = exec.run(sweep()).await.unwrap_err();
    assert!(matches!(err, Error::ConnectionLost));
    let delivered = seen.lock().clone();
    assert!(!delivered.is_empty());
    assert_eq!(delivered.as_slice(), &sweep_lines()[..delivered.len()]);
}

#[tokio::test]
async fn cancel_while_the_channel_sink_is_full_aborts() {
    let fake = FakeService::new().with_database(DB).with_chunk_size(8);
    let mut exec = executor(&fake, 8192).await;
    let (tx, mut rx) = tokio::sync::mpsc::channel(1);
    exec.set_sink(Some(TranscriptSink::channel(tx)));

    let token = exec.attachment().cancellation_token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();
    });

    let result = tokio::time::timeout(Duration::from_secs(5), exec.run(sweep()))
        .await
        .expect("cancellation did not unblock the sink");
    assert!(matches!(result, Err(Error::ConnectionLost)));
    assert!(exec.attachment().is_closed());
    assert!(fake.is_closed());
    assert_eq!(rx.recv().await.as_deref(), Some(sweep_lines()[0].as_str()));
}

#[tokio::test]
async fn attach_buffer_is_not_runnable() {
    let fake = FakeService::new();
    let mut exec = executor(&fake, 8192).await;
    let result = exec.run(ParameterBuffer::attach()).await;
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
}

#[tokio::test]
async fn text_query_doubles_the_buffer_until_it_fits() {
    let fake = FakeService::new().with_min_info_buffer(5000);
    let mut exec = executor(&fake, 1024).await;

    assert_eq!(exec.query_text(InfoTag::GetEnv).await.unwrap(), "/opt/firebird");
    let sizes: Vec<u32> = fake
        .requests()
        .iter()
        .filter_map(|r| match r {
            Request::ServiceInfo { buffer_length, .. } => Some(*buffer_length),
            _ => None,
        })
        .collect();
    assert_eq!(sizes, vec![1024, 2048, 4096, 8192]);
}

#[tokio::test]
async fn text_query_gives_up_at_the_cap() {
    let fake = FakeService::new().with_min_info_buffer(u32::MAX);
    let mut exec = executor(&fake, 256 * 1024).await;

    let err = exec.query_text(InfoTag::ServerVersion).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Protocol(ProtocolError::InfoBufferTooSmall { size: MAX_INFO_BUFFER })
    ));
    assert_eq!(fake.info_calls(), 3);
}
