// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Drives one submitted action to completion.
//!
//! ```text
//! Idle -> Submitted -> Checked -> Done                (immediate)
//! Idle -> Submitted -> Draining -> Checked -> Done    (streaming)
//! ```
//!
//! Draining polls until the server returns an empty chunk. The closing status
//! check runs on both paths, since a streaming job can report success in its
//! output and still fail overall.

use std::time::Duration;

use fbsvc_wire::{
    parse_info, Action, Completion, DrainItem, InfoItem, InfoTag, ParameterBuffer, ProtocolError,
};

use crate::decoder;
use crate::transcript::LineAssembler;
use crate::{Error, LimboTransaction, ServiceAttachment, Transcript, TranscriptSink};

/// Pause after a `data_not_ready` answer before polling again.
const NOT_READY_BACKOFF: Duration = Duration::from_millis(50);

/// Largest information buffer a text query will grow to (1 MiB).
pub(crate) const MAX_INFO_BUFFER: u32 = 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExecState {
    Idle,
    Submitted,
    Draining,
    Checked,
    Done,
}

/// What a completed action produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MaintenanceResult {
    Unit,
    Transcript(Transcript),
    Limbo(Vec<LimboTransaction>),
}

impl MaintenanceResult {
    pub fn into_transcript(self) -> Transcript {
        match self {
            Self::Transcript(t) => t,
            _ => Transcript::default(),
        }
    }

    pub fn into_limbo(self) -> Vec<LimboTransaction> {
        match self {
            Self::Limbo(txs) => txs,
            _ => Vec::new(),
        }
    }
}

pub(crate) struct ActionExecutor {
    attachment: ServiceAttachment,
    sink: Option<TranscriptSink>,
    buffer_size: u32,
}

impl ActionExecutor {
    pub(crate) fn new(attachment: ServiceAttachment, buffer_size: u32) -> Self {
        Self { attachment, sink: None, buffer_size }
    }

    pub(crate) fn set_sink(&mut self, sink: Option<TranscriptSink>) {
        self.sink = sink;
    }

    pub(crate) fn attachment(&self) -> &ServiceAttachment {
        &self.attachment
    }

    pub(crate) fn attachment_mut(&mut self) -> &mut ServiceAttachment {
        &mut self.attachment
    }

    pub(crate) async fn run(&mut self, spb: ParameterBuffer) -> Result<MaintenanceResult, Error> {
        let action = spb
            .intent()
            .ok_or_else(|| Error::InvalidArgument("an attach buffer is not an action".into()))?;
        let mut state = ExecState::Idle;

        self.attachment.submit_action(spb).await?;
        advance(action, &mut state, ExecState::Submitted);

        let result = match action.completion() {
            Completion::Immediate => MaintenanceResult::Unit,
            Completion::Streaming(item) => {
                advance(action, &mut state, ExecState::Draining);
                match item {
                    DrainItem::Output => {
                        MaintenanceResult::Transcript(self.drain_output(action).await?)
                    }
                    DrainItem::LimboTransactions => {
                        MaintenanceResult::Limbo(self.drain_limbo(action).await?)
                    }
                }
            }
        };

        self.check_status().await?;
        advance(action, &mut state, ExecState::Checked);
        advance(action, &mut state, ExecState::Done);
        Ok(result)
    }

    async fn poll(&mut self, tag: InfoTag) -> Result<Vec<InfoItem>, Error> {
        let buf = self.attachment.query_info(&[tag], self.buffer_size).await?;
        Ok(parse_info(&buf)?)
    }

    async fn drain_output(&mut self, action: Action) -> Result<Transcript, Error> {
        let mut transcript = Transcript::default();
        let mut assembler = LineAssembler::default();
        let mut polls = 0usize;

        loop {
            let items = self.poll(InfoTag::ToEof).await?;
            polls += 1;

            let mut pending = false;
            let mut not_ready = false;
            for item in &items {
                match item.tag {
                    InfoTag::ToEof => {
                        let chunk = item.as_text().unwrap_or_default();
                        if !chunk.is_empty() {
                            pending = true;
                            for line in assembler.push(chunk) {
                                self.emit(&mut transcript, line).await?;
                            }
                        }
                    }
                    InfoTag::Truncated => pending = true,
                    InfoTag::DataNotReady => not_ready = true,
                    InfoTag::Error => return Err(decoder::sentinel(item)),
                    _ => {}
                }
            }

            if not_ready {
                tokio::time::sleep(NOT_READY_BACKOFF).await;
            } else if !pending {
                break;
            }
        }

        if let Some(tail) = assembler.finish() {
            self.emit(&mut transcript, tail).await?;
        }
        tracing::debug!(%action, polls, lines = transcript.len(), "output drained");
        Ok(transcript)
    }

    async fn drain_limbo(&mut self, action: Action) -> Result<Vec<LimboTransaction>, Error> {
        let mut records = Vec::new();
        let mut polls = 0usize;

        loop {
            let items = self.poll(InfoTag::LimboTrans).await?;
            polls += 1;

            let mut pending = false;
            let mut not_ready = false;
            for item in items {
                match item.tag {
                    InfoTag::LimboTrans => {
                        pending = true;
                        records.push(item);
                    }
                    InfoTag::Truncated => pending = true,
                    InfoTag::DataNotReady => not_ready = true,
                    InfoTag::Error => return Err(decoder::sentinel(&item)),
                    _ => {}
                }
            }

            if not_ready {
                tokio::time::sleep(NOT_READY_BACKOFF).await;
            } else if !pending {
                break;
            }
        }

        let transactions = decoder::decode_limbo(&records)?;
        tracing::debug!(%action, polls, count = transactions.len(), "limbo listing drained");
        Ok(transactions)
    }

    /// Route one line to the sink, or to `transcript` when there is none.
    /// A cancel while a full channel blocks aborts the attachment.
    async fn emit(&mut self, transcript: &mut Transcript, line: String) -> Result<(), Error> {
        let Some(sink) = self.sink.as_mut() else {
            transcript.push(line);
            return Ok(());
        };
        let cancel = self.attachment.cancellation_token();
        if sink.deliver(&line, &cancel).await {
            Ok(())
        } else {
            Err(self.attachment.abort().await)
        }
    }

    async fn check_status(&mut self) -> Result<(), Error> {
        let items = self.poll(InfoTag::Line).await?;
        decoder::check_status(&items)
    }

    /// One-shot text query, doubling the buffer while the server answers
    /// `truncated`.
    pub(crate) async fn query_text(&mut self, tag: InfoTag) -> Result<String, Error> {
        let mut size = self.buffer_size;
        loop {
            let buf = self.attachment.query_info(&[tag], size).await?;
            let items = parse_info(&buf)?;

            if decoder::has(&items, InfoTag::Truncated) {
                if size >= MAX_INFO_BUFFER {
                    return Err(ProtocolError::InfoBufferTooSmall { size }.into());
                }
                size = size.saturating_mul(2).min(MAX_INFO_BUFFER);
                tracing::debug!(?tag, size, "information buffer too small, retrying");
                continue;
            }
            if let Some(item) = items.iter().find(|i| i.tag == InfoTag::Error) {
                return Err(decoder::sentinel(item));
            }
            return decoder::find_text(&items, tag).map(str::to_string).ok_or_else(|| {
                ProtocolError::Malformed {
                    what: "information response",
                    detail: format!("no {tag:?} item"),
                }
                .into()
            });
        }
    }
}

fn advance(action: Action, state: &mut ExecState, next: ExecState) {
    tracing::debug!(%action, from = ?*state, to = ?next, "executor transition");
    *state = next;
}

#[cfg(test)]
#[path = "executor_tests.rs"]
mod tests;
