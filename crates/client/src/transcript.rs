// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic transcripts of streaming actions.

use std::fmt;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Output lines of a streaming action, in server order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    lines: Vec<String>,
}

impl Transcript {
    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Every line followed by a newline.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }

    /// Whether `needle` occurs in [`Transcript::text`]; may span lines.
    pub fn contains(&self, needle: &str) -> bool {
        self.text().contains(needle)
    }

    pub(crate) fn push(&mut self, line: String) {
        self.lines.push(line);
    }
}

impl From<Vec<String>> for Transcript {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

/// Receives transcript lines as they arrive.
pub enum TranscriptSink {
    Channel(mpsc::Sender<String>),
    Callback(Box<dyn FnMut(&str) + Send>),
}

impl TranscriptSink {
    pub fn channel(tx: mpsc::Sender<String>) -> Self {
        Self::Channel(tx)
    }

    pub fn callback(f: impl FnMut(&str) + Send + 'static) -> Self {
        Self::Callback(Box::new(f))
    }

    /// Hand `line` to the consumer. Returns `false` if `cancel` fired while
    /// a full channel was waiting for room.
    pub(crate) async fn deliver(&mut self, line: &str, cancel: &CancellationToken) -> bool {
        match self {
            Self::Channel(tx) => {
                let sent = tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return false,
                    sent = tx.send(line.to_string()) => sent,
                };
                if sent.is_err() {
                    tracing::debug!("transcript receiver dropped, line discarded");
                }
            }
            Self::Callback(f) => f(line),
        }
        true
    }
}

impl fmt::Debug for TranscriptSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Channel(_) => f.write_str("TranscriptSink::Channel"),
            Self::Callback(_) => f.write_str("TranscriptSink::Callback"),
        }
    }
}

/// Reassembles lines split across output chunks.
#[derive(Debug, Default)]
pub(crate) struct LineAssembler {
    partial: String,
}

impl LineAssembler {
    /// Append a chunk and return the lines it completed.
    pub(crate) fn push(&mut self, chunk: &str) -> Vec<String> {
        self.partial.push_str(chunk);
        let mut lines = Vec::new();
        while let Some(end) = self.partial.find('\n') {
            let mut line: String = self.partial.drain(..=end).collect();
            line.pop();
            if line.ends_with('\r') {
                line.pop();
            }
            lines.push(line);
        }
        lines
    }

    /// The unterminated tail, if any.
    pub(crate) fn finish(&mut self) -> Option<String> {
        if self.partial.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.partial))
        }
    }
}
