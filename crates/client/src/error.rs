// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fbsvc_wire::{EncodingError, ProtocolError, StatusChain};
use thiserror::Error;

/// Errors returned by every maintenance operation.
#[derive(Debug, Error)]
pub enum Error {
    /// A parameter violated its tag contract; nothing was sent
    #[error("encoding error: {0}")]
    Encoding(#[from] EncodingError),

    #[error("connection failed: {0}")]
    Connection(String),

    /// The transport closed or was cancelled while a call was in flight
    #[error("connection lost")]
    ConnectionLost,

    #[error("protocol error: {0}")]
    Protocol(ProtocolError),

    /// The server reported a failure; displays as the rendered chain
    #[error("{0}")]
    Service(StatusChain),

    #[error("service attachment is closed")]
    UseAfterClose,

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl Error {
    /// The status chain of a server-reported failure.
    pub fn status(&self) -> Option<&StatusChain> {
        match self {
            Self::Service(chain) => Some(chain),
            _ => None,
        }
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        match e {
            ProtocolError::ConnectionClosed | ProtocolError::Io(_) => Self::ConnectionLost,
            other => Self::Protocol(other),
        }
    }
}
