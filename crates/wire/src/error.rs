// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Codec error types.

use thiserror::Error;

use crate::spb::{ParamType, SpbTag};

/// A parameter violates its declared tag contract. Raised while building,
/// before anything reaches the server.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EncodingError {
    #[error("{tag} is not accepted by {context}")]
    TagNotAccepted { tag: SpbTag, context: String },

    #[error("{tag} expects a {expected} value")]
    TypeMismatch { tag: SpbTag, expected: ParamType },

    #[error("value {value} does not fit the {width} width of {tag}")]
    OutOfRange { tag: SpbTag, value: i128, width: ParamType },

    #[error("{tag} value is {len} bytes, limit is {max}")]
    StringTooLong { tag: SpbTag, len: usize, max: usize },
}

/// A buffer or packet does not match the layout its tags declare.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("truncated buffer: {needed} bytes needed at offset {offset}, {available} available")]
    Truncated { offset: usize, needed: usize, available: usize },

    #[error("unknown {scope} tag {tag} at offset {offset}")]
    UnknownTag { scope: &'static str, tag: u8, offset: usize },

    #[error("unknown service action code {0}")]
    UnknownAction(u8),

    #[error("unexpected op code {0}")]
    UnexpectedOp(i32),

    #[error("unexpected {got} while waiting for {expected}")]
    UnexpectedReply { expected: &'static str, got: &'static str },

    #[error("unknown status argument type {0}")]
    UnknownStatusArg(i32),

    #[error("negative length {0}")]
    NegativeLength(i32),

    #[error("empty parameter buffer")]
    EmptyBuffer,

    #[error("malformed {what}: {detail}")]
    Malformed { what: &'static str, detail: String },

    #[error("information buffer of {size} bytes is still too small")]
    InfoBufferTooSmall { size: u32 },

    #[error("message too large: {size} bytes (max {max})")]
    MessageTooLarge { size: usize, max: usize },

    #[error("connection closed")]
    ConnectionClosed,

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
