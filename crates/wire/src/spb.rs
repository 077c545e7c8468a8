// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter buffers: the tagged request payloads of attach and action calls.
//!
//! Layout:
//! - attach buffer: `[2, 2]` version header, then `tag, u8 len, bytes` for
//!   strings and `tag, u32 LE` for integers
//! - action buffer: action code byte, then `tag, u16 LE len, bytes` for
//!   strings and `tag, value` for integers (1, 4 or 8 bytes, little-endian)
//!
//! [`SpbTag`] is the single table both [`ParameterBuffer::put`] and
//! [`ParameterBuffer::decode`] consult.

use std::fmt;

use crate::action::{Action, ServiceAction};
use crate::{EncodingError, ProtocolError};

/// Version marker for attach buffers
const SPB_VERSION: u8 = 2;
const SPB_CURRENT_VERSION: u8 = 2;

/// Bits for the `options` tag.
pub mod options {
    // repair
    pub const VALIDATE_DB: u32 = 0x01;
    pub const SWEEP_DB: u32 = 0x02;
    pub const MEND_DB: u32 = 0x04;
    pub const LIST_LIMBO_TRANS: u32 = 0x08;
    pub const CHECK_DB: u32 = 0x10;
    pub const IGNORE_CHECKSUM: u32 = 0x20;
    pub const KILL_SHADOWS: u32 = 0x40;
    pub const FULL: u32 = 0x80;

    // properties
    pub const DB_ONLINE: u32 = 0x0200;
    pub const NO_LINGER: u32 = 0x0400;
}

/// Byte values for the enumerated property tags.
pub mod values {
    pub const RESERVE_SPACE_USE_FULL: u8 = 35;
    pub const RESERVE_SPACE: u8 = 36;
    pub const WRITE_MODE_ASYNC: u8 = 37;
    pub const WRITE_MODE_SYNC: u8 = 38;
    pub const ACCESS_MODE_READ_ONLY: u8 = 39;
    pub const ACCESS_MODE_READ_WRITE: u8 = 40;

    pub const OPERATION_MODE_NORMAL: u8 = 0;
    pub const OPERATION_MODE_MULTI: u8 = 1;
    pub const OPERATION_MODE_SINGLE: u8 = 2;
    pub const OPERATION_MODE_FULL: u8 = 3;
}

/// Width or framing class of a parameter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Byte,
    Dword,
    Qword,
    String,
}

impl fmt::Display for ParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Byte => "byte",
            Self::Dword => "dword",
            Self::Qword => "qword",
            Self::String => "string",
        })
    }
}

/// Every parameter tag the builder knows. Codes are only unique within one
/// buffer kind, so tags are identified by variant rather than by code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SpbTag {
    // attach
    UserName,
    Password,
    ConnectTimeout,
    ExpectedDb,

    // shared by action buffers
    DbName,
    Options,

    // repair
    CommitTrans,
    RollbackTrans,
    CommitTrans64,
    RollbackTrans64,

    // properties
    PageBuffers,
    SweepInterval,
    ShutdownDb,
    DenyNewAttachments,
    DenyNewTransactions,
    ReserveSpace,
    WriteMode,
    AccessMode,
    SqlDialect,
    ForceShutdown,
    AttachmentsShutdown,
    TransactionsShutdown,
    ShutdownMode,
    OnlineMode,
}

const ATTACH_TAGS: &[SpbTag] =
    &[SpbTag::UserName, SpbTag::Password, SpbTag::ConnectTimeout, SpbTag::ExpectedDb];

impl SpbTag {
    const fn descriptor(self) -> (u8, ParamType, &'static str) {
        use ParamType::*;
        match self {
            Self::UserName => (28, String, "user_name"),
            Self::Password => (29, String, "password"),
            Self::ConnectTimeout => (57, Dword, "connect_timeout"),
            Self::ExpectedDb => (124, String, "expected_db"),
            Self::DbName => (106, String, "dbname"),
            Self::Options => (108, Dword, "options"),
            Self::CommitTrans => (15, Dword, "commit_trans"),
            Self::RollbackTrans => (34, Dword, "rollback_trans"),
            Self::CommitTrans64 => (49, Qword, "commit_trans_64"),
            Self::RollbackTrans64 => (50, Qword, "rollback_trans_64"),
            Self::PageBuffers => (5, Dword, "page_buffers"),
            Self::SweepInterval => (6, Dword, "sweep_interval"),
            Self::ShutdownDb => (7, Dword, "shutdown_db"),
            Self::DenyNewAttachments => (9, Dword, "deny_new_attachments"),
            Self::DenyNewTransactions => (10, Dword, "deny_new_transactions"),
            Self::ReserveSpace => (11, Byte, "reserve_space"),
            Self::WriteMode => (12, Byte, "write_mode"),
            Self::AccessMode => (13, Byte, "access_mode"),
            Self::SqlDialect => (14, Dword, "set_sql_dialect"),
            Self::ForceShutdown => (41, Dword, "force_shutdown"),
            Self::AttachmentsShutdown => (42, Dword, "attachments_shutdown"),
            Self::TransactionsShutdown => (43, Dword, "transactions_shutdown"),
            Self::ShutdownMode => (44, Byte, "shutdown_mode"),
            Self::OnlineMode => (45, Byte, "online_mode"),
        }
    }

    pub const fn code(self) -> u8 {
        self.descriptor().0
    }

    pub const fn param_type(self) -> ParamType {
        self.descriptor().1
    }

    pub const fn name(self) -> &'static str {
        self.descriptor().2
    }
}

impl fmt::Display for SpbTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which header a buffer starts with, and so which tags it may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferKind {
    Attach,
    Action(ServiceAction),
}

impl BufferKind {
    fn tags(self) -> &'static [SpbTag] {
        match self {
            Self::Attach => ATTACH_TAGS,
            Self::Action(service) => service.tags(),
        }
    }

    fn find(self, code: u8) -> Option<SpbTag> {
        self.tags().iter().copied().find(|t| t.code() == code)
    }

    fn max_string(self) -> usize {
        match self {
            Self::Attach => u8::MAX as usize,
            Self::Action(_) => u16::MAX as usize,
        }
    }

    fn scope(self) -> &'static str {
        match self {
            Self::Attach => "attach",
            Self::Action(service) => service.name(),
        }
    }
}

/// A parameter value before width checking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamValue {
    Int(i128),
    Str(String),
}

impl ParamValue {
    pub fn as_int(&self) -> Option<i128> {
        match self {
            Self::Int(v) => Some(*v),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

macro_rules! int_param {
    ($($ty:ty),+) => {
        $(impl From<$ty> for ParamValue {
            fn from(v: $ty) -> Self {
                ParamValue::Int(i128::from(v))
            }
        })+
    };
}

int_param!(u8, u16, u32, u64, i32, i64);

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Str(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Str(v)
    }
}

/// Single-use builder for one parameter buffer.
#[derive(Debug)]
pub struct ParameterBuffer {
    kind: BufferKind,
    action: Option<Action>,
    buf: Vec<u8>,
}

impl ParameterBuffer {
    /// Start an attach buffer (version-2 header).
    pub fn attach() -> Self {
        Self { kind: BufferKind::Attach, action: None, buf: vec![SPB_VERSION, SPB_CURRENT_VERSION] }
    }

    /// Start an action buffer; only the intent's whitelisted tags are accepted.
    pub fn action(action: Action) -> Self {
        Self {
            kind: BufferKind::Action(action.service_action()),
            action: Some(action),
            buf: vec![action.code()],
        }
    }

    pub fn kind(&self) -> BufferKind {
        self.kind
    }

    /// The intent an action buffer was started for; `None` for attach buffers.
    pub fn intent(&self) -> Option<Action> {
        self.action
    }

    /// Append one item, checking the tag's whitelist and declared width.
    pub fn put(
        &mut self,
        tag: SpbTag,
        value: impl Into<ParamValue>,
    ) -> Result<&mut Self, EncodingError> {
        let accepted = match self.action {
            Some(action) => action.accepts(tag),
            None => self.kind.tags().contains(&tag),
        };
        if !accepted {
            let context = match self.action {
                Some(action) => action.to_string(),
                None => "attach buffer".to_string(),
            };
            return Err(EncodingError::TagNotAccepted { tag, context });
        }

        let width = tag.param_type();
        let out_of_range = |value: i128| EncodingError::OutOfRange { tag, value, width };
        match (width, value.into()) {
            (ParamType::String, ParamValue::Str(s)) => {
                let max = self.kind.max_string();
                if s.len() > max {
                    return Err(EncodingError::StringTooLong { tag, len: s.len(), max });
                }
                self.buf.push(tag.code());
                match self.kind {
                    BufferKind::Attach => self.buf.push(s.len() as u8),
                    BufferKind::Action(_) => {
                        self.buf.extend_from_slice(&(s.len() as u16).to_le_bytes())
                    }
                }
                self.buf.extend_from_slice(s.as_bytes());
            }
            (ParamType::Byte, ParamValue::Int(v)) => {
                let b = u8::try_from(v).map_err(|_| out_of_range(v))?;
                self.buf.extend_from_slice(&[tag.code(), b]);
            }
            (ParamType::Dword, ParamValue::Int(v)) => {
                let d = u32::try_from(v).map_err(|_| out_of_range(v))?;
                self.buf.push(tag.code());
                self.buf.extend_from_slice(&d.to_le_bytes());
            }
            (ParamType::Qword, ParamValue::Int(v)) => {
                let q = i64::try_from(v).ok().filter(|q| *q >= 0).ok_or_else(|| out_of_range(v))?;
                self.buf.push(tag.code());
                self.buf.extend_from_slice(&q.to_le_bytes());
            }
            (expected, _) => return Err(EncodingError::TypeMismatch { tag, expected }),
        }
        Ok(self)
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }

    /// Decode a buffer produced by [`ParameterBuffer::build`].
    pub fn decode(bytes: &[u8]) -> Result<DecodedBuffer, ProtocolError> {
        let (&first, _) = bytes.split_first().ok_or(ProtocolError::EmptyBuffer)?;
        let (kind, mut pos) = if first == SPB_VERSION {
            match bytes.get(1) {
                Some(&SPB_CURRENT_VERSION) => (BufferKind::Attach, 2),
                _ => return Err(truncated(1, 1, bytes.len())),
            }
        } else {
            let service =
                ServiceAction::from_code(first).ok_or(ProtocolError::UnknownAction(first))?;
            (BufferKind::Action(service), 1)
        };

        let mut items = Vec::new();
        while pos < bytes.len() {
            let code = bytes[pos];
            let tag = kind.find(code).ok_or(ProtocolError::UnknownTag {
                scope: kind.scope(),
                tag: code,
                offset: pos,
            })?;
            pos += 1;

            let value = match tag.param_type() {
                ParamType::String => {
                    let (len, header) = match kind {
                        BufferKind::Attach => (take(bytes, pos, 1)?[0] as usize, 1),
                        BufferKind::Action(_) => {
                            let raw = take(bytes, pos, 2)?;
                            (u16::from_le_bytes([raw[0], raw[1]]) as usize, 2)
                        }
                    };
                    pos += header;
                    let raw = take(bytes, pos, len)?;
                    pos += len;
                    ParamValue::Str(String::from_utf8_lossy(raw).into_owned())
                }
                ParamType::Byte => {
                    let raw = take(bytes, pos, 1)?;
                    pos += 1;
                    ParamValue::Int(i128::from(raw[0]))
                }
                ParamType::Dword => {
                    let raw = take(bytes, pos, 4)?;
                    pos += 4;
                    let value = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
                    ParamValue::Int(i128::from(value))
                }
                ParamType::Qword => {
                    let raw = take(bytes, pos, 8)?;
                    pos += 8;
                    let mut q = [0u8; 8];
                    q.copy_from_slice(raw);
                    ParamValue::Int(i128::from(i64::from_le_bytes(q)))
                }
            };
            items.push((tag, value));
        }

        Ok(DecodedBuffer { kind, items })
    }
}

fn take(bytes: &[u8], pos: usize, n: usize) -> Result<&[u8], ProtocolError> {
    bytes.get(pos..pos + n).ok_or_else(|| truncated(pos, n, bytes.len()))
}

fn truncated(offset: usize, needed: usize, len: usize) -> ProtocolError {
    ProtocolError::Truncated { offset, needed, available: len.saturating_sub(offset) }
}

/// A parameter buffer read back into tagged items, in buffer order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedBuffer {
    pub kind: BufferKind,
    pub items: Vec<(SpbTag, ParamValue)>,
}

impl DecodedBuffer {
    pub fn get(&self, tag: SpbTag) -> Option<&ParamValue> {
        self.items.iter().find(|(t, _)| *t == tag).map(|(_, v)| v)
    }

    pub fn int(&self, tag: SpbTag) -> Option<i128> {
        self.get(tag).and_then(ParamValue::as_int)
    }

    pub fn text(&self, tag: SpbTag) -> Option<&str> {
        self.get(tag).and_then(ParamValue::as_str)
    }

    pub fn has(&self, tag: SpbTag) -> bool {
        self.get(tag).is_some()
    }
}

#[cfg(test)]
#[path = "spb_tests.rs"]
mod tests;
