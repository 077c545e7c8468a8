// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Information buffers: the tagged response payloads of info queries.
//!
//! Little-endian throughout. Each item is a tag byte followed by a payload
//! whose shape the tag declares: nothing (markers), a fixed-width integer, a
//! `u16`-length text, or a `u16`-length cluster of sub-items. A buffer ends at
//! `End` or when exhausted.

use crate::ProtocolError;

/// Payload shape a tag declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InfoKind {
    Marker,
    Byte,
    Int32,
    Int64,
    Text,
    Cluster,
}

/// Where an item sits: directly in the response, or inside a limbo cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InfoScope {
    TopLevel,
    LimboRecord,
}

impl InfoScope {
    fn name(self) -> &'static str {
        match self {
            Self::TopLevel => "info",
            Self::LimboRecord => "limbo record",
        }
    }

    fn tags(self) -> &'static [InfoTag] {
        match self {
            Self::TopLevel => TOP_LEVEL_TAGS,
            Self::LimboRecord => LIMBO_RECORD_TAGS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InfoTag {
    End,
    Truncated,
    /// Sentinel failure; carries an error code
    Error,
    DataNotReady,
    ServerVersion,
    GetEnv,
    Line,
    ToEof,
    LimboTrans,
    Running,

    SingleTraId,
    MultiTraId,
    SingleTraId64,
    MultiTraId64,
    TraState,
    TraAdvise,
    TraHostSite,
    TraRemoteSite,
    TraDbPath,
}

const TOP_LEVEL_TAGS: &[InfoTag] = &[
    InfoTag::End,
    InfoTag::Truncated,
    InfoTag::Error,
    InfoTag::DataNotReady,
    InfoTag::ServerVersion,
    InfoTag::GetEnv,
    InfoTag::Line,
    InfoTag::ToEof,
    InfoTag::LimboTrans,
    InfoTag::Running,
];

const LIMBO_RECORD_TAGS: &[InfoTag] = &[
    InfoTag::End,
    InfoTag::SingleTraId,
    InfoTag::MultiTraId,
    InfoTag::SingleTraId64,
    InfoTag::MultiTraId64,
    InfoTag::TraState,
    InfoTag::TraAdvise,
    InfoTag::TraHostSite,
    InfoTag::TraRemoteSite,
    InfoTag::TraDbPath,
];

/// Values of `TraState` and `TraAdvise`.
pub mod limbo {
    pub const STATE_LIMBO: u8 = 22;
    pub const STATE_COMMIT: u8 = 23;
    pub const STATE_ROLLBACK: u8 = 24;
    pub const STATE_UNKNOWN: u8 = 25;

    pub const ADVISE_COMMIT: u8 = 30;
    pub const ADVISE_ROLLBACK: u8 = 31;
    pub const ADVISE_UNKNOWN: u8 = 33;
}

impl InfoTag {
    const fn descriptor(self) -> (u8, InfoKind) {
        match self {
            Self::End => (1, InfoKind::Marker),
            Self::Truncated => (2, InfoKind::Marker),
            Self::Error => (3, InfoKind::Int32),
            Self::DataNotReady => (4, InfoKind::Marker),
            Self::ServerVersion => (55, InfoKind::Text),
            Self::GetEnv => (59, InfoKind::Text),
            Self::Line => (62, InfoKind::Text),
            Self::ToEof => (63, InfoKind::Text),
            Self::LimboTrans => (66, InfoKind::Cluster),
            Self::Running => (67, InfoKind::Int32),
            Self::SingleTraId => (19, InfoKind::Int32),
            Self::MultiTraId => (20, InfoKind::Int32),
            Self::TraState => (21, InfoKind::Byte),
            Self::TraHostSite => (26, InfoKind::Text),
            Self::TraRemoteSite => (27, InfoKind::Text),
            Self::TraDbPath => (28, InfoKind::Text),
            Self::TraAdvise => (29, InfoKind::Byte),
            Self::SingleTraId64 => (47, InfoKind::Int64),
            Self::MultiTraId64 => (48, InfoKind::Int64),
        }
    }

    pub const fn code(self) -> u8 {
        self.descriptor().0
    }

    fn kind(self) -> InfoKind {
        self.descriptor().1
    }

    pub fn from_code(scope: InfoScope, code: u8) -> Option<Self> {
        scope.tags().iter().copied().find(|t| t.code() == code)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InfoPayload {
    Int(i64),
    Text(String),
    Record(Vec<InfoItem>),
    Marker,
}

/// One decoded response unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InfoItem {
    pub tag: InfoTag,
    pub payload: InfoPayload,
}

impl InfoItem {
    pub fn new(tag: InfoTag, payload: InfoPayload) -> Self {
        Self { tag, payload }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self.payload {
            InfoPayload::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match &self.payload {
            InfoPayload::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&[InfoItem]> {
        match &self.payload {
            InfoPayload::Record(items) => Some(items),
            _ => None,
        }
    }
}

/// Cursor over an information buffer. Never panics on malformed input.
pub struct InfoReader<'a> {
    buf: &'a [u8],
    pos: usize,
    scope: InfoScope,
    finished: bool,
}

impl<'a> InfoReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self::with_scope(buf, InfoScope::TopLevel)
    }

    pub fn with_scope(buf: &'a [u8], scope: InfoScope) -> Self {
        Self { buf, pos: 0, scope, finished: false }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        let available = self.buf.len() - self.pos;
        if available < n {
            return Err(ProtocolError::Truncated { offset: self.pos, needed: n, available });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn take_len(&mut self) -> Result<usize, ProtocolError> {
        let raw = self.take(2)?;
        Ok(u16::from_le_bytes([raw[0], raw[1]]) as usize)
    }

    /// Next item, or `None` once `End` has been returned or the buffer is
    /// exhausted.
    pub fn next_item(&mut self) -> Result<Option<InfoItem>, ProtocolError> {
        if self.finished || self.pos >= self.buf.len() {
            return Ok(None);
        }

        let offset = self.pos;
        let code = self.buf[offset];
        let tag = match InfoTag::from_code(self.scope, code) {
            Some(tag) => tag,
            None => {
                self.finished = true;
                let scope = self.scope.name();
                return Err(ProtocolError::UnknownTag { scope, tag: code, offset });
            }
        };
        self.pos += 1;

        let payload = match self.read_payload(tag) {
            Ok(payload) => payload,
            Err(e) => {
                self.finished = true;
                return Err(e);
            }
        };
        if tag == InfoTag::End {
            self.finished = true;
        }
        Ok(Some(InfoItem { tag, payload }))
    }

    fn read_payload(&mut self, tag: InfoTag) -> Result<InfoPayload, ProtocolError> {
        Ok(match tag.kind() {
            InfoKind::Marker => InfoPayload::Marker,
            InfoKind::Byte => InfoPayload::Int(i64::from(self.take(1)?[0])),
            InfoKind::Int32 => {
                let raw = self.take(4)?;
                InfoPayload::Int(i64::from(u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]])))
            }
            InfoKind::Int64 => {
                let raw = self.take(8)?;
                let mut q = [0u8; 8];
                q.copy_from_slice(raw);
                InfoPayload::Int(i64::from_le_bytes(q))
            }
            InfoKind::Text => {
                let len = self.take_len()?;
                let raw = self.take(len)?;
                InfoPayload::Text(String::from_utf8_lossy(raw).into_owned())
            }
            InfoKind::Cluster => {
                let len = self.take_len()?;
                let raw = self.take(len)?;
                let mut sub = InfoReader::with_scope(raw, InfoScope::LimboRecord);
                let mut items = Vec::new();
                while let Some(item) = sub.next_item()? {
                    if item.tag == InfoTag::End {
                        break;
                    }
                    items.push(item);
                }
                InfoPayload::Record(items)
            }
        })
    }
}

impl Iterator for InfoReader<'_> {
    type Item = Result<InfoItem, ProtocolError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_item().transpose()
    }
}

/// Parse a whole top-level buffer.
pub fn parse_info(buf: &[u8]) -> Result<Vec<InfoItem>, ProtocolError> {
    InfoReader::new(buf).collect()
}

#[cfg(any(test, feature = "test-support"))]
mod builder {
    use super::{InfoItem, InfoKind, InfoPayload, InfoTag};

    /// Encoder for information buffers, used by fake servers and tests.
    #[derive(Debug, Default)]
    pub struct InfoBuilder {
        buf: Vec<u8>,
    }

    impl InfoBuilder {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn marker(&mut self, tag: InfoTag) -> &mut Self {
            self.buf.push(tag.code());
            self
        }

        pub fn int(&mut self, tag: InfoTag, value: i64) -> &mut Self {
            self.buf.push(tag.code());
            match tag.kind() {
                InfoKind::Byte => self.buf.push(value as u8),
                InfoKind::Int64 => self.buf.extend_from_slice(&value.to_le_bytes()),
                _ => self.buf.extend_from_slice(&(value as u32).to_le_bytes()),
            }
            self
        }

        pub fn text(&mut self, tag: InfoTag, value: &str) -> &mut Self {
            let bytes = &value.as_bytes()[..value.len().min(u16::MAX as usize)];
            self.buf.push(tag.code());
            self.buf.extend_from_slice(&(bytes.len() as u16).to_le_bytes());
            self.buf.extend_from_slice(bytes);
            self
        }

        pub fn record(&mut self, tag: InfoTag, items: &[InfoItem]) -> &mut Self {
            let mut inner = InfoBuilder::new();
            for item in items {
                inner.item(item);
            }
            let body = inner.build();
            self.buf.push(tag.code());
            self.buf.extend_from_slice(&(body.len() as u16).to_le_bytes());
            self.buf.extend_from_slice(&body);
            self
        }

        pub fn item(&mut self, item: &InfoItem) -> &mut Self {
            match &item.payload {
                InfoPayload::Marker => self.marker(item.tag),
                InfoPayload::Int(v) => self.int(item.tag, *v),
                InfoPayload::Text(s) => self.text(item.tag, s),
                InfoPayload::Record(items) => self.record(item.tag, items),
            }
        }

        pub fn len(&self) -> usize {
            self.buf.len()
        }

        pub fn is_empty(&self) -> bool {
            self.buf.is_empty()
        }

        pub fn build(self) -> Vec<u8> {
            self.buf
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use builder::InfoBuilder;

#[cfg(test)]
#[path = "info_tests.rs"]
mod tests;
