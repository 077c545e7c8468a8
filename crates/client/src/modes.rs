// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed arguments of the maintenance operations and their wire values.

use fbsvc_wire::spb::{options, values};
use fbsvc_wire::SpbTag;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationMode {
    /// Report problems without repairing
    CheckOnly,
    /// Validate record and page structures
    Full,
}

impl ValidationMode {
    pub(crate) fn options(self) -> u32 {
        match self {
            Self::CheckOnly => options::VALIDATE_DB | options::CHECK_DB,
            Self::Full => options::VALIDATE_DB | options::FULL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    ReadOnly,
    ReadWrite,
}

impl AccessMode {
    pub(crate) fn value(self) -> u8 {
        match self {
            Self::ReadOnly => values::ACCESS_MODE_READ_ONLY,
            Self::ReadWrite => values::ACCESS_MODE_READ_WRITE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    Sync,
    Async,
}

impl WriteMode {
    pub(crate) fn value(self) -> u8 {
        match self {
            Self::Sync => values::WRITE_MODE_SYNC,
            Self::Async => values::WRITE_MODE_ASYNC,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageFill {
    /// Keep space on data pages for record versions
    Reserve,
    NoReserve,
}

impl PageFill {
    pub(crate) fn value(self) -> u8 {
        match self {
            Self::Reserve => values::RESERVE_SPACE,
            Self::NoReserve => values::RESERVE_SPACE_USE_FULL,
        }
    }
}

/// Basic shutdown: the tag carries the timeout in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    DenyNewAttachments,
    DenyNewTransactions,
    Force,
}

impl ShutdownMode {
    pub const ALL: [ShutdownMode; 3] =
        [Self::DenyNewAttachments, Self::DenyNewTransactions, Self::Force];

    pub(crate) fn tag(self) -> SpbTag {
        match self {
            Self::DenyNewAttachments => SpbTag::DenyNewAttachments,
            Self::DenyNewTransactions => SpbTag::DenyNewTransactions,
            Self::Force => SpbTag::ShutdownDb,
        }
    }
}

/// Extended shutdown, paired with a target [`OperationMode`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownModeEx {
    Force,
    DenyNewAttachments,
    DenyNewTransactions,
}

impl ShutdownModeEx {
    pub(crate) fn tag(self) -> SpbTag {
        match self {
            Self::Force => SpbTag::ForceShutdown,
            Self::DenyNewAttachments => SpbTag::AttachmentsShutdown,
            Self::DenyNewTransactions => SpbTag::TransactionsShutdown,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationMode {
    Normal,
    Multi,
    Single,
    Full,
}

impl OperationMode {
    pub(crate) fn value(self) -> u8 {
        match self {
            Self::Normal => values::OPERATION_MODE_NORMAL,
            Self::Multi => values::OPERATION_MODE_MULTI,
            Self::Single => values::OPERATION_MODE_SINGLE,
            Self::Full => values::OPERATION_MODE_FULL,
        }
    }
}

/// Outcome to force on a limbo transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Commit,
    Rollback,
}

impl Resolution {
    /// Ids beyond 32 bits need the 64-bit tags.
    pub(crate) fn tag(self, id: u64) -> SpbTag {
        let wide = id > u64::from(u32::MAX);
        match (self, wide) {
            (Self::Commit, false) => SpbTag::CommitTrans,
            (Self::Commit, true) => SpbTag::CommitTrans64,
            (Self::Rollback, false) => SpbTag::RollbackTrans,
            (Self::Rollback, true) => SpbTag::RollbackTrans64,
        }
    }
}
