// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maintenance intents and the service actions that carry them.
//!
//! Several intents share one wire-level action code (every tuning setter is a
//! `properties` action), so each intent declares its own whitelist of tags.
//! The builder enforces the intent's whitelist; the decoder, which only sees
//! the action code, accepts the union for that code.

use std::fmt;

use crate::info::InfoTag;
use crate::spb::SpbTag;

/// Wire-level service action: the first byte of an action buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceAction {
    Repair,
    Properties,
}

const REPAIR_TAGS: &[SpbTag] = &[
    SpbTag::DbName,
    SpbTag::Options,
    SpbTag::CommitTrans,
    SpbTag::RollbackTrans,
    SpbTag::CommitTrans64,
    SpbTag::RollbackTrans64,
];

const PROPERTIES_TAGS: &[SpbTag] = &[
    SpbTag::DbName,
    SpbTag::Options,
    SpbTag::PageBuffers,
    SpbTag::SweepInterval,
    SpbTag::ShutdownDb,
    SpbTag::DenyNewAttachments,
    SpbTag::DenyNewTransactions,
    SpbTag::ReserveSpace,
    SpbTag::WriteMode,
    SpbTag::AccessMode,
    SpbTag::SqlDialect,
    SpbTag::ForceShutdown,
    SpbTag::AttachmentsShutdown,
    SpbTag::TransactionsShutdown,
    SpbTag::ShutdownMode,
    SpbTag::OnlineMode,
];

impl ServiceAction {
    pub const fn code(self) -> u8 {
        match self {
            Self::Repair => 3,
            Self::Properties => 8,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            3 => Some(Self::Repair),
            8 => Some(Self::Properties),
            _ => None,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Repair => "repair",
            Self::Properties => "properties",
        }
    }

    /// Every tag that any intent carried by this action may use.
    pub fn tags(self) -> &'static [SpbTag] {
        match self {
            Self::Repair => REPAIR_TAGS,
            Self::Properties => PROPERTIES_TAGS,
        }
    }
}

impl fmt::Display for ServiceAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What the executor reads while draining a streaming action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrainItem {
    /// Free-text output lines
    Output,
    /// Limbo transaction records
    LimboTransactions,
}

impl DrainItem {
    pub const fn info_tag(self) -> InfoTag {
        match self {
            Self::Output => InfoTag::ToEof,
            Self::LimboTransactions => InfoTag::LimboTrans,
        }
    }
}

/// Response protocol an action runs after submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// One status check round trip
    Immediate,
    /// Poll until an empty chunk, then a status check
    Streaming(DrainItem),
}

/// A maintenance intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Sweep,
    Validate,
    Mend,
    SetAccessMode,
    SetDialect,
    SetPageBuffers,
    SetWriteMode,
    SetPageFill,
    Shutdown,
    ShutdownEx,
    Online,
    OnlineEx,
    SetSweepInterval,
    DisableLinger,
    ListLimboTransactions,
    ResolveLimboTransaction,
}

impl Action {
    pub const ALL: [Action; 16] = [
        Action::Sweep,
        Action::Validate,
        Action::Mend,
        Action::SetAccessMode,
        Action::SetDialect,
        Action::SetPageBuffers,
        Action::SetWriteMode,
        Action::SetPageFill,
        Action::Shutdown,
        Action::ShutdownEx,
        Action::Online,
        Action::OnlineEx,
        Action::SetSweepInterval,
        Action::DisableLinger,
        Action::ListLimboTransactions,
        Action::ResolveLimboTransaction,
    ];

    pub const fn service_action(self) -> ServiceAction {
        match self {
            Self::Sweep
            | Self::Validate
            | Self::Mend
            | Self::ListLimboTransactions
            | Self::ResolveLimboTransaction => ServiceAction::Repair,
            _ => ServiceAction::Properties,
        }
    }

    pub const fn code(self) -> u8 {
        self.service_action().code()
    }

    pub fn accepted_tags(self) -> &'static [SpbTag] {
        use SpbTag::*;
        match self {
            Self::Sweep
            | Self::Validate
            | Self::Mend
            | Self::Online
            | Self::DisableLinger
            | Self::ListLimboTransactions => &[DbName, Options],
            Self::SetAccessMode => &[DbName, AccessMode],
            Self::SetDialect => &[DbName, SqlDialect],
            Self::SetPageBuffers => &[DbName, PageBuffers],
            Self::SetWriteMode => &[DbName, WriteMode],
            Self::SetPageFill => &[DbName, ReserveSpace],
            Self::Shutdown => &[DbName, ShutdownDb, DenyNewAttachments, DenyNewTransactions],
            Self::ShutdownEx => {
                &[DbName, ShutdownMode, ForceShutdown, AttachmentsShutdown, TransactionsShutdown]
            }
            Self::OnlineEx => &[DbName, OnlineMode],
            Self::SetSweepInterval => &[DbName, SweepInterval],
            Self::ResolveLimboTransaction => {
                &[DbName, CommitTrans, RollbackTrans, CommitTrans64, RollbackTrans64]
            }
        }
    }

    pub fn accepts(self, tag: SpbTag) -> bool {
        self.accepted_tags().contains(&tag)
    }

    pub const fn completion(self) -> Completion {
        match self {
            Self::Sweep | Self::Validate | Self::Mend => Completion::Streaming(DrainItem::Output),
            Self::ListLimboTransactions => Completion::Streaming(DrainItem::LimboTransactions),
            _ => Completion::Immediate,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Sweep => "sweep",
            Self::Validate => "validate",
            Self::Mend => "mend",
            Self::SetAccessMode => "set-access-mode",
            Self::SetDialect => "set-dialect",
            Self::SetPageBuffers => "set-page-buffers",
            Self::SetWriteMode => "set-write-mode",
            Self::SetPageFill => "set-page-fill",
            Self::Shutdown => "shutdown",
            Self::ShutdownEx => "shutdown-extended",
            Self::Online => "bring-online",
            Self::OnlineEx => "bring-online-extended",
            Self::SetSweepInterval => "set-sweep-interval",
            Self::DisableLinger => "disable-linger",
            Self::ListLimboTransactions => "list-limbo-transactions",
            Self::ResolveLimboTransaction => "resolve-limbo-transaction",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
#[path = "action_tests.rs"]
mod tests;
