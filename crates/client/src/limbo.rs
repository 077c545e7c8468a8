// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use fbsvc_wire::info::limbo;

/// State of a transaction as reported by the limbo listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimboState {
    Limbo,
    Committed,
    RolledBack,
    Unknown,
}

impl LimboState {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            limbo::STATE_LIMBO => Some(Self::Limbo),
            limbo::STATE_COMMIT => Some(Self::Committed),
            limbo::STATE_ROLLBACK => Some(Self::RolledBack),
            limbo::STATE_UNKNOWN => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Limbo => limbo::STATE_LIMBO,
            Self::Committed => limbo::STATE_COMMIT,
            Self::RolledBack => limbo::STATE_ROLLBACK,
            Self::Unknown => limbo::STATE_UNKNOWN,
        }
    }
}

/// What the coordinator recommends for a limbo transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LimboAdvise {
    Commit,
    Rollback,
    Unknown,
}

impl LimboAdvise {
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            limbo::ADVISE_COMMIT => Some(Self::Commit),
            limbo::ADVISE_ROLLBACK => Some(Self::Rollback),
            limbo::ADVISE_UNKNOWN => Some(Self::Unknown),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Commit => limbo::ADVISE_COMMIT,
            Self::Rollback => limbo::ADVISE_ROLLBACK,
            Self::Unknown => limbo::ADVISE_UNKNOWN,
        }
    }
}

/// One entry of a limbo listing. A snapshot; not kept up to date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimboTransaction {
    pub id: u64,
    pub multi_database: bool,
    pub state: LimboState,
    pub advise: Option<LimboAdvise>,
    /// Multi-database transactions only
    pub host_site: Option<String>,
    pub remote_site: Option<String>,
    pub db_path: Option<String>,
}

impl LimboTransaction {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            multi_database: false,
            state: LimboState::Limbo,
            advise: None,
            host_site: None,
            remote_site: None,
            db_path: None,
        }
    }
}
