// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Handshake options: defaults, TOML files, environment overrides.

use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;

use crate::Error;

/// Default information buffer size hint (8 KiB)
pub const DEFAULT_INFO_BUFFER_SIZE: u32 = 8 * 1024;

/// Transport encryption preference sent in the connect packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WireCrypt {
    Disabled,
    #[default]
    Enabled,
    Required,
}

impl WireCrypt {
    pub fn level(self) -> i32 {
        match self {
            Self::Disabled => 0,
            Self::Enabled => 1,
            Self::Required => 2,
        }
    }
}

impl FromStr for WireCrypt {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disabled" => Ok(Self::Disabled),
            "enabled" => Ok(Self::Enabled),
            "required" => Ok(Self::Required),
            other => Err(Error::InvalidArgument(format!("unknown wire_crypt level {other:?}"))),
        }
    }
}

/// Options for [`crate::MaintenanceManager::connect`]. They shape the
/// handshake only, never action encoding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ServiceManagerOptions {
    /// Bounds the TCP connect; also sent as the attach timeout (seconds)
    pub connect_timeout_ms: Option<u64>,
    pub dialect: u32,
    pub wire_crypt: WireCrypt,
    /// Expected security database
    pub security_db: Option<String>,
    /// Initial size hint for information queries
    pub info_buffer_size: u32,
}

impl Default for ServiceManagerOptions {
    fn default() -> Self {
        Self {
            connect_timeout_ms: None,
            dialect: 3,
            wire_crypt: WireCrypt::default(),
            security_db: None,
            info_buffer_size: DEFAULT_INFO_BUFFER_SIZE,
        }
    }
}

impl ServiceManagerOptions {
    pub fn from_toml_str(s: &str) -> Result<Self, Error> {
        let options: Self = toml::from_str(s)
            .map_err(|e| Error::InvalidArgument(format!("invalid options: {e}")))?;
        options.validate()
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::InvalidArgument(format!("cannot read options {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&text)
    }

    /// Apply `FBSVC_CONNECT_TIMEOUT_MS`, `FBSVC_WIRE_CRYPT` and `FBSVC_DIALECT`.
    pub fn with_env_overrides(self) -> Result<Self, Error> {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    pub(crate) fn with_overrides_from(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, Error> {
        if let Some(ms) = lookup("FBSVC_CONNECT_TIMEOUT_MS") {
            let ms = ms.trim().parse::<u64>().map_err(|_| {
                Error::InvalidArgument(format!("FBSVC_CONNECT_TIMEOUT_MS is not a number: {ms:?}"))
            })?;
            self.connect_timeout_ms = Some(ms);
        }
        if let Some(level) = lookup("FBSVC_WIRE_CRYPT") {
            self.wire_crypt = level.parse()?;
        }
        if let Some(dialect) = lookup("FBSVC_DIALECT") {
            self.dialect = dialect.trim().parse::<u32>().map_err(|_| {
                Error::InvalidArgument(format!("FBSVC_DIALECT is not a number: {dialect:?}"))
            })?;
        }
        self.validate()
    }

    fn validate(self) -> Result<Self, Error> {
        if !(1..=3).contains(&self.dialect) {
            let message = format!("dialect {} is not 1, 2 or 3", self.dialect);
            return Err(Error::InvalidArgument(message));
        }
        if self.info_buffer_size == 0 {
            return Err(Error::InvalidArgument("info_buffer_size must be positive".into()));
        }
        Ok(self)
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout_ms.map(Duration::from_millis)
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    pub fn with_wire_crypt(mut self, wire_crypt: WireCrypt) -> Self {
        self.wire_crypt = wire_crypt;
        self
    }

    pub fn with_security_db(mut self, security_db: impl Into<String>) -> Self {
        self.security_db = Some(security_db.into());
        self
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
