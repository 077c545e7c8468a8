// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Client for the database service manager.
//!
//! [`MaintenanceManager`] is the public surface. Underneath it a
//! [`ServiceAttachment`] owns one service session over a [`Transport`], and
//! the action executor drives each submitted action to completion: one status
//! check for immediate actions, a drain loop for streaming ones.

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod attachment;
mod config;
mod decoder;
mod error;
mod executor;
mod limbo;
mod manager;
mod modes;
mod transcript;
mod transport;

#[cfg(any(test, feature = "test-support"))]
pub mod fake;

pub use attachment::ServiceAttachment;
pub use config::{ServiceManagerOptions, WireCrypt};
pub use error::Error;
pub use executor::MaintenanceResult;
pub use limbo::{LimboAdvise, LimboState, LimboTransaction};
pub use manager::MaintenanceManager;
pub use modes::{
    AccessMode, OperationMode, PageFill, Resolution, ShutdownMode, ShutdownModeEx,
    ValidationMode, WriteMode,
};
pub use transcript::{Transcript, TranscriptSink};
pub use transport::{TcpTransport, Transport};

pub use fbsvc_wire::{Fragment, Message, StatusChain};
