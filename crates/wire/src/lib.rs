// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service protocol codec.
//!
//! Packets travel as frames: 4-byte length prefix (big-endian) + XDR payload.
//! Inside packets, parameter buffers (requests) and information buffers
//! (responses) use their own little-endian tagged encodings, both driven by
//! the tag tables in [`spb`] and [`info`].

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod action;
mod error;
mod framing;
pub mod info;
pub mod messages;
pub mod packet;
pub mod spb;
pub mod status;
mod xdr;

pub use action::{Action, Completion, DrainItem, ServiceAction};
pub use error::{EncodingError, ProtocolError};
pub use framing::{read_frame, write_frame, MAX_FRAME_SIZE};
#[cfg(any(test, feature = "test-support"))]
pub use info::InfoBuilder;
pub use info::{parse_info, InfoItem, InfoPayload, InfoReader, InfoScope, InfoTag};
pub use packet::{GenericResponse, Reply, Request};
pub use spb::{BufferKind, DecodedBuffer, ParamType, ParamValue, ParameterBuffer, SpbTag};
pub use status::{Arg, Fragment, Message, StatusChain};
pub use xdr::{XdrReader, XdrWriter};
