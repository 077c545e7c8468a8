// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Service protocol packets.
//!
//! Each packet is one frame whose payload starts with an XDR int32 op code.

use crate::status::StatusChain;
use crate::xdr::{XdrReader, XdrWriter};
use crate::ProtocolError;

pub mod op {
    pub const CONNECT: i32 = 1;
    pub const ACCEPT: i32 = 3;
    pub const REJECT: i32 = 4;
    pub const RESPONSE: i32 = 9;
    pub const DUMMY: i32 = 57;
    pub const SERVICE_ATTACH: i32 = 82;
    pub const SERVICE_DETACH: i32 = 83;
    pub const SERVICE_INFO: i32 = 84;
    pub const SERVICE_START: i32 = 85;
}

/// Protocol 13 with the vendor flag set.
pub const PROTOCOL_VERSION: i32 = 0x800D;

pub const SERVICE_NAME: &str = "service_mgr";

/// Client to server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Connect { version: i32, dialect: i32, wire_crypt: i32 },
    ServiceAttach { name: String, spb: Vec<u8> },
    ServiceStart { handle: i32, spb: Vec<u8> },
    ServiceInfo { handle: i32, send_items: Vec<u8>, receive_items: Vec<u8>, buffer_length: u32 },
    ServiceDetach { handle: i32 },
}

impl Request {
    pub fn op(&self) -> i32 {
        match self {
            Self::Connect { .. } => op::CONNECT,
            Self::ServiceAttach { .. } => op::SERVICE_ATTACH,
            Self::ServiceStart { .. } => op::SERVICE_START,
            Self::ServiceInfo { .. } => op::SERVICE_INFO,
            Self::ServiceDetach { .. } => op::SERVICE_DETACH,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect",
            Self::ServiceAttach { .. } => "service_attach",
            Self::ServiceStart { .. } => "service_start",
            Self::ServiceInfo { .. } => "service_info",
            Self::ServiceDetach { .. } => "service_detach",
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        w.put_i32(self.op());
        match self {
            Self::Connect { version, dialect, wire_crypt } => {
                w.put_i32(*version).put_i32(*dialect).put_i32(*wire_crypt);
            }
            Self::ServiceAttach { name, spb } => {
                w.put_i32(0).put_str(name).put_opaque(spb);
            }
            Self::ServiceStart { handle, spb } => {
                w.put_i32(*handle).put_i32(0).put_opaque(spb);
            }
            Self::ServiceInfo { handle, send_items, receive_items, buffer_length } => {
                w.put_i32(*handle)
                    .put_i32(0)
                    .put_opaque(send_items)
                    .put_opaque(receive_items)
                    .put_i32(*buffer_length as i32);
            }
            Self::ServiceDetach { handle } => {
                w.put_i32(*handle);
            }
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = XdrReader::new(bytes);
        Ok(match r.get_i32()? {
            op::CONNECT => Self::Connect {
                version: r.get_i32()?,
                dialect: r.get_i32()?,
                wire_crypt: r.get_i32()?,
            },
            op::SERVICE_ATTACH => {
                let _object = r.get_i32()?;
                Self::ServiceAttach { name: r.get_string()?, spb: r.get_opaque()? }
            }
            op::SERVICE_START => {
                let handle = r.get_i32()?;
                let _incarnation = r.get_i32()?;
                Self::ServiceStart { handle, spb: r.get_opaque()? }
            }
            op::SERVICE_INFO => {
                let handle = r.get_i32()?;
                let _incarnation = r.get_i32()?;
                Self::ServiceInfo {
                    handle,
                    send_items: r.get_opaque()?,
                    receive_items: r.get_opaque()?,
                    buffer_length: r.get_i32()? as u32,
                }
            }
            op::SERVICE_DETACH => Self::ServiceDetach { handle: r.get_i32()? },
            other => return Err(ProtocolError::UnexpectedOp(other)),
        })
    }
}

/// Payload of `op_response`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenericResponse {
    pub handle: i32,
    pub object_id: u64,
    pub data: Vec<u8>,
    pub status: StatusChain,
}

/// Server to client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Accept { version: i32 },
    Reject,
    Response(GenericResponse),
    Dummy,
}

impl Reply {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Accept { .. } => "accept",
            Self::Reject => "reject",
            Self::Response(_) => "response",
            Self::Dummy => "dummy",
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut w = XdrWriter::new();
        match self {
            Self::Accept { version } => {
                w.put_i32(op::ACCEPT).put_i32(*version);
            }
            Self::Reject => {
                w.put_i32(op::REJECT);
            }
            Self::Dummy => {
                w.put_i32(op::DUMMY);
            }
            Self::Response(resp) => {
                w.put_i32(op::RESPONSE)
                    .put_i32(resp.handle)
                    .put_u64(resp.object_id)
                    .put_opaque(&resp.data);
                resp.status.write(&mut w);
            }
        }
        w.into_bytes()
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        let mut r = XdrReader::new(bytes);
        Ok(match r.get_i32()? {
            op::ACCEPT => Self::Accept { version: r.get_i32()? },
            op::REJECT => Self::Reject,
            op::DUMMY => Self::Dummy,
            op::RESPONSE => Self::Response(GenericResponse {
                handle: r.get_i32()?,
                object_id: r.get_u64()?,
                data: r.get_opaque()?,
                status: StatusChain::read(&mut r)?,
            }),
            other => return Err(ProtocolError::UnexpectedOp(other)),
        })
    }
}

#[cfg(test)]
#[path = "packet_tests.rs"]
mod tests;
