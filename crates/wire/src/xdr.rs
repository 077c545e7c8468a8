// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! XDR primitives for the packet layer.
//!
//! Integers are big-endian int32 (quads are two of them). Strings and opaque
//! buffers carry an int32 length and are zero-padded to a 4-byte boundary.

use crate::ProtocolError;

fn padding(len: usize) -> usize {
    (4 - len % 4) % 4
}

#[derive(Debug, Default)]
pub struct XdrWriter {
    buf: Vec<u8>,
}

impl XdrWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put_i32(&mut self, value: i32) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_u64(&mut self, value: u64) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn put_opaque(&mut self, bytes: &[u8]) -> &mut Self {
        self.put_i32(bytes.len() as i32);
        self.buf.extend_from_slice(bytes);
        self.buf.resize(self.buf.len() + padding(bytes.len()), 0);
        self
    }

    pub fn put_str(&mut self, value: &str) -> &mut Self {
        self.put_opaque(value.as_bytes())
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

pub struct XdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> XdrReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], ProtocolError> {
        if self.remaining() < n {
            return Err(ProtocolError::Truncated {
                offset: self.pos,
                needed: n,
                available: self.remaining(),
            });
        }
        let slice = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    pub fn get_i32(&mut self) -> Result<i32, ProtocolError> {
        let b = self.take(4)?;
        Ok(i32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn get_u64(&mut self) -> Result<u64, ProtocolError> {
        let b = self.take(8)?;
        let mut raw = [0u8; 8];
        raw.copy_from_slice(b);
        Ok(u64::from_be_bytes(raw))
    }

    pub fn get_opaque(&mut self) -> Result<Vec<u8>, ProtocolError> {
        let len = self.get_i32()?;
        let len = usize::try_from(len).map_err(|_| ProtocolError::NegativeLength(len))?;
        let bytes = self.take(len)?.to_vec();
        self.take(padding(len))?;
        Ok(bytes)
    }

    /// Read a string; invalid UTF-8 is replaced rather than rejected.
    pub fn get_string(&mut self) -> Result<String, ProtocolError> {
        let bytes = self.get_opaque()?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }
}

#[cfg(test)]
#[path = "xdr_tests.rs"]
mod tests;
