// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Packet transport beneath a service attachment.

use async_trait::async_trait;
use fbsvc_wire::{read_frame, write_frame, ProtocolError};
use tokio::net::TcpStream;

use crate::{Error, ServiceManagerOptions};

/// Moves whole packets. Implementations own the byte stream; the attachment
/// never touches a socket directly.
#[async_trait]
pub trait Transport: Send {
    async fn send(&mut self, packet: &[u8]) -> Result<(), ProtocolError>;

    /// Next packet. `ConnectionClosed` once the peer is gone.
    async fn receive(&mut self) -> Result<Vec<u8>, ProtocolError>;

    async fn close(&mut self) -> Result<(), ProtocolError>;
}

/// Framed TCP transport.
pub struct TcpTransport {
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub async fn connect(address: &str, options: &ServiceManagerOptions) -> Result<Self, Error> {
        let connect = TcpStream::connect(address);
        let stream = match options.connect_timeout() {
            Some(limit) => tokio::time::timeout(limit, connect).await.map_err(|_| {
                Error::Connection(format!("timed out connecting to {address} after {limit:?}"))
            })?,
            None => connect.await,
        }
        .map_err(|e| Error::Connection(format!("failed to connect to {address}: {e}")))?;

        stream
            .set_nodelay(true)
            .map_err(|e| Error::Connection(format!("failed to configure socket: {e}")))?;
        tracing::debug!(%address, "service transport connected");
        Ok(Self { stream: Some(stream) })
    }

    fn stream(&mut self) -> Result<&mut TcpStream, ProtocolError> {
        self.stream.as_mut().ok_or(ProtocolError::ConnectionClosed)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    async fn send(&mut self, packet: &[u8]) -> Result<(), ProtocolError> {
        write_frame(self.stream()?, packet).await
    }

    async fn receive(&mut self) -> Result<Vec<u8>, ProtocolError> {
        read_frame(self.stream()?).await
    }

    async fn close(&mut self) -> Result<(), ProtocolError> {
        if let Some(mut stream) = self.stream.take() {
            use tokio::io::AsyncWriteExt;
            stream.shutdown().await?;
        }
        Ok(())
    }
}
