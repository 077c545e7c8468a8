// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! One service session over a transport.
//!
//! The protocol is strictly request/response: every request is answered by
//! exactly one `op_response` (keep-alive `op_dummy` packets are skipped).
//! Receives race the attachment's cancellation token so a caller can unblock
//! a long drain by cancelling; that closes the transport and the in-flight
//! call fails with [`Error::ConnectionLost`].

use fbsvc_wire::packet::{PROTOCOL_VERSION, SERVICE_NAME};
use fbsvc_wire::{GenericResponse, InfoTag, ParameterBuffer, ProtocolError, Reply, Request, SpbTag};
use tokio_util::sync::CancellationToken;

use crate::{Error, ServiceManagerOptions, TcpTransport, Transport};

pub struct ServiceAttachment {
    transport: Box<dyn Transport>,
    handle: i32,
    closed: bool,
    cancel: CancellationToken,
}

impl ServiceAttachment {
    /// Open a TCP transport to `address` and attach to the service manager.
    pub async fn connect(
        address: &str,
        user: &str,
        password: &str,
        options: &ServiceManagerOptions,
    ) -> Result<Self, Error> {
        let transport = TcpTransport::connect(address, options).await?;
        Self::attach(Box::new(transport), user, password, options).await
    }

    /// Run the handshake over an already-open transport.
    pub async fn attach(
        mut transport: Box<dyn Transport>,
        user: &str,
        password: &str,
        options: &ServiceManagerOptions,
    ) -> Result<Self, Error> {
        let response = match handshake(transport.as_mut(), user, password, options).await {
            Ok(response) => response,
            Err(e) => {
                if let Err(close) = transport.close().await {
                    tracing::debug!(error = %close, "close after failed handshake failed");
                }
                return Err(e);
            }
        };
        log_warnings("service_attach", &response);

        tracing::info!(handle = response.handle, user, "service attached");
        Ok(Self {
            transport,
            handle: response.handle,
            closed: false,
            cancel: CancellationToken::new(),
        })
    }

    pub fn handle(&self) -> i32 {
        self.handle
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Cancelling the token aborts the in-flight call and closes the session.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Start a service action. Returns once the server has accepted it, not
    /// when it has finished.
    pub async fn submit_action(&mut self, spb: ParameterBuffer) -> Result<(), Error> {
        let action = spb.intent();
        let request = Request::ServiceStart { handle: self.handle, spb: spb.build() };
        self.exchange(&request).await?;
        tracing::debug!(action = ?action, "service action submitted");
        Ok(())
    }

    /// Ask for `items` with a response buffer of `buffer_length` bytes and
    /// return the raw information buffer.
    pub async fn query_info(
        &mut self,
        items: &[InfoTag],
        buffer_length: u32,
    ) -> Result<Vec<u8>, Error> {
        let request = Request::ServiceInfo {
            handle: self.handle,
            send_items: Vec::new(),
            receive_items: items.iter().map(|t| t.code()).collect(),
            buffer_length,
        };
        Ok(self.exchange(&request).await?.data)
    }

    /// Detach and close the transport. A second call is `UseAfterClose`.
    pub async fn close(&mut self) -> Result<(), Error> {
        self.ensure_open()?;
        let detached = self.exchange(&Request::ServiceDetach { handle: self.handle }).await;
        self.closed = true;
        let shutdown = self.transport.close().await;
        tracing::info!(handle = self.handle, "service detached");
        detached?;
        shutdown?;
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed {
            Err(Error::UseAfterClose)
        } else {
            Ok(())
        }
    }

    async fn exchange(&mut self, request: &Request) -> Result<GenericResponse, Error> {
        self.ensure_open()?;
        if self.cancel.is_cancelled() {
            return Err(self.abort().await);
        }
        self.transport.send(&request.encode()).await?;

        let response = loop {
            let cancel = self.cancel.clone();
            let received = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                packet = self.transport.receive() => Some(packet),
            };
            let Some(packet) = received else {
                return Err(self.abort().await);
            };
            match Reply::decode(&packet?)? {
                Reply::Dummy => continue,
                Reply::Response(response) => break response,
                other => return Err(unexpected("response", &other)),
            }
        };

        log_warnings(request.name(), &response);
        if response.status.is_error() {
            return Err(Error::Service(response.status));
        }
        Ok(response)
    }

    pub(crate) async fn abort(&mut self) -> Error {
        self.closed = true;
        if let Err(e) = self.transport.close().await {
            tracing::debug!(error = %e, "transport close after cancellation failed");
        }
        tracing::info!(handle = self.handle, "service call cancelled");
        Error::ConnectionLost
    }
}

/// Protocol negotiation followed by the service attach. The caller owns
/// closing the transport when this fails.
async fn handshake(
    transport: &mut dyn Transport,
    user: &str,
    password: &str,
    options: &ServiceManagerOptions,
) -> Result<GenericResponse, Error> {
    let connect = Request::Connect {
        version: PROTOCOL_VERSION,
        dialect: options.dialect as i32,
        wire_crypt: options.wire_crypt.level(),
    };
    transport.send(&connect.encode()).await.map_err(handshake_error)?;
    match next_reply(transport).await.map_err(handshake_error)? {
        Reply::Accept { version } => tracing::debug!(version, "protocol accepted"),
        Reply::Reject => return Err(Error::Connection("server rejected the protocol".into())),
        other => return Err(unexpected("accept", &other)),
    }

    let mut spb = ParameterBuffer::attach();
    spb.put(SpbTag::UserName, user)?.put(SpbTag::Password, password)?;
    if let Some(timeout) = options.connect_timeout() {
        spb.put(SpbTag::ConnectTimeout, timeout.as_secs().max(1))?;
    }
    if let Some(db) = &options.security_db {
        spb.put(SpbTag::ExpectedDb, db.as_str())?;
    }
    let attach = Request::ServiceAttach { name: SERVICE_NAME.to_string(), spb: spb.build() };
    transport.send(&attach.encode()).await.map_err(handshake_error)?;

    let response = match next_reply(transport).await.map_err(handshake_error)? {
        Reply::Response(response) => response,
        other => return Err(unexpected("response", &other)),
    };
    if response.status.is_error() {
        return Err(Error::Connection(response.status.render().trim_end().to_string()));
    }
    Ok(response)
}

async fn next_reply(transport: &mut dyn Transport) -> Result<Reply, ProtocolError> {
    loop {
        match Reply::decode(&transport.receive().await?)? {
            Reply::Dummy => continue,
            reply => return Ok(reply),
        }
    }
}

fn handshake_error(e: ProtocolError) -> Error {
    match e {
        ProtocolError::ConnectionClosed | ProtocolError::Io(_) => {
            Error::Connection(format!("handshake failed: {e}"))
        }
        other => Error::Protocol(other),
    }
}

fn unexpected(expected: &'static str, got: &Reply) -> Error {
    Error::Protocol(ProtocolError::UnexpectedReply { expected, got: got.name() })
}

fn log_warnings(request: &str, response: &GenericResponse) {
    for warning in response.status.warnings() {
        tracing::warn!(request, warning = %warning.render(), "server warning");
    }
}

#[cfg(test)]
#[path = "attachment_tests.rs"]
mod tests;
