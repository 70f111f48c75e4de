//! Authenticated connection wrapper (client-side).
//!
//! After the TLS handshake succeeds, `GreeterConnection` wraps the stream
//! and records whether the handshake was abbreviated by resuming a cached
//! session.

use std::net::SocketAddr;

use bytes::BytesMut;
use greeter_proto::wire::{CallRequest, CallResponse};
use prost::Message;
use rustls::HandshakeKind;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::error::{ClientError, Result};
use crate::stream_io;

/// A TLS connection to a greeter server.
pub struct GreeterConnection {
    inner: TlsStream<TcpStream>,
    read_buf: BytesMut,
}

impl GreeterConnection {
    pub(crate) fn new(inner: TlsStream<TcpStream>) -> Self {
        Self {
            inner,
            read_buf: BytesMut::new(),
        }
    }

    /// Returns true if this connection resumed an earlier session.
    pub fn resumed(&self) -> bool {
        matches!(self.inner.get_ref().1.handshake_kind(), Some(HandshakeKind::Resumed))
    }

    /// The server's address.
    pub fn peer_addr(&self) -> Result<SocketAddr> {
        self.inner
            .get_ref()
            .0
            .peer_addr()
            .map_err(|e| ClientError::StreamIo(format!("peer address: {e}")))
    }

    /// The negotiated TLS version, e.g. `TLSv1_3`.
    pub fn protocol_version(&self) -> Option<rustls::ProtocolVersion> {
        self.inner.get_ref().1.protocol_version()
    }

    /// Issue one unary call and wait for its reply.
    ///
    /// A non-OK status from the server becomes [`ClientError::Status`].
    pub async fn call<Req, Resp>(&mut self, method: &str, request: &Req) -> Result<Resp>
    where
        Req: Message,
        Resp: Message + Default,
    {
        let call = CallRequest::new(method, request);
        stream_io::write_message(&mut self.inner, &call).await?;

        let response: CallResponse =
            stream_io::read_message(&mut self.inner, &mut self.read_buf).await?;

        if !response.is_ok() {
            return Err(ClientError::Status {
                code: response.code,
                detail: response.detail,
            });
        }

        Ok(response.decode_payload()?)
    }

    /// Send `close_notify` and shut the connection down.
    pub async fn close(mut self) {
        if let Err(e) = self.inner.shutdown().await {
            debug!(error = %e, "connection shutdown failed");
        }
    }
}
