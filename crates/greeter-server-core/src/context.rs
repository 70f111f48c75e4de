//! Per-call view of the transport a request arrived on.
//!
//! Handlers never see the TLS connection itself. The endpoint snapshots
//! what a handler may need (peer address, whether the session was resumed,
//! the negotiated parameters, the client certificate subject) into a
//! [`CallContext`] once per connection, and each call gets a read-only
//! reference to it.
//!
//! [`CallContext::tls_info`] is the only way to get at the TLS fields. It
//! reports an explicit [`AuthStateError`] when the call did not arrive over
//! TLS, or carries no peer at all, instead of assuming one.

use std::net::SocketAddr;

use greeter_proto::tls::cert_extract::subject_name;
use rustls::{HandshakeKind, ServerConnection};
use thiserror::Error;

/// TLS session state of the connection a call arrived on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsInfo {
    /// True if the handshake resumed a session from a ticket.
    pub resumed: bool,
    /// Negotiated protocol version, e.g. `TLSv1_3`.
    pub protocol_version: Option<String>,
    /// Negotiated cipher suite, e.g. `TLS13_AES_256_GCM_SHA384`.
    pub cipher_suite: Option<String>,
    /// Subject of the client certificate, if the client presented one.
    pub peer_subject: Option<String>,
}

impl TlsInfo {
    /// Snapshot the state of a completed server-side handshake.
    pub fn from_connection(conn: &ServerConnection) -> Self {
        let peer_subject = conn
            .peer_certificates()
            .and_then(|chain| chain.first())
            .and_then(|leaf| subject_name(leaf).ok());

        Self {
            resumed: matches!(conn.handshake_kind(), Some(HandshakeKind::Resumed)),
            protocol_version: conn.protocol_version().map(|v| format!("{v:?}")),
            cipher_suite: conn
                .negotiated_cipher_suite()
                .map(|suite| format!("{:?}", suite.suite())),
            peer_subject,
        }
    }
}

/// How the peer authenticated its transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthInfo {
    Tls(TlsInfo),
    /// The call arrived over a transport without TLS.
    Insecure,
}

/// The remote end of a call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Peer {
    pub addr: SocketAddr,
    pub auth: AuthInfo,
}

/// Why [`CallContext::tls_info`] could not produce TLS state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthStateError {
    #[error("could not get peer from call context")]
    NoPeer,

    #[error("peer {0} did not connect over TLS")]
    NotTls(SocketAddr),
}

/// Metadata available to a handler for the duration of one call.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    peer: Option<Peer>,
}

impl CallContext {
    pub fn new(peer: Peer) -> Self {
        Self { peer: Some(peer) }
    }

    /// A context for a call that arrived over TLS from `addr`.
    pub fn from_tls(addr: SocketAddr, conn: &ServerConnection) -> Self {
        Self::new(Peer {
            addr,
            auth: AuthInfo::Tls(TlsInfo::from_connection(conn)),
        })
    }

    /// A context with no peer information at all.
    pub fn without_peer() -> Self {
        Self::default()
    }

    pub fn peer(&self) -> Option<&Peer> {
        self.peer.as_ref()
    }

    /// The TLS session state of the caller's connection.
    pub fn tls_info(&self) -> Result<&TlsInfo, AuthStateError> {
        let peer = self.peer.as_ref().ok_or(AuthStateError::NoPeer)?;
        match &peer.auth {
            AuthInfo::Tls(info) => Ok(info),
            AuthInfo::Insecure => Err(AuthStateError::NotTls(peer.addr)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> SocketAddr {
        "127.0.0.1:50051".parse().unwrap()
    }

    fn tls(resumed: bool) -> TlsInfo {
        TlsInfo {
            resumed,
            protocol_version: Some("TLSv1_3".into()),
            cipher_suite: None,
            peer_subject: Some("CN=client".into()),
        }
    }

    #[test]
    fn tls_peer_exposes_session_state() {
        let ctx = CallContext::new(Peer {
            addr: addr(),
            auth: AuthInfo::Tls(tls(true)),
        });
        let info = ctx.tls_info().expect("TLS peer");
        assert!(info.resumed);
        assert_eq!(info.peer_subject.as_deref(), Some("CN=client"));
    }

    #[test]
    fn missing_peer_is_reported() {
        let ctx = CallContext::without_peer();
        assert!(ctx.peer().is_none());
        assert_eq!(ctx.tls_info(), Err(AuthStateError::NoPeer));
    }

    #[test]
    fn insecure_peer_is_not_tls() {
        let ctx = CallContext::new(Peer {
            addr: addr(),
            auth: AuthInfo::Insecure,
        });
        assert_eq!(ctx.tls_info(), Err(AuthStateError::NotTls(addr())));
    }
}
