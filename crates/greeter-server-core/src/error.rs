//! Error types for the server transport layer.

use thiserror::Error;

/// Errors that can occur in the server transport.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("failed to listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("connection accept failed: {0}")]
    Accept(#[source] std::io::Error),

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("TLS handshake not completed within {0:?}")]
    HandshakeTimeout(std::time::Duration),

    #[error("stream I/O error: {0}")]
    StreamIo(String),

    #[error("protocol error: {0}")]
    Protocol(#[from] greeter_proto::ProtoError),
}

pub type Result<T> = std::result::Result<T, ServerError>;
