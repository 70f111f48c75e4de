//! Error types for the client transport layer.

use std::time::Duration;

use greeter_proto::error::status;
use thiserror::Error;

/// Errors that can occur in the client transport.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("did not connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("TLS handshake failed: {0}")]
    Handshake(#[source] std::io::Error),

    #[error("stream I/O error: {0}")]
    StreamIo(String),

    #[error("connection closed before a reply was received")]
    ConnectionClosed,

    #[error("call failed with {} ({code}): {detail}", status::name(*code))]
    Status { code: u32, detail: String },

    #[error("deadline of {0:?} exceeded")]
    DeadlineExceeded(Duration),

    #[error("protocol error: {0}")]
    Protocol(#[from] greeter_proto::ProtoError),
}

impl ClientError {
    /// The status code this error maps to, for callers that log codes.
    pub fn code(&self) -> u32 {
        match self {
            ClientError::Status { code, .. } => *code,
            ClientError::DeadlineExceeded(_) => status::DEADLINE_EXCEEDED,
            _ => status::INTERNAL,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
