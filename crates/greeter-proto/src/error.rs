//! Error types and call status codes for the greeter protocol.
//!
//! Wire-level call outcomes use the numeric codes in [`status`], carried in
//! the `CallResponse` envelope (see [`crate::wire`]). This module defines the
//! Rust-native error type used within crate boundaries.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur within the `greeter-proto` crate.
#[derive(Debug, Error)]
pub enum ProtoError {
    // --- Certificate loading ---
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {reason}", path.display())]
    Parse { path: PathBuf, reason: String },

    #[error("private key does not match certificate public key")]
    KeyMismatch,

    // --- TLS ---
    #[error("invalid server name {0:?}")]
    InvalidServerName(String),

    #[error("TLS configuration error: {0}")]
    TlsConfiguration(String),

    #[error("certificate inspection failed: {0}")]
    CertificateInspection(String),

    // --- Serialization ---
    #[error("protobuf encode error: {0}")]
    ProtobufEncode(#[from] prost::EncodeError),

    #[error("protobuf decode error: {0}")]
    ProtobufDecode(#[from] prost::DecodeError),

    #[error("frame too large: {len} bytes (max {max})")]
    FrameTooLarge { len: usize, max: usize },
}

impl ProtoError {
    /// Returns true for the three certificate-loading failures.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            ProtoError::Read { .. } | ProtoError::Parse { .. } | ProtoError::KeyMismatch
        )
    }
}

/// Result type alias using [`ProtoError`].
pub type Result<T> = std::result::Result<T, ProtoError>;

// =========================================================================
// Call status codes
//
// Numbering follows the gRPC status codes so that log output reads the same
// as a gRPC deployment of the same service.
// =========================================================================

/// Status codes carried in `CallResponse.code`.
pub mod status {
    pub const OK: u32 = 0;
    pub const DEADLINE_EXCEEDED: u32 = 4;
    pub const UNIMPLEMENTED: u32 = 12;
    pub const INTERNAL: u32 = 13;
    pub const UNAUTHENTICATED: u32 = 16;

    /// Human-readable name of a status code, for logs.
    pub fn name(code: u32) -> &'static str {
        match code {
            OK => "OK",
            DEADLINE_EXCEEDED => "DEADLINE_EXCEEDED",
            UNIMPLEMENTED => "UNIMPLEMENTED",
            INTERNAL => "INTERNAL",
            UNAUTHENTICATED => "UNAUTHENTICATED",
            _ => "UNKNOWN",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_errors_are_classified() {
        let read = ProtoError::Read {
            path: PathBuf::from("missing.pem"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        let parse = ProtoError::Parse {
            path: PathBuf::from("bad.pem"),
            reason: "no certificates".into(),
        };
        assert!(read.is_load_error());
        assert!(parse.is_load_error());
        assert!(ProtoError::KeyMismatch.is_load_error());
        assert!(!ProtoError::TlsConfiguration("x".into()).is_load_error());
    }

    #[test]
    fn read_error_names_the_path() {
        let err = ProtoError::Read {
            path: PathBuf::from("../certs/CAcert.pem"),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert!(err.to_string().contains("../certs/CAcert.pem"));
    }

    #[test]
    fn status_names() {
        assert_eq!(status::name(status::OK), "OK");
        assert_eq!(status::name(status::UNAUTHENTICATED), "UNAUTHENTICATED");
        assert_eq!(status::name(999), "UNKNOWN");
    }
}
