//! Process-level defaults shared by the client and server binaries.

use std::path::PathBuf;
use std::time::Duration;

/// Address the server listens on.
pub const DEFAULT_LISTEN_ADDR: &str = "0.0.0.0:50051";

/// Address the client dials.
pub const DEFAULT_SERVER_ADDR: &str = "localhost:50051";

/// Logical name the client expects in the server certificate.
///
/// Deliberately not a DNS name: the server certificate is issued for
/// `server` and verified against that, whatever host it is reached at.
pub const DEFAULT_SERVER_NAME: &str = "server";

/// Name greeted when none is given on the command line.
pub const DEFAULT_NAME: &str = "world";

/// Number of servers the client session cache remembers.
pub const DEFAULT_SESSION_CACHE_CAPACITY: usize = 32;

/// Deadline applied to each client call, from dial to reply.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(1);

/// How long the server waits for a new connection to finish its TLS
/// handshake before dropping it.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(10);

/// Method path of the single RPC.
pub const SAY_HELLO_METHOD: &str = "/helloworld.Greeter/SayHello";

/// Locations of the three PEM files one side needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertPaths {
    /// Root CA bundle used to verify the peer.
    pub ca: PathBuf,
    /// Leaf certificate (chain) presented to the peer.
    pub cert: PathBuf,
    /// Private key matching `cert`.
    pub key: PathBuf,
}

impl CertPaths {
    pub fn new(ca: impl Into<PathBuf>, cert: impl Into<PathBuf>, key: impl Into<PathBuf>) -> Self {
        Self {
            ca: ca.into(),
            cert: cert.into(),
            key: key.into(),
        }
    }

    /// Default client credentials, relative to the working directory.
    pub fn client_default() -> Self {
        Self::new("../certs/CAcert.pem", "../certs/client.crt", "../certs/client.pem")
    }

    /// Default server credentials, relative to the working directory.
    pub fn server_default() -> Self {
        Self::new("../certs/CAcert.pem", "../certs/server.crt", "../certs/server.pem")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sides_share_the_ca_bundle() {
        assert_eq!(CertPaths::client_default().ca, CertPaths::server_default().ca);
        assert_ne!(CertPaths::client_default().cert, CertPaths::server_default().cert);
    }

    #[test]
    fn call_timeout_is_one_second() {
        assert_eq!(DEFAULT_CALL_TIMEOUT, Duration::from_secs(1));
    }
}
