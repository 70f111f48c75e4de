//! Greeter client endpoint.
//!
//! `ClientEndpoint` dials a greeter server with the client TLS policy and
//! invokes `SayHello`. Every call opens its own connection; connections
//! share the policy's session cache, so the second and later handshakes to
//! the same server can be abbreviated.

use std::time::Duration;

use greeter_proto::config::{DEFAULT_CALL_TIMEOUT, SAY_HELLO_METHOD};
use greeter_proto::tls::ClientPolicy;
use greeter_proto::wire::{HelloReply, HelloRequest};
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info};

use crate::connection::GreeterConnection;
use crate::error::{ClientError, Result};

/// A client that connects to greeter servers.
pub struct ClientEndpoint {
    policy: ClientPolicy,
    connector: TlsConnector,
    call_timeout: Duration,
}

impl ClientEndpoint {
    /// Create an endpoint from an already-built client policy.
    pub fn new(policy: ClientPolicy) -> Self {
        let connector = TlsConnector::from(policy.config());
        Self {
            policy,
            connector,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    /// Override the per-call deadline (default one second).
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn policy(&self) -> &ClientPolicy {
        &self.policy
    }

    /// Open a TCP connection to `addr` and run the TLS handshake.
    ///
    /// The server certificate is verified against the policy's logical
    /// server name, not against `addr`.
    pub async fn connect(&self, addr: &str) -> Result<GreeterConnection> {
        let tcp = TcpStream::connect(addr)
            .await
            .map_err(|source| ClientError::Connect {
                addr: addr.to_string(),
                source,
            })?;
        if let Err(e) = tcp.set_nodelay(true) {
            debug!(error = %e, "could not disable Nagle");
        }

        let tls = self
            .connector
            .connect(self.policy.server_name().clone(), tcp)
            .await
            .map_err(ClientError::Handshake)?;

        let conn = GreeterConnection::new(tls);
        debug!(
            %addr,
            resumed = conn.resumed(),
            version = ?conn.protocol_version(),
            "TLS handshake complete"
        );
        Ok(conn)
    }

    /// Connect to `addr` and call `SayHello` with `name`.
    ///
    /// Dialing, the handshake, and the call together must finish within the
    /// call timeout or [`ClientError::DeadlineExceeded`] is returned.
    pub async fn say_hello(&self, addr: &str, name: &str) -> Result<HelloReply> {
        tokio::time::timeout(self.call_timeout, self.say_hello_inner(addr, name))
            .await
            .map_err(|_| ClientError::DeadlineExceeded(self.call_timeout))?
    }

    async fn say_hello_inner(&self, addr: &str, name: &str) -> Result<HelloReply> {
        let mut conn = self.connect(addr).await?;

        let request = HelloRequest {
            name: name.to_string(),
        };
        let reply: HelloReply = conn.call(SAY_HELLO_METHOD, &request).await?;

        info!(%addr, resumed = conn.resumed(), "SayHello complete");
        conn.close().await;
        Ok(reply)
    }
}
