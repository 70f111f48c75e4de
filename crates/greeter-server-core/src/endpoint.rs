//! TLS server endpoint for the greeter.
//!
//! `ServerEndpoint` binds a TCP listener, runs the server-side TLS handshake
//! on each incoming connection, and serves calls on that connection from its
//! own task until the client closes it.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::BytesMut;
use greeter_proto::config::DEFAULT_HANDSHAKE_TIMEOUT;
use greeter_proto::tls::ServerPolicy;
use greeter_proto::wire::{CallRequest, CallResponse};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tracing::{debug, info, warn};

use crate::context::CallContext;
use crate::error::{Result, ServerError};
use crate::service::{dispatch, Greeter};
use crate::stream_io;

/// A bound greeter server.
pub struct ServerEndpoint<G: Greeter> {
    listener: TcpListener,
    acceptor: TlsAcceptor,
    greeter: Arc<G>,
    handshake_timeout: Duration,
}

impl<G: Greeter> ServerEndpoint<G> {
    /// Bind a listener on `addr` serving `greeter` under `policy`.
    pub async fn bind(addr: &str, policy: &ServerPolicy, greeter: G) -> Result<Self> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        let endpoint = Self {
            listener,
            acceptor: TlsAcceptor::from(policy.config()),
            greeter: Arc::new(greeter),
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
        };

        info!(addr = %endpoint.local_addr()?, "greeter endpoint bound");
        Ok(endpoint)
    }

    /// Drop connections that have not completed the TLS handshake within
    /// `timeout` of being accepted.
    pub fn with_handshake_timeout(mut self, timeout: Duration) -> Self {
        self.handshake_timeout = timeout;
        self
    }

    /// Returns the local address this endpoint is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        self.listener.local_addr().map_err(|source| ServerError::Bind {
            addr: "<bound listener>".into(),
            source,
        })
    }

    /// Serve until the process exits.
    pub async fn serve(self) -> Result<()> {
        self.serve_with_shutdown(std::future::pending()).await
    }

    /// Serve until `shutdown` resolves.
    ///
    /// Connections already being served keep running on their own tasks.
    pub async fn serve_with_shutdown<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    info!("greeter endpoint shutting down");
                    return Ok(());
                }
                accepted = self.listener.accept() => {
                    let (tcp, addr) = match accepted {
                        Ok(pair) => pair,
                        Err(e) => {
                            warn!(error = %ServerError::Accept(e), "accept failed");
                            continue;
                        }
                    };

                    let acceptor = self.acceptor.clone();
                    let greeter = Arc::clone(&self.greeter);
                    let handshake_timeout = self.handshake_timeout;
                    tokio::spawn(async move {
                        if let Err(e) =
                            serve_connection(acceptor, greeter, handshake_timeout, tcp, addr).await
                        {
                            warn!(peer = %addr, error = %e, "connection ended with error");
                        }
                    });
                }
            }
        }
    }
}

/// Handshake with one client and answer its calls until it disconnects.
async fn serve_connection<G: Greeter>(
    acceptor: TlsAcceptor,
    greeter: Arc<G>,
    handshake_timeout: Duration,
    tcp: TcpStream,
    addr: SocketAddr,
) -> Result<()> {
    if let Err(e) = tcp.set_nodelay(true) {
        debug!(peer = %addr, error = %e, "could not disable Nagle");
    }

    let mut tls = tokio::time::timeout(handshake_timeout, acceptor.accept(tcp))
        .await
        .map_err(|_| ServerError::HandshakeTimeout(handshake_timeout))?
        .map_err(ServerError::Handshake)?;

    // The session state cannot change after the handshake; snapshot it once.
    let ctx = CallContext::from_tls(addr, tls.get_ref().1);
    if let Ok(info) = ctx.tls_info() {
        info!(
            peer = %addr,
            resumed = info.resumed,
            client = info.peer_subject.as_deref().unwrap_or("<none>"),
            "accepted connection"
        );
    }

    let mut read_buf = BytesMut::new();
    while let Some(call) = stream_io::read_message::<_, CallRequest>(&mut tls, &mut read_buf).await? {
        debug!(peer = %addr, method = %call.method, "call received");
        let response: CallResponse = dispatch(&*greeter, call, &ctx);
        stream_io::write_message(&mut tls, &response).await?;
    }

    debug!(peer = %addr, "connection closed by peer");
    Ok(())
}
