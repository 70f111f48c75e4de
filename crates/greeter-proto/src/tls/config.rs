//! TLS policy builders for the greeter server and client.
//!
//! Both builders:
//! - use the ring crypto provider
//! - verify the peer chain against the loaded CA bundle (webpki)
//! - advertise the `greeter` ALPN identifier
//!
//! They differ in what they do about the peer and about resumption:
//!
//! - the **client** verifies the server against a logical server name and
//!   caches sessions in an [`LruSessionStore`] shared by every connection
//!   made with the same [`ClientPolicy`]
//! - the **server** asks for a client certificate but accepts clients that
//!   present none ("verify if given"), and seals session tickets with a
//!   [`StaticTicketer`] instead of keeping server-side session state

use std::num::NonZeroUsize;
use std::sync::Arc;

use rustls::client::Resumption;
use rustls::crypto::CryptoProvider;
use rustls::server::{NoServerSessionStorage, WebPkiClientVerifier};
use rustls::RootCertStore;
use rustls_pki_types::ServerName;

use crate::credentials::{LoadedCredentials, LocalIdentity};
use crate::error::{ProtoError, Result};
use crate::tls::session_cache::LruSessionStore;
use crate::tls::ticketer::{StaticTicketer, TICKET_KEY_LEN};

/// ALPN protocol identifier spoken by the greeter.
pub const ALPN_GREETER: &[u8] = b"greeter";

fn ring_provider() -> Arc<CryptoProvider> {
    Arc::new(rustls::crypto::ring::default_provider())
}

/// Immutable client-side TLS policy.
///
/// Cloning is cheap; clones share the same session cache, so connections
/// made through any clone can resume each other's sessions.
#[derive(Clone, Debug)]
pub struct ClientPolicy {
    config: Arc<rustls::ClientConfig>,
    server_name: ServerName<'static>,
    sessions: Arc<LruSessionStore>,
}

impl ClientPolicy {
    /// The rustls config to hand to a connector.
    pub fn config(&self) -> Arc<rustls::ClientConfig> {
        Arc::clone(&self.config)
    }

    /// The name the server certificate is verified against.
    pub fn server_name(&self) -> &ServerName<'static> {
        &self.server_name
    }

    /// The session cache shared by connections made with this policy.
    pub fn session_store(&self) -> &LruSessionStore {
        &self.sessions
    }
}

/// Immutable server-side TLS policy.
#[derive(Clone, Debug)]
pub struct ServerPolicy {
    config: Arc<rustls::ServerConfig>,
}

impl ServerPolicy {
    /// The rustls config to hand to an acceptor.
    pub fn config(&self) -> Arc<rustls::ServerConfig> {
        Arc::clone(&self.config)
    }
}

/// Build the client policy.
///
/// `server_name` is the identity expected in the server certificate; it
/// need not match the host that is dialled. `cache_capacity` bounds the
/// number of servers whose sessions are remembered.
pub fn build_client_tls_config(
    creds: &LoadedCredentials,
    server_name: &str,
    cache_capacity: usize,
) -> Result<ClientPolicy> {
    client_policy(&creds.trust_store, Some(&creds.identity), server_name, cache_capacity)
}

/// Build a client policy that verifies the server but presents no
/// certificate of its own.
pub fn build_anonymous_client_tls_config(
    trust_store: &Arc<RootCertStore>,
    server_name: &str,
    cache_capacity: usize,
) -> Result<ClientPolicy> {
    client_policy(trust_store, None, server_name, cache_capacity)
}

fn client_policy(
    trust_store: &Arc<RootCertStore>,
    identity: Option<&LocalIdentity>,
    server_name: &str,
    cache_capacity: usize,
) -> Result<ClientPolicy> {
    let server_name = ServerName::try_from(server_name.to_string())
        .map_err(|_| ProtoError::InvalidServerName(server_name.to_string()))?;

    let capacity = NonZeroUsize::new(cache_capacity).ok_or_else(|| {
        ProtoError::TlsConfiguration("session cache capacity must be non-zero".into())
    })?;
    let sessions = Arc::new(LruSessionStore::new(capacity));

    let builder = rustls::ClientConfig::builder_with_provider(ring_provider())
        .with_safe_default_protocol_versions()
        .map_err(|e| ProtoError::TlsConfiguration(format!("TLS version config: {e}")))?
        .with_root_certificates(Arc::clone(trust_store));

    let mut config = match identity {
        Some(identity) => builder
            .with_client_auth_cert(identity.chain().to_vec(), identity.key().clone_key())
            .map_err(|e| ProtoError::TlsConfiguration(format!("client cert config: {e}")))?,
        None => builder.with_no_client_auth(),
    };

    config.resumption = Resumption::store(sessions.clone());
    config.alpn_protocols = vec![ALPN_GREETER.to_vec()];

    Ok(ClientPolicy {
        config: Arc::new(config),
        server_name,
        sessions,
    })
}

/// Build the server policy.
///
/// `ticket_key` seals every session ticket the server issues. Servers that
/// share the key can resume each other's sessions.
pub fn build_server_tls_config(
    creds: &LoadedCredentials,
    ticket_key: &[u8; TICKET_KEY_LEN],
) -> Result<ServerPolicy> {
    let provider = ring_provider();

    let verifier =
        WebPkiClientVerifier::builder_with_provider(Arc::clone(&creds.trust_store), provider.clone())
            .allow_unauthenticated()
            .build()
            .map_err(|e| ProtoError::TlsConfiguration(format!("client verifier: {e}")))?;

    let identity = &creds.identity;
    let mut config = rustls::ServerConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| ProtoError::TlsConfiguration(format!("TLS version config: {e}")))?
        .with_client_cert_verifier(verifier)
        .with_single_cert(identity.chain().to_vec(), identity.key().clone_key())
        .map_err(|e| ProtoError::TlsConfiguration(format!("server cert config: {e}")))?;

    config.ticketer = Arc::new(StaticTicketer::new(ticket_key)?);
    config.session_storage = Arc::new(NoServerSessionStorage {});
    config.alpn_protocols = vec![ALPN_GREETER.to_vec()];

    Ok(ServerPolicy {
        config: Arc::new(config),
    })
}
