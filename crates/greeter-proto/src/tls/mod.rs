//! TLS policy for the greeter.
//!
//! - Client and server `rustls` config builders
//! - LRU client session cache
//! - Static-key session ticketer
//! - X.509 field extraction for peer certificates

pub mod cert_extract;
pub mod config;
pub mod session_cache;
pub mod ticketer;

pub use config::{
    build_anonymous_client_tls_config, build_client_tls_config, build_server_tls_config,
    ClientPolicy, ServerPolicy,
};
pub use session_cache::LruSessionStore;
pub use ticketer::StaticTicketer;
