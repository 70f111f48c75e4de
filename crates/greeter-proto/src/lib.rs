//! Greeter wire protocol and TLS policy.
//!
//! Shared layer used by both `greeter-client-core` and `greeter-server-core`:
//!
//! - Certificate loading (CA bundle, leaf certificate, private key)
//! - Client and server TLS policies with session resumption
//! - `helloworld.Greeter` protobuf messages and call envelopes
//! - Length-delimited framing

pub mod codec;
pub mod config;
pub mod credentials;
pub mod error;
pub mod tls;
pub mod wire;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use config::CertPaths;
pub use credentials::{load_credentials, load_identity, LoadedCredentials, LocalIdentity};
pub use error::{ProtoError, Result};
pub use tls::{ClientPolicy, ServerPolicy};
