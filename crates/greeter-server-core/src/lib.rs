//! Greeter server-side transport core.
//!
//! - TCP listener with server-side TLS (client certificate verified if
//!   given, stateless session tickets)
//! - Per-call [`CallContext`] exposing the caller's TLS session state
//! - The `helloworld.Greeter` service, reporting session resumption

pub mod context;
pub mod endpoint;
pub mod error;
pub mod service;
pub mod stream_io;

pub use context::{AuthInfo, AuthStateError, CallContext, Peer, TlsInfo};
pub use endpoint::ServerEndpoint;
pub use error::ServerError;
pub use service::{Greeter, GreeterService, Status};
