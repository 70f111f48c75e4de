//! Greeter client-side transport core.
//!
//! - TLS dialing with the client policy (server name check, client
//!   certificate, shared session cache)
//! - `SayHello` invocation under a per-call deadline

pub mod connection;
pub mod endpoint;
pub mod error;
pub mod stream_io;

pub use connection::GreeterConnection;
pub use endpoint::ClientEndpoint;
pub use error::ClientError;
