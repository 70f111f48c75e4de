//! Protobuf messages exchanged between client and server.
//!
//! `HelloRequest`/`HelloReply` are the `helloworld.Greeter` schema. They
//! travel inside a `CallRequest`/`CallResponse` envelope that names the
//! method and carries the call status, one envelope per direction per call.

use prost::Message;

use crate::error::{status, Result};

/// `helloworld.HelloRequest`
#[derive(Clone, PartialEq, Message)]
pub struct HelloRequest {
    #[prost(string, tag = "1")]
    pub name: String,
}

/// `helloworld.HelloReply`
#[derive(Clone, PartialEq, Message)]
pub struct HelloReply {
    #[prost(string, tag = "1")]
    pub message: String,
}

/// Client → server: one unary call.
#[derive(Clone, PartialEq, Message)]
pub struct CallRequest {
    /// Full method path, e.g. `/helloworld.Greeter/SayHello`.
    #[prost(string, tag = "1")]
    pub method: String,
    /// Encoded request message.
    #[prost(bytes = "vec", tag = "2")]
    pub payload: Vec<u8>,
}

/// Server → client: the outcome of one call.
#[derive(Clone, PartialEq, Message)]
pub struct CallResponse {
    /// A code from [`crate::error::status`].
    #[prost(uint32, tag = "1")]
    pub code: u32,
    /// Failure description; empty on success.
    #[prost(string, tag = "2")]
    pub detail: String,
    /// Encoded reply message; empty on failure.
    #[prost(bytes = "vec", tag = "3")]
    pub payload: Vec<u8>,
}

impl CallRequest {
    pub fn new<M: Message>(method: &str, request: &M) -> Self {
        Self {
            method: method.to_string(),
            payload: request.encode_to_vec(),
        }
    }

    /// Decode the payload as the request type of the named method.
    pub fn decode_payload<M: Message + Default>(&self) -> Result<M> {
        Ok(M::decode(self.payload.as_slice())?)
    }
}

impl CallResponse {
    pub fn ok<M: Message>(reply: &M) -> Self {
        Self {
            code: status::OK,
            detail: String::new(),
            payload: reply.encode_to_vec(),
        }
    }

    pub fn error(code: u32, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
            payload: Vec::new(),
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == status::OK
    }

    /// Decode the payload as the reply type of the called method.
    pub fn decode_payload<M: Message + Default>(&self) -> Result<M> {
        Ok(M::decode(self.payload.as_slice())?)
    }
}
