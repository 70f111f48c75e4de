//! The `helloworld.Greeter` service and call dispatch.

use greeter_proto::config::SAY_HELLO_METHOD;
use greeter_proto::error::status;
use greeter_proto::wire::{CallRequest, CallResponse, HelloReply, HelloRequest};
use tracing::{debug, warn};

use crate::context::CallContext;

/// A failed call: a status code from [`greeter_proto::error::status`] and a
/// description for the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: u32,
    pub detail: String,
}

impl Status {
    pub fn new(code: u32, detail: impl Into<String>) -> Self {
        Self {
            code,
            detail: detail.into(),
        }
    }

    pub fn unauthenticated(detail: impl Into<String>) -> Self {
        Self::new(status::UNAUTHENTICATED, detail)
    }

    pub fn unimplemented(detail: impl Into<String>) -> Self {
        Self::new(status::UNIMPLEMENTED, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(status::INTERNAL, detail)
    }
}

impl From<Status> for CallResponse {
    fn from(s: Status) -> Self {
        CallResponse::error(s.code, s.detail)
    }
}

/// Server-side implementation of `helloworld.Greeter`.
pub trait Greeter: Send + Sync + 'static {
    fn say_hello(&self, request: HelloRequest, ctx: &CallContext) -> Result<HelloReply, Status>;
}

/// Greets the caller and says whether its TLS session was resumed.
#[derive(Debug, Default, Clone, Copy)]
pub struct GreeterService;

impl Greeter for GreeterService {
    fn say_hello(&self, request: HelloRequest, ctx: &CallContext) -> Result<HelloReply, Status> {
        let tls = ctx.tls_info().map_err(|e| {
            warn!(error = %e, "SayHello without TLS session state");
            Status::unauthenticated(e.to_string())
        })?;

        debug!(
            name = %request.name,
            resumed = tls.resumed,
            client = tls.peer_subject.as_deref().unwrap_or("<none>"),
            "SayHello"
        );

        Ok(HelloReply {
            message: greeting(&request.name, tls.resumed),
        })
    }
}

/// `"<name> resumed connection? <true|false>"`
pub fn greeting(name: &str, resumed: bool) -> String {
    format!("{name} resumed connection? {resumed}")
}

/// Route one call to the matching `Greeter` method.
pub fn dispatch<G: Greeter + ?Sized>(greeter: &G, call: CallRequest, ctx: &CallContext) -> CallResponse {
    match call.method.as_str() {
        SAY_HELLO_METHOD => {
            let request: HelloRequest = match call.decode_payload() {
                Ok(request) => request,
                Err(e) => return Status::internal(format!("malformed HelloRequest: {e}")).into(),
            };
            match greeter.say_hello(request, ctx) {
                Ok(reply) => CallResponse::ok(&reply),
                Err(status) => status.into(),
            }
        }
        other => Status::unimplemented(format!("unknown method {other}")).into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AuthInfo, Peer, TlsInfo};

    fn tls_context(resumed: bool) -> CallContext {
        CallContext::new(Peer {
            addr: "127.0.0.1:40000".parse().unwrap(),
            auth: AuthInfo::Tls(TlsInfo {
                resumed,
                protocol_version: None,
                cipher_suite: None,
                peer_subject: None,
            }),
        })
    }

    fn hello(name: &str) -> HelloRequest {
        HelloRequest {
            name: name.to_string(),
        }
    }

    #[test]
    fn greeting_format() {
        assert_eq!(greeting("world", false), "world resumed connection? false");
        assert_eq!(greeting("world", true), "world resumed connection? true");
    }

    #[test]
    fn fresh_session_reports_false() {
        let reply = GreeterService.say_hello(hello("world"), &tls_context(false)).unwrap();
        assert_eq!(reply.message, "world resumed connection? false");
    }

    #[test]
    fn resumed_session_reports_true() {
        let reply = GreeterService.say_hello(hello("world"), &tls_context(true)).unwrap();
        assert_eq!(reply.message, "world resumed connection? true");
    }

    #[test]
    fn empty_name_is_accepted() {
        let reply = GreeterService.say_hello(hello(""), &tls_context(false)).unwrap();
        assert_eq!(reply.message, " resumed connection? false");
    }

    #[test]
    fn missing_peer_fails_the_call() {
        let err = GreeterService
            .say_hello(hello("world"), &CallContext::without_peer())
            .unwrap_err();
        assert_eq!(err.code, status::UNAUTHENTICATED);
    }

    #[test]
    fn dispatch_routes_say_hello() {
        let call = CallRequest::new(SAY_HELLO_METHOD, &hello("world"));
        let resp = dispatch(&GreeterService, call, &tls_context(true));
        assert!(resp.is_ok());
        let reply: HelloReply = resp.decode_payload().unwrap();
        assert_eq!(reply.message, "world resumed connection? true");
    }

    #[test]
    fn dispatch_rejects_unknown_method() {
        let call = CallRequest::new("/helloworld.Greeter/SayGoodbye", &hello("world"));
        let resp = dispatch(&GreeterService, call, &tls_context(false));
        assert_eq!(resp.code, status::UNIMPLEMENTED);
    }

    #[test]
    fn dispatch_rejects_malformed_payload() {
        let call = CallRequest {
            method: SAY_HELLO_METHOD.to_string(),
            payload: vec![0xff, 0xff, 0xff],
        };
        let resp = dispatch(&GreeterService, call, &tls_context(false));
        assert_eq!(resp.code, status::INTERNAL);
    }
}
