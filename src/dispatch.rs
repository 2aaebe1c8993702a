//! Dispatch engine: one request envelope in, one reply out.
//!
//! The [`Dispatcher`] owns the registry and executes a request end to end:
//! decode the envelope, resolve service and method, build the context, run
//! the method's adapter (payload decode, middleware chain, invocation),
//! and encode the response envelope. Every failure along the way still
//! produces a well-formed reply; the transport is never left hanging.
//!
//! The dispatcher holds no cross-request state: `handle` takes `&self`
//! and is safe to call from any number of concurrent tasks. Hosts wrap it
//! in an `Arc` and call it from whatever execution contexts their
//! transport provides.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wirecall::{Dispatcher, Registry};
//!
//! let mut registry = Registry::new();
//! registry.register("Calculator", Calculator::default(), Vec::new())?;
//!
//! let dispatcher = Arc::new(Dispatcher::new(registry));
//! let reply = dispatcher
//!     .handle(br#"{"id":1,"service":"Calculator","method":"Add","data":{"a":2,"b":3}}"#, None)
//!     .await;
//! assert_eq!(reply.status, 200);
//! ```

use bytes::Bytes;

use crate::codec::JsonCodec;
use crate::envelope::{status, ErrorInfo, Request, Response};
use crate::error::CallError;
use crate::handler::{Context, Registry, TransportHandle};

/// Status code and encoded body handed back to the transport.
#[derive(Debug, Clone)]
pub struct Reply {
    /// HTTP-style status code.
    pub status: u16,
    /// Encoded response envelope (or a plain-text message if the envelope
    /// itself could not be encoded).
    pub body: Bytes,
}

/// Executes requests against a registry of services.
pub struct Dispatcher {
    registry: Registry,
}

impl Dispatcher {
    /// Create a dispatcher over a fully-populated registry.
    pub fn new(registry: Registry) -> Self {
        Self { registry }
    }

    /// Borrow the underlying registry (e.g. for introspection).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Execute one request end to end.
    ///
    /// `body` is the raw request envelope; `transport` is the opaque
    /// inbound-request handle made available to middleware and handlers
    /// through [`Context::transport`].
    pub async fn handle(&self, body: &[u8], transport: Option<TransportHandle>) -> Reply {
        let (status, response) = self.run(body, transport).await;

        match JsonCodec::encode(&response) {
            Ok(bytes) => Reply {
                status,
                body: Bytes::from(bytes),
            },
            Err(e) => {
                // Last resort: the envelope itself would not encode, so
                // the reply degrades to plain text.
                tracing::error!("failed to encode response envelope: {}", e);
                Reply {
                    status: status::INTERNAL_SERVER_ERROR,
                    body: Bytes::from(format!("failed to encode response: {}", e)),
                }
            }
        }
    }

    /// The dispatch algorithm proper, short-circuiting at the first
    /// failure but always yielding a status and response envelope.
    async fn run(&self, body: &[u8], transport: Option<TransportHandle>) -> (u16, Response) {
        let request: Request = match JsonCodec::decode(body) {
            Ok(request) => request,
            Err(e) => {
                tracing::warn!("failed to decode request envelope: {}", e);
                return (
                    status::BAD_REQUEST,
                    // The id is unknown when the envelope never decoded.
                    Response::failure(0, ErrorInfo::new(status::BAD_REQUEST, e.to_string())),
                );
            }
        };
        let Request {
            id,
            service: service_name,
            method: method_name,
            data,
        } = request;

        let service = match self.registry.service(&service_name) {
            Some(service) => service,
            None => {
                return (
                    status::BAD_REQUEST,
                    Response::failure(
                        id,
                        ErrorInfo::new(
                            status::BAD_REQUEST,
                            format!("invalid service '{}'", service_name),
                        ),
                    ),
                );
            }
        };

        let method = match service.method(&method_name) {
            Some(method) => method,
            None => {
                return (
                    status::BAD_REQUEST,
                    Response::failure(
                        id,
                        ErrorInfo::new(
                            status::BAD_REQUEST,
                            format!(
                                "invalid method '{}' on service '{}'",
                                method_name, service_name
                            ),
                        ),
                    ),
                );
            }
        };

        let ctx = match transport {
            Some(transport) => Context::with_transport(transport),
            None => Context::new(),
        };

        match method.call(ctx, data, service.middleware()).await {
            Ok(value) => (status::OK, Response::success(id, value)),
            Err(CallError::Decode(e)) => (
                status::INTERNAL_SERVER_ERROR,
                Response::failure(
                    id,
                    ErrorInfo::new(
                        status::INTERNAL_SERVER_ERROR,
                        format!(
                            "error decoding request for method '{}' on service '{}': {}",
                            method_name, service_name, e
                        ),
                    ),
                ),
            ),
            Err(CallError::Middleware(e)) => (
                status::INTERNAL_SERVER_ERROR,
                Response::failure(
                    id,
                    ErrorInfo::new(status::INTERNAL_SERVER_ERROR, e.to_string()),
                ),
            ),
            // A handler-level error is classified as a request problem at
            // the protocol layer but carries an internal-error body.
            Err(CallError::Handler(e)) => (
                status::BAD_REQUEST,
                Response::failure(
                    id,
                    ErrorInfo::new(status::INTERNAL_SERVER_ERROR, e.to_string()),
                ),
            ),
            Err(CallError::Encode(e)) => (
                status::INTERNAL_SERVER_ERROR,
                Response::failure(
                    id,
                    ErrorInfo::new(status::INTERNAL_SERVER_ERROR, e.to_string()),
                ),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::{Handler, MethodResult, MethodSet};
    use serde::{Deserialize, Serialize};
    use std::sync::Arc;

    #[derive(Deserialize)]
    struct EchoRequest {
        text: String,
    }

    #[derive(Serialize)]
    struct EchoResponse {
        echo: String,
    }

    struct EchoService;

    impl EchoService {
        async fn echo(self: Arc<Self>, _ctx: Context, req: EchoRequest) -> MethodResult<EchoResponse> {
            Ok(EchoResponse { echo: req.text })
        }
    }

    impl Handler for EchoService {
        fn methods(methods: &mut MethodSet<Self>) {
            methods.expose("Echo", EchoService::echo);
        }
    }

    fn dispatcher() -> Dispatcher {
        let mut registry = Registry::new();
        registry
            .register("Echo", EchoService, Vec::new())
            .unwrap();
        Dispatcher::new(registry)
    }

    fn decode_reply(reply: &Reply) -> Response {
        serde_json::from_slice(&reply.body).unwrap()
    }

    #[tokio::test]
    async fn test_success_reply() {
        let reply = dispatcher()
            .handle(
                br#"{"id":9,"service":"Echo","method":"Echo","data":{"text":"hi"}}"#,
                None,
            )
            .await;

        assert_eq!(reply.status, status::OK);
        let response = decode_reply(&reply);
        assert_eq!(response.id, 9);
        assert_eq!(response.data, Some(serde_json::json!({"echo": "hi"})));
        assert!(response.error.is_none());
    }

    #[tokio::test]
    async fn test_malformed_envelope_is_bad_request() {
        let reply = dispatcher().handle(b"{not json", None).await;

        assert_eq!(reply.status, status::BAD_REQUEST);
        let response = decode_reply(&reply);
        assert_eq!(response.id, 0);
        assert_eq!(response.error.unwrap().code, status::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_service_names_service() {
        let reply = dispatcher()
            .handle(
                br#"{"id":1,"service":"Ghost","method":"Echo","data":{}}"#,
                None,
            )
            .await;

        assert_eq!(reply.status, status::BAD_REQUEST);
        let error = decode_reply(&reply).error.unwrap();
        assert_eq!(error.info, "invalid service 'Ghost'");
    }

    #[tokio::test]
    async fn test_unknown_method_names_both() {
        let reply = dispatcher()
            .handle(
                br#"{"id":1,"service":"Echo","method":"Shout","data":{}}"#,
                None,
            )
            .await;

        assert_eq!(reply.status, status::BAD_REQUEST);
        let error = decode_reply(&reply).error.unwrap();
        assert_eq!(error.info, "invalid method 'Shout' on service 'Echo'");
    }

    #[tokio::test]
    async fn test_transport_handle_reaches_handler() {
        struct FakeRequest {
            header: String,
        }

        struct Inspect;

        impl Inspect {
            async fn peek(self: Arc<Self>, ctx: Context, _req: ()) -> MethodResult<String> {
                let request = ctx
                    .transport::<FakeRequest>()
                    .ok_or("transport handle missing")?;
                Ok(request.header.clone())
            }
        }

        impl Handler for Inspect {
            fn methods(methods: &mut MethodSet<Self>) {
                methods.expose("Peek", Inspect::peek);
            }
        }

        let mut registry = Registry::new();
        registry.register("Inspect", Inspect, Vec::new()).unwrap();
        let dispatcher = Dispatcher::new(registry);

        let handle: TransportHandle = Arc::new(FakeRequest {
            header: "x-trace: 1".to_string(),
        });
        let reply = dispatcher
            .handle(
                br#"{"id":3,"service":"Inspect","method":"Peek","data":null}"#,
                Some(handle),
            )
            .await;

        assert_eq!(reply.status, status::OK);
        let response = decode_reply(&reply);
        assert_eq!(response.data, Some(serde_json::json!("x-trace: 1")));
    }
}
