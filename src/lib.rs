//! # wirecall
//!
//! JSON-over-HTTP RPC dispatch: callers register handler objects under a
//! service name, and a single entry point routes `{id, service, method,
//! data}` envelopes to the right method, decodes the typed payload, runs a
//! per-service middleware chain, and returns a `{id, data, error}`
//! envelope with an HTTP-style status code.
//!
//! ## Architecture
//!
//! - **Registry** - name-keyed table of services, each a validated method
//!   table built at registration time from typed adapter closures
//! - **Dispatcher** - decodes the envelope, resolves the method, runs
//!   middleware, invokes the handler, encodes the reply
//! - **Context** - per-invocation scratch space shared by middleware and
//!   handlers
//!
//! The HTTP transport itself stays outside this crate: a host feeds raw
//! request bytes in and writes the returned status code and body out.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wirecall::{Context, Dispatcher, Handler, MethodResult, MethodSet, Registry};
//!
//! struct Calculator;
//!
//! impl Calculator {
//!     async fn add(self: Arc<Self>, _ctx: Context, req: AddRequest) -> MethodResult<AddResponse> {
//!         Ok(AddResponse { result: req.a + req.b })
//!     }
//! }
//!
//! impl Handler for Calculator {
//!     fn methods(methods: &mut MethodSet<Self>) {
//!         methods.expose("Add", Calculator::add);
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register("Calculator", Calculator, Vec::new())?;
//!
//! let dispatcher = Arc::new(Dispatcher::new(registry));
//! // handle() per inbound HTTP request:
//! let reply = dispatcher.handle(&body, None).await;
//! ```

pub mod codec;
pub mod envelope;
pub mod error;
pub mod handler;

mod dispatch;

pub use dispatch::{Dispatcher, Reply};
pub use envelope::{ErrorInfo, Request, Response};
pub use error::{BoxError, RegistrationError};
pub use handler::{
    Context, Handler, MethodResult, MethodSet, Middleware, Registry, TransportHandle,
};
