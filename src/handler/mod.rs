//! Handler module - services, method tables, and per-request context.
//!
//! Provides:
//! - [`Registry`] - owns the name-keyed service table
//! - [`Handler`] / [`MethodSet`] - how a handler type declares its
//!   dispatchable methods
//! - [`Context`] - per-invocation scratch space for middleware and handlers
//!
//! # Example
//!
//! ```ignore
//! use wirecall::{Handler, MethodSet, Registry};
//!
//! impl Handler for Calculator {
//!     fn methods(methods: &mut MethodSet<Self>) {
//!         methods.expose("Add", Calculator::add);
//!         methods.expose("Sub", Calculator::sub);
//!     }
//! }
//!
//! let mut registry = Registry::new();
//! registry.register("Calculator", Calculator::default(), Vec::new())?;
//! ```

mod context;
mod registry;
mod service;

pub use context::{Context, TransportHandle};
pub use registry::{MethodInfo, Registry, ServiceInfo};
pub use service::{
    BoxFuture, Handler, MethodDescriptor, MethodResult, MethodSet, Middleware, Service,
};
