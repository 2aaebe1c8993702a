//! Error types for wirecall.

use thiserror::Error;

/// Boxed error type returned by handlers and middleware.
///
/// Anything implementing `std::error::Error` converts into this via `?`,
/// so handlers can propagate their own error types freely. The dispatcher
/// only ever stringifies it into the response envelope.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Error returned by [`Registry::register`](crate::Registry::register).
///
/// Registration errors are local and synchronous: they never cross the
/// wire and never disturb services that were already installed.
#[derive(Debug, Error)]
pub enum RegistrationError {
    /// A service with this name is already installed.
    #[error("service already registered: '{0}'")]
    DuplicateService(String),

    /// The handler exposed no dispatchable methods.
    #[error("handler for service '{0}' exposes no dispatchable methods")]
    NoSuitableMethods(String),
}

/// Classification of a failed method call, produced by the adapter
/// closure and mapped to a status code and error body by the dispatcher.
#[derive(Debug)]
pub(crate) enum CallError {
    /// The request payload did not match the method's declared input type.
    Decode(serde_json::Error),
    /// A middleware step rejected the request before invocation.
    Middleware(BoxError),
    /// The handler itself returned an error.
    Handler(BoxError),
    /// The handler's response could not be converted to a JSON value.
    Encode(serde_json::Error),
}
