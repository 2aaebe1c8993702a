//! Per-invocation request context.
//!
//! A [`Context`] is created fresh for every dispatch, passed mutably
//! through the service's middleware chain, then moved into the handler.
//! It is the only channel middleware and handlers share: middleware
//! stashes values (an authenticated user, a deadline, a trace id) and the
//! handler reads them back by type.
//!
//! # Example
//!
//! ```
//! use wirecall::Context;
//!
//! let mut ctx = Context::new();
//! ctx.set("user", "alice".to_string());
//!
//! assert!(ctx.exists("user"));
//! assert_eq!(ctx.get::<String>("user").map(String::as_str), Some("alice"));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// Opaque handle to the inbound transport request.
///
/// The core never looks inside it; the host stores whatever its transport
/// produced (header map, connection info, the full request parts) and
/// middleware retrieves it back with [`Context::transport`].
pub type TransportHandle = Arc<dyn Any + Send + Sync>;

/// Mutable per-invocation scratch space passed to middleware and handlers.
///
/// Never shared across invocations; the dispatcher creates one per request
/// and discards it when the response is built.
pub struct Context {
    /// The inbound transport request, if the host supplied one.
    transport: Option<TransportHandle>,
    /// Typed key-value store.
    store: HashMap<String, Box<dyn Any + Send + Sync>>,
}

impl Context {
    /// Create an empty context with no transport request attached.
    pub fn new() -> Self {
        Self {
            transport: None,
            store: HashMap::new(),
        }
    }

    /// Create a context wrapping the inbound transport request.
    pub fn with_transport(transport: TransportHandle) -> Self {
        Self {
            transport: Some(transport),
            store: HashMap::new(),
        }
    }

    /// Borrow the transport request, downcast to its concrete type.
    ///
    /// Returns `None` if no transport handle was attached or the type
    /// does not match.
    pub fn transport<T: Any + Send + Sync>(&self) -> Option<&T> {
        self.transport.as_deref().and_then(|t| t.downcast_ref())
    }

    /// Store a value under a key, replacing any previous value.
    pub fn set<T: Any + Send + Sync>(&mut self, key: impl Into<String>, value: T) {
        self.store.insert(key.into(), Box::new(value));
    }

    /// Borrow the value stored under a key, downcast to `T`.
    ///
    /// Returns `None` if the key is absent or holds a different type.
    pub fn get<T: Any>(&self, key: &str) -> Option<&T> {
        self.store.get(key).and_then(|v| v.downcast_ref())
    }

    /// Whether any value is stored under the key.
    pub fn exists(&self, key: &str) -> bool {
        self.store.contains_key(key)
    }
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}
