//! Services, method tables, and the method contract.
//!
//! A handler type declares its dispatchable methods through a
//! [`MethodSet`], the capability set handed to [`Handler::methods`] at
//! registration time. Each exposed method is wrapped into a uniform
//! adapter closure that knows its own concrete request and response types,
//! so the dispatch hot path never inspects types at all.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use wirecall::{Context, Handler, MethodResult, MethodSet};
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
//! ```

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::value::RawValue;
use serde_json::Value;

use super::Context;
use crate::codec::JsonCodec;
use crate::error::{BoxError, CallError};

/// Boxed future for handler results.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result type returned by handler methods.
pub type MethodResult<T> = std::result::Result<T, BoxError>;

/// Pre-invocation hook attached to a service.
///
/// Middleware runs in registration order against the request context; the
/// first step that returns an error aborts the dispatch before the handler
/// is invoked.
pub type Middleware = Box<dyn Fn(&mut Context) -> Result<(), BoxError> + Send + Sync>;

/// Uniform erased adapter for one method: decodes the raw payload, runs
/// the middleware chain, invokes the handler, converts the response to a
/// JSON value.
type InvokeFn = Box<
    dyn Fn(Context, Box<RawValue>, &[Middleware]) -> BoxFuture<'static, Result<Value, CallError>>
        + Send
        + Sync,
>;

/// Trait for handler types that can be registered as a service.
///
/// The implementation declares which methods are dispatchable; everything
/// else on the type stays invisible to the registry.
pub trait Handler: Send + Sync + Sized + 'static {
    /// Declare the dispatchable methods of this handler type.
    fn methods(methods: &mut MethodSet<Self>);
}

/// Describes one dispatchable method.
///
/// Immutable once built. The adapter closure captures the receiver and
/// both concrete payload types; name and type identities are kept for
/// lookup and introspection.
pub struct MethodDescriptor {
    /// Method name within the service.
    name: String,
    /// Type identity of the declared request payload.
    request_type: &'static str,
    /// Type identity of the declared response payload.
    response_type: &'static str,
    /// The uniform adapter.
    invoke: InvokeFn,
}

impl MethodDescriptor {
    /// Method name within the service.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Type name of the declared request payload.
    pub fn request_type(&self) -> &'static str {
        self.request_type
    }

    /// Type name of the declared response payload.
    pub fn response_type(&self) -> &'static str {
        self.response_type
    }

    /// Run the adapter: payload decode, middleware chain, invocation,
    /// response-to-value conversion.
    pub(crate) fn call(
        &self,
        ctx: Context,
        data: Box<RawValue>,
        middleware: &[Middleware],
    ) -> BoxFuture<'static, Result<Value, CallError>> {
        (self.invoke)(ctx, data, middleware)
    }
}

impl std::fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("request_type", &self.request_type)
            .field("response_type", &self.response_type)
            .finish()
    }
}

/// Capability set through which a handler type exposes its methods.
///
/// Built once per registration; entries that violate the method contract
/// are skipped with a warning rather than failing registration, so a
/// handler type can carry helpers unrelated to RPC.
pub struct MethodSet<S> {
    /// Receiver instance, cloned into each adapter closure.
    receiver: Arc<S>,
    /// Validated method table.
    table: HashMap<String, MethodDescriptor>,
}

impl<S: Send + Sync + 'static> MethodSet<S> {
    pub(crate) fn new(receiver: Arc<S>) -> Self {
        Self {
            receiver,
            table: HashMap::new(),
        }
    }

    /// Expose one method for dispatch.
    ///
    /// The signature contract is carried by the bounds: the method takes
    /// the receiver, a [`Context`], and one deserializable payload, and
    /// resolves to one serializable response or an error. On top of that,
    /// the name must be dispatchable:
    ///
    /// - empty names are skipped;
    /// - names starting with `_` denote internal helpers and are skipped;
    /// - a name already exposed on this set is skipped (first wins).
    ///
    /// Violations are logged and the entry is silently excluded; they
    /// never fail the registration as a whole.
    pub fn expose<Req, Resp, F, Fut>(&mut self, name: &str, method: F) -> &mut Self
    where
        Req: DeserializeOwned + Send + 'static,
        Resp: Serialize + Send + 'static,
        F: Fn(Arc<S>, Context, Req) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = MethodResult<Resp>> + Send + 'static,
    {
        if !is_dispatchable_name(name) {
            tracing::warn!(method = name, "skipping method: name is not dispatchable");
            return self;
        }
        if self.table.contains_key(name) {
            tracing::warn!(method = name, "skipping method: name already exposed");
            return self;
        }

        let receiver = Arc::clone(&self.receiver);
        let invoke: InvokeFn = Box::new(
            move |mut ctx: Context, data: Box<RawValue>, middleware: &[Middleware]| {
                // Decode the deferred payload into the declared request type.
                let request: Req = match JsonCodec::decode_str(data.get()) {
                    Ok(request) => request,
                    Err(e) => return Box::pin(async move { Err(CallError::Decode(e)) }),
                };

                // Middleware chain, first failure short-circuits.
                for step in middleware {
                    if let Err(e) = step(&mut ctx) {
                        return Box::pin(async move { Err(CallError::Middleware(e)) });
                    }
                }

                let fut = method(Arc::clone(&receiver), ctx, request);
                Box::pin(async move {
                    let response = fut.await.map_err(CallError::Handler)?;
                    serde_json::to_value(response).map_err(CallError::Encode)
                })
            },
        );

        self.table.insert(
            name.to_string(),
            MethodDescriptor {
                name: name.to_string(),
                request_type: std::any::type_name::<Req>(),
                response_type: std::any::type_name::<Resp>(),
                invoke,
            },
        );
        self
    }

    /// Number of methods that passed the contract.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether no method passed the contract.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub(crate) fn into_table(self) -> HashMap<String, MethodDescriptor> {
        self.table
    }
}

/// A named, registered bundle of one handler's validated method table and
/// its middleware chain. Immutable after registration.
pub struct Service {
    name: String,
    methods: HashMap<String, MethodDescriptor>,
    middleware: Vec<Middleware>,
}

impl Service {
    pub(crate) fn new(
        name: String,
        methods: HashMap<String, MethodDescriptor>,
        middleware: Vec<Middleware>,
    ) -> Self {
        Self {
            name,
            methods,
            middleware,
        }
    }

    /// Service name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Look up a method by name.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        self.methods.get(name)
    }

    /// Iterate over the method table in no particular order.
    pub fn methods(&self) -> impl Iterator<Item = &MethodDescriptor> {
        self.methods.values()
    }

    /// The middleware chain, in registration order.
    pub(crate) fn middleware(&self) -> &[Middleware] {
        &self.middleware
    }
}

/// Whether a method name is eligible for dispatch.
fn is_dispatchable_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Deserialize)]
    struct AddRequest {
        a: i64,
        b: i64,
    }

    #[derive(Serialize)]
    struct AddResponse {
        result: i64,
    }

    struct Adder {
        calls: AtomicUsize,
    }

    impl Adder {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
            }
        }

        async fn add(self: Arc<Self>, _ctx: Context, req: AddRequest) -> MethodResult<AddResponse> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(AddResponse {
                result: req.a + req.b,
            })
        }
    }

    fn raw(json: &str) -> Box<RawValue> {
        RawValue::from_string(json.to_string()).unwrap()
    }

    #[test]
    fn test_expose_builds_descriptor() {
        let mut set = MethodSet::new(Arc::new(Adder::new()));
        set.expose("Add", Adder::add);

        assert_eq!(set.len(), 1);
        let table = set.into_table();
        let descriptor = table.get("Add").unwrap();

        assert_eq!(descriptor.name(), "Add");
        assert!(descriptor.request_type().ends_with("AddRequest"));
        assert!(descriptor.response_type().ends_with("AddResponse"));
    }

    #[test]
    fn test_unsuitable_names_are_excluded() {
        let mut set = MethodSet::new(Arc::new(Adder::new()));
        set.expose("", Adder::add);
        set.expose("_internal", Adder::add);
        set.expose("Add", Adder::add);

        assert_eq!(set.len(), 1);
        assert!(set.into_table().contains_key("Add"));
    }

    #[test]
    fn test_duplicate_name_keeps_first() {
        let mut set = MethodSet::new(Arc::new(Adder::new()));
        set.expose("Add", |_recv: Arc<Adder>, _ctx, _req: AddRequest| async {
            Ok(AddResponse { result: 1 })
        });
        set.expose("Add", |_recv: Arc<Adder>, _ctx, _req: AddRequest| async {
            Ok(AddResponse { result: 2 })
        });

        assert_eq!(set.len(), 1);
    }

    #[tokio::test]
    async fn test_descriptor_call_invokes_handler() {
        let mut set = MethodSet::new(Arc::new(Adder::new()));
        set.expose("Add", Adder::add);
        let table = set.into_table();
        let descriptor = table.get("Add").unwrap();

        let value = descriptor
            .call(Context::new(), raw(r#"{"a":2,"b":3}"#), &[])
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!({"result": 5}));
    }

    #[tokio::test]
    async fn test_descriptor_call_decode_failure() {
        let adder = Arc::new(Adder::new());
        let mut set = MethodSet::new(Arc::clone(&adder));
        set.expose("Add", Adder::add);
        let table = set.into_table();
        let descriptor = table.get("Add").unwrap();

        let result = descriptor
            .call(Context::new(), raw(r#"{"a":"two"}"#), &[])
            .await;

        assert!(matches!(result, Err(CallError::Decode(_))));
        // Handler never ran.
        assert_eq!(adder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_middleware_short_circuits_before_handler() {
        let adder = Arc::new(Adder::new());
        let mut set = MethodSet::new(Arc::clone(&adder));
        set.expose("Add", Adder::add);
        let table = set.into_table();
        let descriptor = table.get("Add").unwrap();

        let middleware: Vec<Middleware> = vec![
            Box::new(|_ctx: &mut Context| Err("auth required".into())),
            Box::new(|_ctx: &mut Context| panic!("second middleware must not run")),
        ];

        let result = descriptor
            .call(Context::new(), raw(r#"{"a":2,"b":3}"#), &middleware)
            .await;

        match result {
            Err(CallError::Middleware(e)) => assert_eq!(e.to_string(), "auth required"),
            other => panic!("expected middleware error, got {:?}", other.map(|_| ())),
        }
        assert_eq!(adder.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_middleware_runs_in_order_and_feeds_context() {
        struct Echo;

        let mut set = MethodSet::new(Arc::new(Echo));
        set.expose("Whoami", |_recv: Arc<Echo>, ctx: Context, _req: ()| async move {
            let user = ctx
                .get::<String>("user")
                .cloned()
                .ok_or("no user in context")?;
            Ok(user)
        });
        let table = set.into_table();
        let descriptor = table.get("Whoami").unwrap();

        let middleware: Vec<Middleware> = vec![
            Box::new(|ctx: &mut Context| {
                ctx.set("user", "alice".to_string());
                Ok(())
            }),
            Box::new(|ctx: &mut Context| {
                // Later middleware sees what earlier middleware stored.
                assert!(ctx.exists("user"));
                Ok(())
            }),
        ];

        let value = descriptor
            .call(Context::new(), raw("null"), &middleware)
            .await
            .unwrap();

        assert_eq!(value, serde_json::json!("alice"));
    }

    #[tokio::test]
    async fn test_handler_error_is_classified() {
        struct Failing;

        let mut set = MethodSet::new(Arc::new(Failing));
        set.expose("Fail", |_recv: Arc<Failing>, _ctx, _req: ()| async {
            Err::<(), BoxError>("handler exploded".into())
        });
        let table = set.into_table();
        let descriptor = table.get("Fail").unwrap();

        let result = descriptor.call(Context::new(), raw("null"), &[]).await;

        match result {
            Err(CallError::Handler(e)) => assert_eq!(e.to_string(), "handler exploded"),
            other => panic!("expected handler error, got {:?}", other.map(|_| ())),
        }
    }
}
