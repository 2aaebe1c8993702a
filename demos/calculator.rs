//! Calculator service - end-to-end dispatch example.
//!
//! This example demonstrates:
//! - Declaring a handler type's dispatchable methods
//! - Registering it with a middleware chain
//! - Feeding request envelopes through the dispatcher
//!
//! A real host would wrap the dispatcher in its HTTP server and pass each
//! request body through `handle`; here the "transport" is a list of
//! hand-written envelopes.
//!
//! Run with: `cargo run --example calculator`

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use wirecall::{Context, Dispatcher, Handler, MethodResult, MethodSet, Middleware, Registry};

/// Input structure for the binary arithmetic methods.
#[derive(Deserialize)]
struct BinaryOp {
    a: i64,
    b: i64,
}

/// Output structure for the binary arithmetic methods.
#[derive(Serialize)]
struct OpResult {
    result: i64,
}

struct Calculator;

impl Calculator {
    async fn add(self: Arc<Self>, _ctx: Context, req: BinaryOp) -> MethodResult<OpResult> {
        Ok(OpResult {
            result: req.a + req.b,
        })
    }

    async fn div(self: Arc<Self>, _ctx: Context, req: BinaryOp) -> MethodResult<OpResult> {
        if req.b == 0 {
            return Err("division by zero".into());
        }
        Ok(OpResult {
            result: req.a / req.b,
        })
    }
}

impl Handler for Calculator {
    fn methods(methods: &mut MethodSet<Self>) {
        methods.expose("Add", Calculator::add);
        methods.expose("Div", Calculator::div);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    // Middleware sees every request before the handler does.
    let announce: Middleware = Box::new(|ctx: &mut Context| {
        ctx.set("seen", true);
        tracing::info!("request admitted");
        Ok(())
    });

    let mut registry = Registry::new();
    registry.register("Calculator", Calculator, vec![announce])?;

    for service in registry.describe() {
        for method in &service.methods {
            tracing::info!(
                "registered {}.{}({}) -> {}",
                service.name,
                method.name,
                method.request_type,
                method.response_type
            );
        }
    }

    let dispatcher = Arc::new(Dispatcher::new(registry));

    let envelopes = [
        r#"{"id":1,"service":"Calculator","method":"Add","data":{"a":2,"b":3}}"#,
        r#"{"id":2,"service":"Calculator","method":"Div","data":{"a":10,"b":2}}"#,
        r#"{"id":3,"service":"Calculator","method":"Div","data":{"a":1,"b":0}}"#,
        r#"{"id":4,"service":"Calculator","method":"Mul","data":{"a":2,"b":3}}"#,
    ];

    for envelope in envelopes {
        let reply = dispatcher.handle(envelope.as_bytes(), None).await;
        println!("{} {}", reply.status, String::from_utf8_lossy(&reply.body));
    }

    Ok(())
}
