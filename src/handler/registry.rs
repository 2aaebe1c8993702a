//! Service registry: owns the lifecycle of registered services.
//!
//! Registration is expected to happen at startup, before traffic begins;
//! [`Registry::register`] takes `&mut self` so concurrent registration is
//! ruled out by construction. Lookups take `&self` and are safe for any
//! number of concurrent readers once the registry is shared.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;

use super::service::{Handler, MethodDescriptor, MethodSet, Middleware, Service};
use crate::error::RegistrationError;

/// Maps service names to their validated method tables.
pub struct Registry {
    services: HashMap<String, Service>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            services: HashMap::new(),
        }
    }

    /// Register a handler instance as a service.
    ///
    /// Runs [`Handler::methods`] over a fresh method set and installs the
    /// resulting table together with the middleware chain (executed in the
    /// given order at dispatch time). Either the whole service is
    /// installed or none of it:
    ///
    /// # Errors
    ///
    /// - [`RegistrationError::NoSuitableMethods`] if no exposed method
    ///   passed the contract;
    /// - [`RegistrationError::DuplicateService`] if the name is taken.
    pub fn register<H: Handler>(
        &mut self,
        name: &str,
        receiver: H,
        middleware: Vec<Middleware>,
    ) -> Result<(), RegistrationError> {
        let mut methods = MethodSet::new(Arc::new(receiver));
        H::methods(&mut methods);
        if methods.is_empty() {
            return Err(RegistrationError::NoSuitableMethods(name.to_string()));
        }

        if self.services.contains_key(name) {
            return Err(RegistrationError::DuplicateService(name.to_string()));
        }

        self.services.insert(
            name.to_string(),
            Service::new(name.to_string(), methods.into_table(), middleware),
        );
        Ok(())
    }

    /// Look up a service by name.
    pub fn service(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Resolve a `(service, method)` pair to its descriptor.
    pub fn lookup(&self, service: &str, method: &str) -> Option<&MethodDescriptor> {
        self.services.get(service).and_then(|s| s.method(method))
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Whether no service is registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Snapshot of the registered services and their methods, sorted by
    /// name, with request/response type identities.
    ///
    /// Hosts can serialize this for an introspection endpoint; the core
    /// only provides the data.
    pub fn describe(&self) -> Vec<ServiceInfo> {
        let mut services: Vec<ServiceInfo> = self
            .services
            .values()
            .map(|service| {
                let mut methods: Vec<MethodInfo> = service
                    .methods()
                    .map(|m| MethodInfo {
                        name: m.name().to_string(),
                        request_type: m.request_type().to_string(),
                        response_type: m.response_type().to_string(),
                    })
                    .collect();
                methods.sort_by(|a, b| a.name.cmp(&b.name));
                ServiceInfo {
                    name: service.name().to_string(),
                    methods,
                }
            })
            .collect();
        services.sort_by(|a, b| a.name.cmp(&b.name));
        services
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

/// Introspection record for one registered service.
#[derive(Debug, Clone, Serialize)]
pub struct ServiceInfo {
    /// Service name.
    pub name: String,
    /// Methods sorted by name.
    pub methods: Vec<MethodInfo>,
}

/// Introspection record for one dispatchable method.
#[derive(Debug, Clone, Serialize)]
pub struct MethodInfo {
    /// Method name.
    pub name: String,
    /// Type name of the request payload.
    pub request_type: String,
    /// Type name of the response payload.
    pub response_type: String,
}
