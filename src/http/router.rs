// Route table shared by every controller of the main server.

use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{on, MethodFilter};
use axum::Router;
use std::collections::HashSet;
use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::middleware::recover::panic_message;

/// Route registration failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("route {method} {path} is already registered")]
    Duplicate { method: Method, path: String },

    #[error("method {method} cannot be routed")]
    UnsupportedMethod { method: Method },

    #[error("invalid route path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },
}

/// Routes accumulated from controllers.
///
/// Every `(method, path)` pair may be registered once; a second registration is
/// rejected instead of silently shadowing the first handler.
#[derive(Default, Clone)]
pub struct Routes {
    router: Router,
    registered: HashSet<(Method, String)>,
}

impl Routes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for `method` on `path`.
    pub fn route<H, T>(&mut self, method: Method, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        if !path.starts_with('/') {
            return Err(RouteError::InvalidPath {
                path: path.to_string(),
                reason: "path must start with '/'".to_string(),
            });
        }

        let key = (method.clone(), path.to_string());
        if self.registered.contains(&key) {
            return Err(RouteError::Duplicate {
                method,
                path: path.to_string(),
            });
        }

        let filter = MethodFilter::try_from(method.clone())
            .map_err(|_| RouteError::UnsupportedMethod { method: method.clone() })?;

        // The router rejects conflicting patterns by panicking; keep the table intact.
        let router = self.router.clone();
        let routed = catch_unwind(AssertUnwindSafe(move || router.route(path, on(filter, handler))))
            .map_err(|panic| RouteError::InvalidPath {
                path: path.to_string(),
                reason: panic_message(panic.as_ref())
                    .unwrap_or("route rejected by router")
                    .to_string(),
            })?;

        self.router = routed;
        self.registered.insert(key);
        Ok(self)
    }

    pub fn get<H, T>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(Method::GET, path, handler)
    }

    pub fn post<H, T>(&mut self, path: &str, handler: H) -> Result<&mut Self, RouteError>
    where
        H: Handler<T, ()>,
        T: 'static,
    {
        self.route(Method::POST, path, handler)
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.registered.contains(&(method.clone(), path.to_string()))
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Snapshot of the accumulated routes.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    pub fn into_router(self) -> Router {
        self.router
    }
}

#[cfg(test)]
#[path = "router_test.rs"]
mod router_test;
