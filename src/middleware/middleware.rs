// Middleware interface and the ordered chain wrapping the main handler.

use axum::Router;
use std::sync::Arc;

type Layer = Arc<dyn Fn(Router) -> Router + Send + Sync>;

/// Ordered list of router wrappers.
///
/// The first appended wrapper is the outermost one: it sees the request first and
/// the response last.
#[derive(Default, Clone)]
pub struct Chain {
    layers: Vec<Layer>,
}

impl Chain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a wrapper inside every wrapper already in the chain.
    pub fn append<F>(mut self, layer: F) -> Self
    where
        F: Fn(Router) -> Router + Send + Sync + 'static,
    {
        self.layers.push(Arc::new(layer));
        self
    }

    /// Appends every wrapper of `other`, keeping their order.
    pub fn extend(mut self, other: Chain) -> Self {
        self.layers.extend(other.layers);
        self
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Wraps `router` with the whole chain.
    pub fn then(&self, router: Router) -> Router {
        self.layers
            .iter()
            .rev()
            .fold(router, |router, layer| layer(router))
    }
}

/// Trait for services contributing request/response processing to the main server.
pub trait Middleware: Send + Sync {
    /// Returns `chain` with this service's wrappers appended.
    fn register_middleware(&self, chain: Chain) -> Chain;
}
