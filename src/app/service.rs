//! Service capability contracts.
//!
//! A service is registered as an `Arc<dyn Service>`. Each capability is an optional
//! trait; a service advertises the ones it implements by overriding the matching
//! `as_*` query to return `Some(self)`:
//!
//! ```rust
//! # use modapp::app::{Runnable, Service};
//! # use tokio_util::sync::CancellationToken;
//! struct Worker;
//!
//! #[async_trait::async_trait]
//! impl Runnable for Worker {
//!     async fn start(&self, _ctx: CancellationToken) -> anyhow::Result<()> { Ok(()) }
//!     async fn stop(&self, _ctx: CancellationToken) -> anyhow::Result<()> { Ok(()) }
//! }
//!
//! impl Service for Worker {
//!     fn name(&self) -> &str { "worker" }
//!     fn as_runnable(&self) -> Option<&dyn Runnable> { Some(self) }
//! }
//! ```

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::controller::Controller;
use crate::metrics::MetricsRegistry;
use crate::middleware::Middleware;
use crate::probe;

/// A component whose lifecycle is driven by the [`App`](super::App).
pub trait Service: Send + Sync + 'static {
    /// Label used in logs and errors.
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    fn as_loggable(&self) -> Option<&dyn Loggable> {
        None
    }

    fn as_controller(&self) -> Option<&dyn Controller> {
        None
    }

    fn as_middleware(&self) -> Option<&dyn Middleware> {
        None
    }

    fn as_checkable(&self) -> Option<&dyn Checkable> {
        None
    }

    fn as_measurable(&self) -> Option<&dyn Measurable> {
        None
    }

    fn as_initializable(&self) -> Option<&dyn Initializable> {
        None
    }

    fn as_runnable(&self) -> Option<&dyn Runnable> {
        None
    }

    fn as_closable(&self) -> Option<&dyn Closable> {
        None
    }
}

/// Receives a span carrying the service name, at registration.
pub trait Loggable: Send + Sync {
    fn set_logger(&self, span: tracing::Span);
}

/// Wires readiness checks. Runs once, before `init`; an error aborts initialization.
pub trait Checkable: Send + Sync {
    fn register_check(&self, registry: &probe::Registry) -> anyhow::Result<()>;
}

/// Describes emitted metrics. Same timing and failure semantics as [`Checkable`].
pub trait Measurable: Send + Sync {
    fn register_metrics(&self, registry: &MetricsRegistry) -> anyhow::Result<()>;
}

/// One-shot initialization, run concurrently with every other service.
///
/// Must return promptly once `ctx` is cancelled and must not leave background work behind.
#[async_trait]
pub trait Initializable: Send + Sync {
    async fn init(&self, ctx: CancellationToken) -> anyhow::Result<()>;
}

/// Long-lived background work, started in registration order and stopped in reverse.
#[async_trait]
pub trait Runnable: Send + Sync {
    async fn start(&self, ctx: CancellationToken) -> anyhow::Result<()>;

    async fn stop(&self, ctx: CancellationToken) -> anyhow::Result<()>;
}

/// Terminal cleanup. Not called by [`App::run`](super::App::run); owners call it
/// themselves once the application has returned.
pub trait Closable: Send + Sync {
    fn close(&self) -> anyhow::Result<()>;
}
