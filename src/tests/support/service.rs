// Recording mock service implementing every capability on demand.

use async_trait::async_trait;
use axum::extract::Request;
use axum::http::HeaderValue;
use axum::middleware::{from_fn, Next};
use axum::Router;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

use crate::app::{Checkable, Closable, Initializable, Loggable, Measurable, Runnable, Service};
use crate::controller::Controller;
use crate::http::{RouteError, Routes};
use crate::metrics::MetricsRegistry;
use crate::middleware::{Chain, Middleware};
use crate::probe::{self, Check};

/// Shared, ordered record of lifecycle calls, entries look like `start:svc1`.
#[derive(Clone, Default)]
pub struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, op: &str, service: &str) {
        self.0.lock().push(format!("{op}:{service}"));
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().clone()
    }

    /// Services that went through `op`, in call order.
    pub fn calls(&self, op: &str) -> Vec<String> {
        let prefix = format!("{op}:");
        self.0
            .lock()
            .iter()
            .filter_map(|e| e.strip_prefix(&prefix).map(str::to_string))
            .collect()
    }

    pub fn count(&self, op: &str, service: &str) -> usize {
        self.calls(op).iter().filter(|s| *s == service).count()
    }
}

pub struct MockService {
    name: String,
    journal: Journal,
    runnable: bool,
    fail_init: bool,
    panic_init: bool,
    fail_start: bool,
    fail_stop: bool,
    fail_close: bool,
    init_until_cancelled: bool,
    init_gate: Option<Arc<Notify>>,
    stop_until_cancelled: bool,
    routes: Vec<&'static str>,
    hang_routes: Vec<&'static str>,
    header: Option<&'static str>,
    check: Option<bool>,
    metric: Option<&'static str>,
    span: Mutex<Option<tracing::Span>>,
}

impl MockService {
    pub fn new(name: &str, journal: &Journal) -> Self {
        Self {
            name: name.to_string(),
            journal: journal.clone(),
            runnable: false,
            fail_init: false,
            panic_init: false,
            fail_start: false,
            fail_stop: false,
            fail_close: false,
            init_until_cancelled: false,
            init_gate: None,
            stop_until_cancelled: false,
            routes: Vec::new(),
            hang_routes: Vec::new(),
            header: None,
            check: None,
            metric: None,
            span: Mutex::new(None),
        }
    }

    pub fn runnable(mut self) -> Self {
        self.runnable = true;
        self
    }

    pub fn fail_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    pub fn panic_init(mut self) -> Self {
        self.panic_init = true;
        self
    }

    pub fn fail_start(mut self) -> Self {
        self.runnable = true;
        self.fail_start = true;
        self
    }

    pub fn fail_stop(mut self) -> Self {
        self.runnable = true;
        self.fail_stop = true;
        self
    }

    pub fn fail_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    /// Init blocks until its context is cancelled, then fails.
    pub fn init_until_cancelled(mut self) -> Self {
        self.init_until_cancelled = true;
        self
    }

    /// Init blocks until `gate` is notified.
    pub fn init_gate(mut self, gate: Arc<Notify>) -> Self {
        self.init_gate = Some(gate);
        self
    }

    /// Stop blocks until its context is cancelled, then succeeds.
    pub fn stop_until_cancelled(mut self) -> Self {
        self.runnable = true;
        self.stop_until_cancelled = true;
        self
    }

    /// GET `path` records `request:<name>` and never answers.
    pub fn hang_route(mut self, path: &'static str) -> Self {
        self.hang_routes.push(path);
        self
    }

    /// Serves its own name on GET `path`.
    pub fn route(mut self, path: &'static str) -> Self {
        self.routes.push(path);
        self
    }

    /// Adds the response header `header: <name>`.
    pub fn header(mut self, header: &'static str) -> Self {
        self.header = Some(header);
        self
    }

    /// Registers a readiness check named after the service.
    pub fn check(mut self, healthy: bool) -> Self {
        self.check = Some(healthy);
        self
    }

    pub fn metric(mut self, name: &'static str) -> Self {
        self.metric = Some(name);
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn has_logger(&self) -> bool {
        self.span.lock().is_some()
    }
}

impl Service for MockService {
    fn name(&self) -> &str {
        &self.name
    }

    fn as_loggable(&self) -> Option<&dyn Loggable> {
        Some(self)
    }

    fn as_controller(&self) -> Option<&dyn Controller> {
        (!self.routes.is_empty() || !self.hang_routes.is_empty()).then_some(self as &dyn Controller)
    }

    fn as_middleware(&self) -> Option<&dyn Middleware> {
        self.header.is_some().then_some(self as &dyn Middleware)
    }

    fn as_checkable(&self) -> Option<&dyn Checkable> {
        self.check.is_some().then_some(self as &dyn Checkable)
    }

    fn as_measurable(&self) -> Option<&dyn Measurable> {
        self.metric.is_some().then_some(self as &dyn Measurable)
    }

    fn as_initializable(&self) -> Option<&dyn Initializable> {
        Some(self)
    }

    fn as_runnable(&self) -> Option<&dyn Runnable> {
        self.runnable.then_some(self as &dyn Runnable)
    }

    fn as_closable(&self) -> Option<&dyn Closable> {
        Some(self)
    }
}

impl Loggable for MockService {
    fn set_logger(&self, span: tracing::Span) {
        self.journal.record("logger", &self.name);
        *self.span.lock() = Some(span);
    }
}

impl Controller for MockService {
    fn register_routes(&self, routes: &mut Routes) -> Result<(), RouteError> {
        for path in &self.routes {
            let name = self.name.clone();
            routes.get(path, move || async move { name })?;
        }
        for path in &self.hang_routes {
            let name = self.name.clone();
            let journal = self.journal.clone();
            routes.get(path, move || async move {
                journal.record("request", &name);
                std::future::pending::<String>().await
            })?;
        }
        Ok(())
    }
}

impl Middleware for MockService {
    fn register_middleware(&self, chain: Chain) -> Chain {
        let Some(header) = self.header else {
            return chain;
        };
        let value = HeaderValue::from_str(&self.name).expect("header value");

        chain.append(move |router: Router| {
            let value = value.clone();
            router.layer(from_fn(move |req: Request, next: Next| {
                let value = value.clone();
                async move {
                    let mut res = next.run(req).await;
                    res.headers_mut().insert(header, value);
                    res
                }
            }))
        })
    }
}

impl Checkable for MockService {
    fn register_check(&self, registry: &probe::Registry) -> anyhow::Result<()> {
        self.journal.record("check", &self.name);
        let healthy = self.check.unwrap_or(true);
        registry.register(Check::new(
            self.name.clone(),
            Duration::from_secs(1),
            move || async move {
                if healthy {
                    Ok(())
                } else {
                    Err(anyhow::anyhow!("dependency unreachable"))
                }
            },
        ))?;
        Ok(())
    }
}

impl Measurable for MockService {
    fn register_metrics(&self, registry: &MetricsRegistry) -> anyhow::Result<()> {
        self.journal.record("metrics", &self.name);
        if let Some(metric) = self.metric {
            registry.describe_counter(metric, "Jobs handled by a test service.")?;
        }
        Ok(())
    }
}

#[async_trait]
impl Initializable for MockService {
    async fn init(&self, ctx: CancellationToken) -> anyhow::Result<()> {
        self.journal.record("init", &self.name);

        if self.panic_init {
            panic!("{} exploded", self.name);
        }
        if self.fail_init {
            anyhow::bail!("{} cannot connect", self.name);
        }
        if self.init_until_cancelled {
            ctx.cancelled().await;
            self.journal.record("init_aborted", &self.name);
            anyhow::bail!("{} init canceled", self.name);
        }
        if let Some(gate) = &self.init_gate {
            tokio::select! {
                _ = gate.notified() => {}
                _ = ctx.cancelled() => anyhow::bail!("{} init canceled", self.name),
            }
        }

        self.journal.record("init_done", &self.name);
        Ok(())
    }
}

#[async_trait]
impl Runnable for MockService {
    async fn start(&self, _ctx: CancellationToken) -> anyhow::Result<()> {
        self.journal.record("start", &self.name);
        if self.fail_start {
            anyhow::bail!("{} refused to start", self.name);
        }
        Ok(())
    }

    async fn stop(&self, ctx: CancellationToken) -> anyhow::Result<()> {
        self.journal.record("stop", &self.name);
        if self.stop_until_cancelled {
            ctx.cancelled().await;
            self.journal.record("stop_cancelled", &self.name);
        }
        if self.fail_stop {
            anyhow::bail!("{} refused to stop", self.name);
        }
        Ok(())
    }
}

impl Closable for MockService {
    fn close(&self) -> anyhow::Result<()> {
        self.journal.record("close", &self.name);
        if self.fail_close {
            anyhow::bail!("{} refused to close", self.name);
        }
        Ok(())
    }
}
