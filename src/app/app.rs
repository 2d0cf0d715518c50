// Application orchestrator driving registered services through their lifecycle.

use anyhow::anyhow;
use futures::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, info_span, warn};

use crate::config::{Config, ConfigTrait};
use crate::http::{Routes, Server, ServerError};
use crate::metrics::MetricsRegistry;
use crate::middleware::recover::panic_message;
use crate::middleware::Chain;
use crate::probe::{self, Check, Registry};
use crate::shutdown::{self, Signal, Signals};

use super::error::AppError;
use super::server::{health_handler, main_handler};
use super::service::Service;
use super::status::{Status, StatusCell};

const MAIN_SERVER: &str = "main";
const HEALTHZ_SERVER: &str = "healthz";
const APP_CHECK: &str = "app";
const APP_CHECK_TIMEOUT: Duration = Duration::from_secs(1);

/// Why the application left the running phase.
#[derive(Debug, Clone)]
pub enum ShutdownCause {
    /// The process received a termination signal.
    Signal(Signal),
    /// [`App::shutdown_token`] was cancelled.
    Requested,
    /// The main server stopped serving on its own.
    ServerExited(Option<ServerError>),
}

impl fmt::Display for ShutdownCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShutdownCause::Signal(sig) => write!(f, "received {sig}"),
            ShutdownCause::Requested => f.write_str("shutdown requested"),
            ShutdownCause::ServerExited(Some(err)) => write!(f, "main server exited: {err}"),
            ShutdownCause::ServerExited(None) => f.write_str("main server exited"),
        }
    }
}

/// Encapsulates the registered services, the two servers and the shared status.
pub struct App {
    cfg: Config,

    routes: Routes,
    middlewares: Chain,
    services: Vec<Arc<dyn Service>>,
    to_stop: Mutex<Vec<Arc<dyn Service>>>,

    server: Server,
    healthz: Server,
    liveness: Arc<Registry>,
    readiness: Arc<Registry>,
    metrics: Arc<MetricsRegistry>,

    status: Arc<StatusCell>,
    shutdown: CancellationToken,
    started: AtomicBool,
}

impl App {
    /// Creates the application with both servers configured but not started.
    pub fn new(cfg: Config) -> Result<Self, AppError> {
        let server = Server::new(MAIN_SERVER, cfg.server().clone())?;
        let healthz = Server::new(HEALTHZ_SERVER, cfg.healthz().clone())?;

        let status = Arc::new(StatusCell::new());
        let liveness = Arc::new(Registry::new("liveness"));
        let readiness = Arc::new(Registry::new("readiness"));

        let live = status.clone();
        liveness.register(Check::new(APP_CHECK, APP_CHECK_TIMEOUT, move || {
            let status = live.get();
            async move { status.liveness() }
        }))?;
        let ready = status.clone();
        readiness.register(Check::new(APP_CHECK, APP_CHECK_TIMEOUT, move || {
            let status = ready.get();
            async move { status.readiness() }
        }))?;

        Ok(Self {
            cfg,
            routes: Routes::new(),
            middlewares: Chain::new(),
            services: Vec::new(),
            to_stop: Mutex::new(Vec::new()),
            server,
            healthz,
            liveness,
            readiness,
            metrics: Arc::new(MetricsRegistry::new()),
            status,
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
        })
    }

    /// Registers a service. Its logger, routes and middleware are wired immediately.
    ///
    /// A route already registered by another service fails the registration.
    pub fn register_service(&mut self, svc: Arc<dyn Service>) -> Result<(), AppError> {
        if self.started.load(Ordering::SeqCst) {
            return Err(AppError::AlreadyStarted);
        }

        let name = svc.name().to_string();

        if let Some(loggable) = svc.as_loggable() {
            loggable.set_logger(info_span!("service", service = %name));
        }

        if let Some(controller) = svc.as_controller() {
            controller.register_routes(&mut self.routes).map_err(|e| {
                error!(
                    component = "app",
                    scope = "register",
                    event = "route_conflict",
                    service = %name,
                    error = %e,
                    "failed to register service routes"
                );
                e
            })?;
        }

        if let Some(middleware) = svc.as_middleware() {
            let chain = std::mem::take(&mut self.middlewares);
            self.middlewares = middleware.register_middleware(chain);
        }

        self.services.push(svc);

        debug!(
            component = "app",
            scope = "register",
            event = "registered",
            service = %name,
            "service registered"
        );
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn status(&self) -> Status {
        self.status.get()
    }

    pub fn liveness(&self) -> &Arc<Registry> {
        &self.liveness
    }

    pub fn readiness(&self) -> &Arc<Registry> {
        &self.readiness
    }

    pub fn metrics(&self) -> &Arc<MetricsRegistry> {
        &self.metrics
    }

    /// Main traffic server.
    pub fn server(&self) -> &Server {
        &self.server
    }

    /// Health server serving `/live`, `/ready` and `/metrics`.
    pub fn healthz(&self) -> &Server {
        &self.healthz
    }

    /// Cancelling this token shuts the running application down like a termination signal.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Names of the runnable services whose start was attempted, in start order.
    ///
    /// These are the services stopped, in reverse, on shutdown or rollback.
    pub fn started_services(&self) -> Vec<String> {
        self.to_stop
            .lock()
            .iter()
            .map(|svc| svc.name().to_string())
            .collect()
    }

    /// Runs the whole lifecycle: servers, init, start, wait, stop.
    ///
    /// Returns the first fatal error. Executes once; later calls fail with
    /// [`AppError::AlreadyStarted`].
    pub async fn run(&self) -> Result<(), AppError> {
        if self.started.swap(true, Ordering::SeqCst) {
            return Err(AppError::AlreadyStarted);
        }

        self.log_config();

        let (start_ctx, _start_guard) = shutdown::deadline(self.cfg.start_timeout());

        let mut signals = self.start_signals_and_servers(&start_ctx).await?;

        if let Err(err) = self.init_services(&start_ctx).await {
            self.cleanup(&mut signals, "init_failed").await;
            return Err(err);
        }

        if let Err(err) = self.start_services(&start_ctx).await {
            self.cleanup(&mut signals, "start_failed").await;
            return Err(err);
        }

        let cause = self.wait(&mut signals).await;
        match &cause {
            ShutdownCause::ServerExited(Some(_)) => warn!(
                component = "app",
                event = "shutdown",
                cause = %cause,
                "shutting down"
            ),
            _ => info!(
                component = "app",
                event = "shutdown",
                cause = %cause,
                "shutting down"
            ),
        }

        // one deadline bounds the whole shutdown
        let (stop_ctx, _stop_guard) = shutdown::deadline(self.cfg.stop_timeout());
        let stopped = self.stop_services(&stop_ctx).await;
        let servers = self.stop_signals_and_servers(&mut signals, &stop_ctx).await;

        info!(component = "app", event = "stopped", "application lifecycle");

        stopped.and(servers)
    }

    /// Calls `close` on every closable service in reverse registration order.
    ///
    /// Not part of [`App::run`]; owners call it once `run` has returned.
    pub fn close(&self) -> Result<(), AppError> {
        let mut first = None;

        for svc in self.services.iter().rev() {
            let Some(closable) = svc.as_closable() else {
                continue;
            };
            if let Err(error) = closable.close() {
                error!(
                    component = "app",
                    scope = "close",
                    event = "close_failed",
                    service = %svc.name(),
                    error = %format!("{error:#}"),
                    "error closing service"
                );
                first.get_or_insert(AppError::Close {
                    service: svc.name().to_string(),
                    error,
                });
            }
        }

        first.map_or(Ok(()), Err)
    }

    fn log_config(&self) {
        match serde_json::to_string(&self.cfg) {
            Ok(cfg) => info!(
                component = "app",
                event = "config",
                config = %cfg,
                "running with configuration"
            ),
            Err(e) => warn!(
                component = "app",
                event = "config",
                error = %e,
                "failed to encode configuration"
            ),
        }
    }

    async fn start_signals_and_servers(&self, ctx: &CancellationToken) -> Result<Signals, AppError> {
        let mut signals = Signals::listen().map_err(AppError::Signals)?;

        self.healthz.set_handler(health_handler(
            self.liveness.clone(),
            self.readiness.clone(),
            self.metrics.clone(),
        ));
        self.server
            .set_handler(main_handler(&self.routes, &self.middlewares));

        for server in [&self.healthz, &self.server] {
            if let Err(e) = server.start(ctx.clone()).await {
                error!(
                    component = "app",
                    scope = "server",
                    event = "start_failed",
                    server = server.name(),
                    error = %e,
                    "failed to start server"
                );
                self.cleanup(&mut signals, "server_start_failed").await;
                return Err(e.into());
            }
        }

        Ok(signals)
    }

    async fn init_services(&self, ctx: &CancellationToken) -> Result<(), AppError> {
        self.status.set(Status::Initializing);

        // cancelled on the first failure, or with the start deadline
        let init_ctx = ctx.child_token();
        let mut tasks = JoinSet::new();

        for svc in &self.services {
            let svc = svc.clone();
            let ctx = init_ctx.clone();
            let readiness = self.readiness.clone();
            let metrics = self.metrics.clone();

            tasks.spawn(async move {
                let service = svc.name().to_string();
                AssertUnwindSafe(init_service(svc, ctx, readiness, metrics))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| {
                        let reason = panic_message(&*panic).unwrap_or("unknown panic");
                        Err(anyhow!("panicked: {reason}"))
                    })
                    .map_err(|error| AppError::Init { service, error })
            });
        }

        let mut first: Option<AppError> = None;
        let mut deadline_logged = false;

        loop {
            let joined = tokio::select! {
                joined = tasks.join_next() => joined,
                _ = ctx.cancelled(), if !deadline_logged => {
                    deadline_logged = true;
                    warn!(
                        component = "app",
                        scope = "init",
                        event = "deadline_exceeded",
                        pending = tasks.len(),
                        "start timeout elapsed while services are still initializing"
                    );
                    continue;
                }
            };
            let Some(joined) = joined else {
                break;
            };

            let outcome = joined.unwrap_or_else(|e| {
                Err(AppError::Init {
                    service: "unknown".to_string(),
                    error: anyhow!(e),
                })
            });

            if let Err(err) = outcome {
                if first.is_none() {
                    error!(
                        component = "app",
                        scope = "init",
                        event = "init_failed",
                        service = err.service().unwrap_or_default(),
                        error = %err,
                        "failed to initialize service"
                    );
                    init_ctx.cancel();
                    first = Some(err);
                } else {
                    debug!(
                        component = "app",
                        scope = "init",
                        event = "init_failed",
                        service = err.service().unwrap_or_default(),
                        error = %err,
                        "discarding subsequent init error"
                    );
                }
            }
        }

        match first {
            Some(err) => {
                self.status.set(Status::InitFailed);
                Err(err)
            }
            None => {
                info!(
                    component = "app",
                    scope = "init",
                    event = "initialized",
                    services = self.services.len(),
                    "services initialized"
                );
                Ok(())
            }
        }
    }

    async fn start_services(&self, ctx: &CancellationToken) -> Result<(), AppError> {
        self.status.set(Status::Starting);

        for svc in &self.services {
            let Some(runnable) = svc.as_runnable() else {
                continue;
            };

            // a partially started service is stopped first on rollback
            self.to_stop.lock().push(svc.clone());

            if let Err(error) = runnable.start(ctx.clone()).await {
                let err = AppError::Start {
                    service: svc.name().to_string(),
                    error,
                };
                error!(
                    component = "app",
                    scope = "start",
                    event = "start_failed",
                    service = %svc.name(),
                    error = %err,
                    "failed to start service, rolling back"
                );

                let (stop_ctx, _guard) = shutdown::deadline(self.cfg.stop_timeout());
                if let Err(e) = self.stop_services(&stop_ctx).await {
                    warn!(
                        component = "app",
                        scope = "start",
                        event = "rollback_failed",
                        error = %e,
                        "error stopping started services"
                    );
                }
                return Err(err);
            }

            info!(
                component = "app",
                scope = "start",
                event = "started",
                service = %svc.name(),
                "service started"
            );
        }

        self.status.set(Status::Running);
        Ok(())
    }

    async fn wait(&self, signals: &mut Signals) -> ShutdownCause {
        let done = self.server.done();

        tokio::select! {
            sig = signals.recv() => ShutdownCause::Signal(sig),
            _ = self.shutdown.cancelled() => ShutdownCause::Requested,
            _ = done.cancelled() => ShutdownCause::ServerExited(self.server.error()),
        }
    }

    async fn stop_services(&self, ctx: &CancellationToken) -> Result<(), AppError> {
        self.status.set(Status::Stopping);

        let started = self.to_stop.lock().clone();
        let mut first = None;

        for svc in started.iter().rev() {
            let Some(runnable) = svc.as_runnable() else {
                continue;
            };

            match runnable.stop(ctx.clone()).await {
                Ok(()) => info!(
                    component = "app",
                    scope = "stop",
                    event = "stopped",
                    service = %svc.name(),
                    "service stopped"
                ),
                Err(error) => {
                    let err = AppError::Stop {
                        service: svc.name().to_string(),
                        error,
                    };
                    error!(
                        component = "app",
                        scope = "stop",
                        event = "stop_failed",
                        service = %svc.name(),
                        error = %err,
                        "failed to stop service"
                    );
                    first.get_or_insert(err);
                }
            }
        }

        self.status.set(Status::Stopped);
        first.map_or(Ok(()), Err)
    }

    async fn stop_signals_and_servers(
        &self,
        signals: &mut Signals,
        ctx: &CancellationToken,
    ) -> Result<(), AppError> {
        signals.stop();

        let main = self.server.stop(ctx.clone()).await;
        let healthz = self.healthz.stop(ctx.clone()).await;

        main.and(healthz).map_err(AppError::from)
    }

    /// Tears signals and servers down after a failed startup phase.
    async fn cleanup(&self, signals: &mut Signals, reason: &'static str) {
        let (ctx, _guard) = shutdown::deadline(self.cfg.stop_timeout());
        if let Err(e) = self.stop_signals_and_servers(signals, &ctx).await {
            warn!(
                component = "app",
                scope = "cleanup",
                event = reason,
                error = %e,
                "error stopping servers after failed startup"
            );
        }
    }
}

async fn init_service(
    svc: Arc<dyn Service>,
    ctx: CancellationToken,
    readiness: Arc<probe::Registry>,
    metrics: Arc<MetricsRegistry>,
) -> anyhow::Result<()> {
    use anyhow::Context;

    if let Some(checkable) = svc.as_checkable() {
        checkable
            .register_check(&readiness)
            .context("register health check")?;
    }

    if let Some(measurable) = svc.as_measurable() {
        measurable
            .register_metrics(&metrics)
            .context("register metrics")?;
    }

    if let Some(initializable) = svc.as_initializable() {
        initializable.init(ctx).await?;
    }

    Ok(())
}
