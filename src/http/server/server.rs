//! Listener-backed HTTP server.
//!
//! A [`Server`] owns one listener configuration and one handler. `start` opens the
//! listener and spawns the serving task, `stop` drains it under the caller's deadline.
//! Both run their side effect exactly once; later or concurrent callers get the
//! stored outcome.

use axum::Router;
use axum_server::tls_rustls::{RustlsAcceptor, RustlsConfig};
use axum_server::Handle;
use futures::future::BoxFuture;
use futures::FutureExt;
use parking_lot::Mutex;
use std::fmt;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::accept::{configure_http, with_timeouts, KeepAliveAcceptor};
use super::config::ServerConfig;
use super::error::ServerError;

/// Lifecycle of a [`Server`]. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServerStatus {
    NotStarted,
    Running,
    Stopped,
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ServerStatus::NotStarted => "not_started",
            ServerStatus::Running => "running",
            ServerStatus::Stopped => "stopped",
        })
    }
}

/// HTTP server bound to a single listener.
pub struct Server {
    name: &'static str,
    cfg: ServerConfig,
    handler: Mutex<Router>,

    status: tokio::sync::Mutex<ServerStatus>,
    start_once: OnceCell<Result<(), ServerError>>,
    stop_once: OnceCell<Result<(), ServerError>>,

    handle: Handle,
    local_addr: Mutex<Option<SocketAddr>>,

    done: CancellationToken,
    serve_err: Arc<Mutex<Option<ServerError>>>,
}

impl Server {
    /// Creates a server; fails on a malformed address or missing TLS material.
    pub fn new(name: &'static str, cfg: ServerConfig) -> Result<Self, ServerError> {
        cfg.validate()?;

        Ok(Self {
            name,
            cfg,
            handler: Mutex::new(Router::new()),
            status: tokio::sync::Mutex::new(ServerStatus::NotStarted),
            start_once: OnceCell::new(),
            stop_once: OnceCell::new(),
            handle: Handle::new(),
            local_addr: Mutex::new(None),
            done: CancellationToken::new(),
            serve_err: Arc::new(Mutex::new(None)),
        })
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &ServerConfig {
        &self.cfg
    }

    /// Sets the handler served once the server starts.
    pub fn set_handler(&self, router: Router) -> &Self {
        *self.handler.lock() = router;
        self
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        *self.local_addr.lock()
    }

    pub async fn status(&self) -> ServerStatus {
        *self.status.lock().await
    }

    /// Fires exactly once, when the serving task exits. Never fires if the server
    /// was not started.
    pub fn done(&self) -> CancellationToken {
        self.done.clone()
    }

    /// Terminal error of the serving task; `None` on graceful close.
    pub fn error(&self) -> Option<ServerError> {
        self.serve_err.lock().clone()
    }

    /// Opens the listener and starts serving in the background.
    pub async fn start(&self, ctx: CancellationToken) -> Result<(), ServerError> {
        self.start_once
            .get_or_init(|| self.start_inner(ctx))
            .await
            .clone()
    }

    async fn start_inner(&self, ctx: CancellationToken) -> Result<(), ServerError> {
        let mut status = self.status.lock().await;

        if *status == ServerStatus::Stopped {
            return Err(ServerError::AlreadyStopped);
        }
        if ctx.is_cancelled() {
            return Err(ServerError::Canceled);
        }

        let addr = self.cfg.socket_addr()?;

        info!(
            component = "server",
            server = self.name,
            event = "listen",
            address = %addr,
            "start listening for incoming connections"
        );

        let listener = std::net::TcpListener::bind(addr)
            .and_then(|l| l.set_nonblocking(true).map(|_| l))
            .map_err(|e| ServerError::listen(&self.cfg.address, e))?;
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::listen(&self.cfg.address, e))?;

        let app = with_timeouts(&self.cfg, self.handler.lock().clone()).into_make_service();
        let handle = self.handle.clone();
        let keepalive = KeepAliveAcceptor::new(self.cfg.keep_alive);

        let serve: BoxFuture<'static, io::Result<()>> = match &self.cfg.tls {
            Some(tls) => {
                info!(
                    component = "server",
                    server = self.name,
                    event = "tls",
                    "upgrade to TLS"
                );
                let rustls = tokio::select! {
                    res = RustlsConfig::from_pem_file(&tls.cert_file, &tls.key_file) => {
                        res.map_err(|e| ServerError::Tls(Arc::new(e)))?
                    }
                    _ = ctx.cancelled() => return Err(ServerError::Canceled),
                };
                let mut server = axum_server::from_tcp(listener)
                    .acceptor(RustlsAcceptor::new(rustls).acceptor(keepalive))
                    .handle(handle);
                configure_http(&self.cfg, server.http_builder());
                server.serve(app).boxed()
            }
            None => {
                let mut server = axum_server::from_tcp(listener)
                    .acceptor(keepalive)
                    .handle(handle);
                configure_http(&self.cfg, server.http_builder());
                server.serve(app).boxed()
            }
        };

        *self.local_addr.lock() = Some(local_addr);
        *status = ServerStatus::Running;

        info!(
            component = "server",
            server = self.name,
            event = "started",
            address = %local_addr,
            "start serving HTTP requests"
        );

        let name = self.name;
        let done = self.done.clone();
        let serve_err = self.serve_err.clone();
        tokio::spawn(async move {
            match serve.await {
                Ok(()) => info!(
                    component = "server",
                    server = name,
                    event = "serve_finished",
                    "stopped serving HTTP requests"
                ),
                Err(e) => {
                    error!(
                        component = "server",
                        server = name,
                        event = "serve_failed",
                        error = %e,
                        "error while serving HTTP requests"
                    );
                    *serve_err.lock() = Some(ServerError::Serve(Arc::new(e)));
                }
            }
            done.cancel();
        });

        Ok(())
    }

    /// Gracefully stops the server, force-closing it once `ctx` is cancelled.
    ///
    /// Returns only after the serving task has exited.
    pub async fn stop(&self, ctx: CancellationToken) -> Result<(), ServerError> {
        self.stop_once
            .get_or_init(|| self.stop_inner(ctx))
            .await
            .clone()
    }

    async fn stop_inner(&self, ctx: CancellationToken) -> Result<(), ServerError> {
        let mut status = self.status.lock().await;

        if *status != ServerStatus::Running {
            info!(
                component = "server",
                server = self.name,
                event = "stop_skipped",
                "server not started, nothing to stop"
            );
            *status = ServerStatus::Stopped;
            return Ok(());
        }

        info!(component = "server", server = self.name, event = "stopping", "stop server...");

        self.handle.graceful_shutdown(None);
        let graceful = tokio::select! {
            _ = self.done.cancelled() => Ok(()),
            _ = ctx.cancelled() => Err(ServerError::ShutdownTimeout),
        };
        if graceful.is_err() {
            self.handle.shutdown();
        }

        // no accept loop may outlive stop
        self.done.cancelled().await;

        let result = graceful.and_then(|_| match self.error() {
            Some(err) => Err(err),
            None => Ok(()),
        });

        match &result {
            Ok(()) => info!(
                component = "server",
                server = self.name,
                event = "stopped",
                "server successfully stopped"
            ),
            Err(e) => error!(
                component = "server",
                server = self.name,
                event = "stop_failed",
                error = %e,
                "error stopping server"
            ),
        }

        *status = ServerStatus::Stopped;
        result
    }

    /// Kills the serving task as if the listener had failed with `err`.
    #[cfg(test)]
    pub(crate) fn fail(&self, err: io::Error) {
        *self.serve_err.lock() = Some(ServerError::Serve(Arc::new(err)));
        self.handle.shutdown();
    }
}

#[cfg(test)]
#[path = "server_test.rs"]
mod server_test;
