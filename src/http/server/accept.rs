// Connection tuning applied between the listener and the HTTP stack.

use axum::Router;
use axum_server::accept::Accept;
use hyper_util::rt::{TokioExecutor, TokioTimer};
use hyper_util::server::conn::auto::Builder;
use socket2::{SockRef, TcpKeepalive};
use std::future::{ready, Ready};
use std::io;
use std::time::Duration;
use tokio::net::TcpStream;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tracing::debug;

use super::config::ServerConfig;

/// hyper refuses smaller HTTP/1 read buffers.
const MIN_HEADER_BUF: usize = 8192;

/// Enables TCP keep-alive on every accepted stream.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeepAliveAcceptor {
    idle: Option<Duration>,
}

impl KeepAliveAcceptor {
    pub(crate) fn new(idle: Duration) -> Self {
        Self {
            idle: (!idle.is_zero()).then_some(idle),
        }
    }
}

impl<S> Accept<TcpStream, S> for KeepAliveAcceptor {
    type Stream = TcpStream;
    type Service = S;
    type Future = Ready<io::Result<(TcpStream, S)>>;

    fn accept(&self, stream: TcpStream, service: S) -> Self::Future {
        if let Some(idle) = self.idle {
            let keepalive = TcpKeepalive::new().with_time(idle);
            if let Err(e) = SockRef::from(&stream).set_tcp_keepalive(&keepalive) {
                debug!(
                    component = "server",
                    event = "keepalive_failed",
                    error = %e,
                    "failed to enable TCP keep-alive"
                );
            }
        }
        ready(Ok((stream, service)))
    }
}

/// Applies the HTTP/1 limits of `cfg` to the connection builder.
pub(crate) fn configure_http(cfg: &ServerConfig, builder: &mut Builder<TokioExecutor>) {
    let mut http1 = builder.http1();
    http1
        .timer(TokioTimer::new())
        .keep_alive(!cfg.idle_timeout.is_zero());

    if !cfg.read_header_timeout.is_zero() {
        http1.header_read_timeout(cfg.read_header_timeout);
    }
    if let Some(max) = cfg.max_header_bytes {
        http1.max_buf_size(max.max(MIN_HEADER_BUF));
    }
}

/// Wraps the handler with the request body and response deadlines of `cfg`.
pub(crate) fn with_timeouts(cfg: &ServerConfig, router: Router) -> Router {
    let router = if cfg.read_timeout.is_zero() {
        router
    } else {
        router.layer(RequestBodyTimeoutLayer::new(cfg.read_timeout))
    };

    if cfg.write_timeout.is_zero() {
        router
    } else {
        router.layer(TimeoutLayer::new(cfg.write_timeout))
    }
}
