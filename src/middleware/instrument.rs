//! Request instrumentation applied around the main handler.
//

use axum::{extract::Request, middleware::Next, response::Response, Router};
use std::time::Instant;
use tower_http::trace::TraceLayer;

use super::middleware::{Chain, Middleware};
use super::recover::PanicRecoverMiddleware;
use crate::metrics;

/// Counts, times and gauges every request reaching the main handler.
pub struct RequestMetricsMiddleware;

impl RequestMetricsMiddleware {
    pub fn layer(router: Router) -> Router {
        router.layer(axum::middleware::from_fn(request_metrics_middleware))
    }
}

pub async fn request_metrics_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let started = Instant::now();

    let in_flight = metrics::InFlight::enter();
    let response = next.run(request).await;
    drop(in_flight);

    metrics::record_request(&method, response.status(), started.elapsed());
    response
}

impl Middleware for RequestMetricsMiddleware {
    fn register_middleware(&self, chain: Chain) -> Chain {
        chain.append(Self::layer)
    }
}

/// Base chain placed outside every service middleware: tracing, request metrics,
/// then panic recovery.
pub fn instrument_chain() -> Chain {
    let chain = Chain::new().append(|router: Router| router.layer(TraceLayer::new_for_http()));
    let chain = RequestMetricsMiddleware.register_middleware(chain);
    PanicRecoverMiddleware::new().register_middleware(chain)
}
