// Handler assembly for the two servers owned by the application.

use axum::Router;
use std::sync::Arc;

use crate::controller::{ProbeController, PrometheusMetricsController};
use crate::http::Routes;
use crate::metrics::MetricsRegistry;
use crate::middleware::{instrument_chain, Chain};
use crate::probe::Registry;

/// Main server handler: instrumentation, then service middleware, then the routes.
pub(crate) fn main_handler(routes: &Routes, middlewares: &Chain) -> Router {
    instrument_chain()
        .extend(middlewares.clone())
        .then(routes.router())
}

/// Health server handler exposing `/live`, `/ready` and `/metrics`.
pub(crate) fn health_handler(
    liveness: Arc<Registry>,
    readiness: Arc<Registry>,
    metrics: Arc<MetricsRegistry>,
) -> Router {
    let controllers = [
        ProbeController::liveness(liveness),
        ProbeController::readiness(readiness),
    ];

    let router = controllers
        .iter()
        .fold(Router::new(), |router, controller| controller.add_route(router));

    PrometheusMetricsController::new(metrics).add_route(router)
}
