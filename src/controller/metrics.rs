//! Metrics controller.

use axum::{
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

use crate::metrics::MetricsRegistry;

pub const PROMETHEUS_METRICS_PATH: &str = "/metrics";

const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// PrometheusMetricsController handles the Prometheus metrics endpoint.
#[derive(Clone)]
pub struct PrometheusMetricsController {
    registry: Arc<MetricsRegistry>,
}

impl PrometheusMetricsController {
    pub fn new(registry: Arc<MetricsRegistry>) -> Self {
        Self { registry }
    }

    /// Handles the metrics request.
    async fn get_metrics(&self) -> Response {
        ([(header::CONTENT_TYPE, CONTENT_TYPE)], self.registry.render()).into_response()
    }

    pub fn add_route(&self, router: Router) -> Router {
        let controller = self.clone();
        router.route(
            PROMETHEUS_METRICS_PATH,
            get(move || {
                let controller = controller.clone();
                async move { controller.get_metrics().await }
            }),
        )
    }
}
