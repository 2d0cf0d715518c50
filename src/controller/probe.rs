// Liveness and readiness probe controller.

use axum::{
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

use crate::probe::Registry;

pub const LIVENESS_PATH: &str = "/live";
pub const READINESS_PATH: &str = "/ready";

/// ProbeController serves a health registry report on `path`.
#[derive(Clone)]
pub struct ProbeController {
    path: &'static str,
    registry: Arc<Registry>,
}

impl ProbeController {
    pub fn new(path: &'static str, registry: Arc<Registry>) -> Self {
        Self { path, registry }
    }

    pub fn liveness(registry: Arc<Registry>) -> Self {
        Self::new(LIVENESS_PATH, registry)
    }

    pub fn readiness(registry: Arc<Registry>) -> Self {
        Self::new(READINESS_PATH, registry)
    }

    /// Handles the probe request.
    async fn probe(&self) -> Response {
        let report = self.registry.measure().await;
        (report.status_code(), Json(report)).into_response()
    }

    /// Adds the probe route to a health server router.
    pub fn add_route(&self, router: Router) -> Router {
        let controller = self.clone();
        router.route(
            self.path,
            get(move || {
                let controller = controller.clone();
                async move { controller.probe().await }
            }),
        )
    }
}
