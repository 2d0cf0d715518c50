// HTTP controllers: the route-exposing capability and the health server endpoints.

pub mod controller;
pub mod metrics;
pub mod probe;

// Re-export controller types for convenience
pub use controller::Controller;
pub use metrics::PrometheusMetricsController;
pub use probe::ProbeController;
