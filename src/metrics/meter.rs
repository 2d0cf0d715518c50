use axum::http::{Method, StatusCode};
use std::time::Duration;

// Metric name constants
pub const HTTP_REQUESTS_TOTAL: &str = "http_requests_total";
pub const HTTP_REQUEST_DURATION: &str = "http_request_duration_seconds";
pub const HTTP_REQUESTS_IN_FLIGHT: &str = "http_requests_in_flight";
pub const HTTP_PANICS_TOTAL: &str = "http_panics_total";
pub const APP_STATUS: &str = "app_status";

/// Names described by [`describe`], reserved in every registry.
pub const BUILTIN: &[&str] = &[
    HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION,
    HTTP_REQUESTS_IN_FLIGHT,
    HTTP_PANICS_TOTAL,
    APP_STATUS,
];

/// Describes the built-in metrics.
pub fn describe() {
    ::metrics::describe_counter!(
        HTTP_REQUESTS_TOTAL,
        "Total number of HTTP requests served by the main server."
    );
    ::metrics::describe_histogram!(
        HTTP_REQUEST_DURATION,
        ::metrics::Unit::Seconds,
        "HTTP request latency in seconds."
    );
    ::metrics::describe_gauge!(
        HTTP_REQUESTS_IN_FLIGHT,
        "Number of HTTP requests currently being served."
    );
    ::metrics::describe_counter!(HTTP_PANICS_TOTAL, "Number of HTTP handler panics recovered.");
    ::metrics::describe_gauge!(APP_STATUS, "Current application lifecycle status code.");
}

/// Records a finished request.
pub fn record_request(method: &Method, status: StatusCode, elapsed: Duration) {
    let method = method.to_string();
    let status = status.as_u16().to_string();

    ::metrics::counter!(HTTP_REQUESTS_TOTAL, "method" => method.clone(), "status" => status)
        .increment(1);
    ::metrics::histogram!(HTTP_REQUEST_DURATION, "method" => method).record(elapsed.as_secs_f64());
}

/// Adds a recovered panic.
pub fn inc_panics() {
    ::metrics::counter!(HTTP_PANICS_TOTAL).increment(1);
}

/// Sets the application status code.
pub fn set_app_status(code: u8) {
    ::metrics::gauge!(APP_STATUS).set(code as f64);
}

/// Keeps the in-flight gauge raised while alive.
pub struct InFlight(());

impl InFlight {
    pub fn enter() -> Self {
        ::metrics::gauge!(HTTP_REQUESTS_IN_FLIGHT).increment(1.0);
        Self(())
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        ::metrics::gauge!(HTTP_REQUESTS_IN_FLIGHT).decrement(1.0);
    }
}
