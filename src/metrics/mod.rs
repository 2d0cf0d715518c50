//! Prometheus metrics functionality.
//
//! Metrics organization:
//! - HTTP request metrics of the main server: meter (http_requests_total, etc.)
//! - Service metrics: described through the MetricsRegistry handed to services
//! - Process metrics: metrics-process (process_resident_memory_bytes, process_cpu_*, etc.)

pub mod meter;
pub mod registry;

// Re-export commonly used items
pub use meter::*;
pub use registry::{prometheus_handle, MetricsError, MetricsRegistry};
