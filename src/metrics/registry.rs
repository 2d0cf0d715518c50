//! Prometheus recorder and the per-application metric registry.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use metrics_process::Collector;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::OnceLock;
use tracing::warn;

use super::meter;

/// Global Prometheus handle for rendering metrics.
static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the Prometheus recorder on first use and returns its handle.
///
/// The recorder is built without an HTTP listener; rendering happens through the
/// health server's `/metrics` route.
pub fn prometheus_handle() -> &'static PrometheusHandle {
    PROMETHEUS_HANDLE.get_or_init(|| {
        let recorder = PrometheusBuilder::new().build_recorder();
        let handle = recorder.handle();
        if let Err(e) = ::metrics::set_global_recorder(recorder) {
            warn!(
                component = "metrics",
                event = "recorder_install_failed",
                error = %e,
                "another metrics recorder is already installed, /metrics will be empty"
            );
        }
        handle
    })
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MetricsError {
    #[error("metric {name:?} is already registered")]
    AlreadyRegistered { name: String },

    #[error("metric name {name:?} is not a valid Prometheus name")]
    InvalidName { name: String },
}

/// Metric descriptions registered by services, plus process metrics.
pub struct MetricsRegistry {
    handle: &'static PrometheusHandle,
    names: Mutex<HashSet<String>>,
    process: Collector,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        let handle = prometheus_handle();

        let process = Collector::default();
        process.describe();

        meter::describe();

        Self {
            handle,
            names: Mutex::new(meter::BUILTIN.iter().map(|n| n.to_string()).collect()),
            process,
        }
    }

    pub fn describe_counter(&self, name: &str, help: &str) -> Result<(), MetricsError> {
        self.claim(name)?;
        ::metrics::describe_counter!(name.to_string(), help.to_string());
        Ok(())
    }

    pub fn describe_gauge(&self, name: &str, help: &str) -> Result<(), MetricsError> {
        self.claim(name)?;
        ::metrics::describe_gauge!(name.to_string(), help.to_string());
        Ok(())
    }

    pub fn describe_histogram(&self, name: &str, help: &str) -> Result<(), MetricsError> {
        self.claim(name)?;
        ::metrics::describe_histogram!(name.to_string(), help.to_string());
        Ok(())
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.names.lock().contains(name)
    }

    /// Renders every metric in the Prometheus text format.
    pub fn render(&self) -> String {
        self.process.collect();
        self.handle.run_upkeep();
        self.handle.render()
    }

    fn claim(&self, name: &str) -> Result<(), MetricsError> {
        if !is_valid_name(name) {
            return Err(MetricsError::InvalidName {
                name: name.to_string(),
            });
        }
        if !self.names.lock().insert(name.to_string()) {
            return Err(MetricsError::AlreadyRegistered {
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}
