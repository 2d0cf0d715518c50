// Health report returned by a registry measurement.

use axum::http::StatusCode;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Availability {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Unavailable")]
    Unavailable,
}

/// Outcome of running every check of a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub status: Availability,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub failures: BTreeMap<String, String>,
}

impl Report {
    pub fn new(failures: BTreeMap<String, String>) -> Self {
        let status = if failures.is_empty() {
            Availability::Ok
        } else {
            Availability::Unavailable
        };

        Self {
            status,
            timestamp: Utc::now(),
            failures,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.status == Availability::Ok
    }

    /// 200 when every check passed, 503 otherwise.
    pub fn status_code(&self) -> StatusCode {
        if self.is_ok() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}
