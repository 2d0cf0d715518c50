//! Health registries backing the liveness and readiness endpoints.
//!
//! A [`Registry`] holds named [`Check`]s. [`Registry::measure`] runs all of them
//! concurrently, each under its own timeout, and folds the outcomes into a [`Report`].

pub mod check;
pub mod error;
pub mod report;

pub use check::Check;
pub use error::ProbeError;
pub use report::{Availability, Report};

use futures::future::join_all;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use tracing::{debug, warn};

pub struct Registry {
    name: String,
    checks: Mutex<Vec<Check>>,
}

impl Registry {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            checks: Mutex::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Adds a check. Names are unique within a registry.
    pub fn register(&self, check: Check) -> Result<(), ProbeError> {
        if check.name().is_empty() {
            return Err(ProbeError::EmptyName);
        }

        let mut checks = self.checks.lock();
        if checks.iter().any(|c| c.name() == check.name()) {
            return Err(ProbeError::Duplicate {
                registry: self.name.clone(),
                name: check.name().to_string(),
            });
        }

        debug!(
            component = "probe",
            registry = %self.name,
            check = %check.name(),
            "check registered"
        );
        checks.push(check);
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.checks.lock().iter().any(|c| c.name() == name)
    }

    pub fn len(&self) -> usize {
        self.checks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.lock().is_empty()
    }

    /// Runs every check and reports the failures.
    pub async fn measure(&self) -> Report {
        let checks = self.checks.lock().clone();

        let outcomes = join_all(checks.iter().map(|check| async move {
            (check.name().to_string(), check.run().await)
        }))
        .await;

        let failures: BTreeMap<String, String> = outcomes
            .into_iter()
            .filter_map(|(name, outcome)| outcome.err().map(|e| (name, e)))
            .collect();

        if !failures.is_empty() {
            warn!(
                component = "probe",
                registry = %self.name,
                failed = failures.len(),
                "health checks failed"
            );
        }

        Report::new(failures)
    }
}

#[cfg(test)]
#[path = "probe_test.rs"]
mod probe_test;
