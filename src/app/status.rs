// Application lifecycle status and the lock guarding it.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use tracing::{info, warn};

use crate::metrics;

/// Lifecycle phase of an [`App`](super::App).
///
/// Phases only move forward within one run. `InitFailed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    #[default]
    Uninitialized,
    Initializing,
    InitFailed,
    Starting,
    Running,
    Stopping,
    Stopped,
}

impl Status {
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::Uninitialized => "uninitialized",
            Status::Initializing => "initializing",
            Status::InitFailed => "init_failed",
            Status::Starting => "starting",
            Status::Running => "running",
            Status::Stopping => "stopping",
            Status::Stopped => "stopped",
        }
    }

    /// Numeric code exported through the `app_status` gauge.
    pub fn code(&self) -> u8 {
        *self as u8
    }

    /// Fails once the application is dead: after a failed init or a completed stop.
    pub fn liveness(&self) -> anyhow::Result<()> {
        match self {
            Status::InitFailed | Status::Stopped => anyhow::bail!("application is {}", self),
            _ => Ok(()),
        }
    }

    /// Passes only while every service is running.
    pub fn readiness(&self) -> anyhow::Result<()> {
        match self {
            Status::Running => Ok(()),
            _ => anyhow::bail!("application is {}", self),
        }
    }

    fn can_become(&self, next: Status) -> bool {
        *self != Status::InitFailed && next > *self
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared status; the lock is held only for the read or write itself.
#[derive(Debug, Default)]
pub struct StatusCell {
    inner: Mutex<Status>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Status {
        *self.inner.lock()
    }

    /// Moves to `next`. Backward moves and moves out of `InitFailed` are refused.
    pub fn set(&self, next: Status) -> bool {
        let prev = {
            let mut current = self.inner.lock();
            if !current.can_become(next) {
                let current = *current;
                warn!(
                    component = "app",
                    scope = "status",
                    event = "transition_refused",
                    from = %current,
                    to = %next,
                    "refused status transition"
                );
                return false;
            }
            std::mem::replace(&mut *current, next)
        };

        metrics::set_app_status(next.code());
        info!(
            component = "app",
            scope = "status",
            event = "transition",
            from = %prev,
            to = %next,
            "status changed"
        );
        true
    }
}

#[cfg(test)]
#[path = "status_test.rs"]
mod status_test;
