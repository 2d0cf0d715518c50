// A named health check bounded by a timeout.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::warn;

const MIN_TIMEOUT: Duration = Duration::from_millis(1);
const FALLBACK_TIMEOUT: Duration = Duration::from_millis(10);

type CheckFn = Arc<dyn Fn() -> BoxFuture<'static, anyhow::Result<()>> + Send + Sync>;

/// Health check registered into a [`Registry`](super::Registry).
#[derive(Clone)]
pub struct Check {
    name: String,
    timeout: Duration,
    check: CheckFn,
}

impl Check {
    /// Creates a check; a timeout below 1ms is raised to 10ms.
    pub fn new<F, Fut>(name: impl Into<String>, timeout: Duration, check: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        let name = name.into();
        let timeout = if timeout < MIN_TIMEOUT {
            warn!(
                component = "probe",
                check = %name,
                timeout_ms = timeout.as_millis() as u64,
                "check timeout is too short, using 10ms"
            );
            FALLBACK_TIMEOUT
        } else {
            timeout
        };

        Self {
            name,
            timeout,
            check: Arc::new(move || check().boxed()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs the check, returning the failure message if it fails or times out.
    pub async fn run(&self) -> Result<(), String> {
        match tokio::time::timeout(self.timeout, (self.check)()).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(format!("{e:#}")),
            Err(_) => Err(format!("check timed out after {:?}", self.timeout)),
        }
    }
}

impl fmt::Debug for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Check")
            .field("name", &self.name)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}
