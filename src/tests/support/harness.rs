// Test harness running an App in the background.

use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

use crate::app::{App, AppError, Status};
use crate::config::test_config::new_test_config;

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

/// Creates an app with both servers on ephemeral loopback ports.
pub fn new_app() -> App {
    App::new(new_test_config()).expect("app")
}

/// An app whose `run` is executing on a background task.
pub struct RunningApp {
    pub app: Arc<App>,
    handle: JoinHandle<Result<(), AppError>>,
}

impl RunningApp {
    pub fn spawn(app: App) -> Self {
        let app = Arc::new(app);
        let runner = app.clone();
        let handle = tokio::spawn(async move { runner.run().await });
        Self { app, handle }
    }

    /// Polls the app status until it equals `want`.
    pub async fn wait_for_status(&self, want: Status) {
        let app = self.app.clone();
        tokio::time::timeout(WAIT_TIMEOUT, async move {
            while app.status() != want {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap_or_else(|_| panic!("status never became {want}, is {}", self.app.status()));
    }

    pub fn main_url(&self, path: &str) -> String {
        let addr = self.app.server().local_addr().expect("main server bound");
        format!("http://{addr}{path}")
    }

    pub fn health_url(&self, path: &str) -> String {
        let addr = self.app.healthz().local_addr().expect("health server bound");
        format!("http://{addr}{path}")
    }

    /// Requests shutdown and waits for `run` to return.
    pub async fn shutdown(self) -> Result<(), AppError> {
        self.app.shutdown_token().cancel();
        self.join().await
    }

    /// Waits for `run` to return on its own.
    pub async fn join(self) -> Result<(), AppError> {
        tokio::time::timeout(WAIT_TIMEOUT, self.handle)
            .await
            .expect("run did not return in time")
            .expect("run task panicked")
    }
}
