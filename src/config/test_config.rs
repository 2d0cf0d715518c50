use super::{AppBox, Config, Logs};
use crate::http::ServerConfig;
use std::time::Duration;

/// Creates a new test configuration: both servers on ephemeral loopback ports.
pub fn new_test_config() -> Config {
    Config {
        app: AppBox {
            env: super::TEST.to_string(),
            logs: Logs {
                level: "debug".to_string(),
                ..Logs::default()
            },
            server: ServerConfig::new("127.0.0.1:0"),
            healthz: ServerConfig::new("127.0.0.1:0"),
            start_timeout: Duration::from_secs(2),
            stop_timeout: Duration::from_secs(2),
        },
    }
}
