#[path = "k8s/probe/mod.rs"]
pub mod probe;
#[cfg(test)]
mod tests;

pub mod app;
pub mod config;
pub mod controller;
pub mod http;
pub mod logger;
pub mod metrics;
pub mod middleware;
pub mod shutdown;

pub use app::{App, AppError, Service, Status};
pub use config::{Config, ConfigTrait};
