// Errors returned by the application lifecycle.

use std::io;

use crate::http::{RouteError, ServerError};
use crate::probe::ProbeError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("application already started")]
    AlreadyStarted,

    #[error(transparent)]
    Route(#[from] RouteError),

    #[error(transparent)]
    Server(#[from] ServerError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("failed to listen for termination signals: {0}")]
    Signals(#[source] io::Error),

    #[error("service {service} failed to initialize: {error:#}")]
    Init { service: String, error: anyhow::Error },

    #[error("service {service} failed to start: {error:#}")]
    Start { service: String, error: anyhow::Error },

    #[error("service {service} failed to stop: {error:#}")]
    Stop { service: String, error: anyhow::Error },

    #[error("service {service} failed to close: {error:#}")]
    Close { service: String, error: anyhow::Error },
}

impl AppError {
    /// Name of the failing service, for service hook errors.
    pub fn service(&self) -> Option<&str> {
        match self {
            AppError::Init { service, .. }
            | AppError::Start { service, .. }
            | AppError::Stop { service, .. }
            | AppError::Close { service, .. } => Some(service),
            _ => None,
        }
    }
}
