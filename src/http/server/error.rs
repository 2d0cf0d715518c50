// Errors of a listener-backed server.

use std::io;
use std::sync::Arc;

/// Outcome of a failed server operation.
///
/// Cloneable so every caller of the once-guarded `start`/`stop` observes the same error.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ServerError {
    #[error("server already stopped, cannot restart")]
    AlreadyStopped,

    #[error("server start canceled")]
    Canceled,

    #[error("invalid server address {address:?}: {reason}")]
    InvalidAddress { address: String, reason: String },

    #[error("failed to listen on {address}: {source}")]
    Listen {
        address: String,
        #[source]
        source: Arc<io::Error>,
    },

    #[error("failed to load TLS configuration: {0}")]
    Tls(#[source] Arc<io::Error>),

    #[error("graceful shutdown deadline exceeded, connections were force-closed")]
    ShutdownTimeout,

    #[error("error while serving requests: {0}")]
    Serve(#[source] Arc<io::Error>),
}

impl ServerError {
    pub(crate) fn listen(address: impl Into<String>, err: io::Error) -> Self {
        ServerError::Listen {
            address: address.into(),
            source: Arc::new(err),
        }
    }
}
