// Listener-backed HTTP server with exactly-once start/stop.

mod accept;
pub mod config;
pub mod error;
pub mod server;

pub use config::{ServerConfig, TlsConfig};
pub use error::ServerError;
pub use server::{Server, ServerStatus};
