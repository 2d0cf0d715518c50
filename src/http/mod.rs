// HTTP module: route table and listener-backed server.

pub mod router;
pub mod server;

// Re-export routing and server types
pub use router::{RouteError, Routes};
pub use server::{Server, ServerConfig, ServerError, ServerStatus, TlsConfig};

// Common controller and middleware interfaces
pub use crate::controller::controller::Controller;
pub use crate::middleware::middleware::{Chain, Middleware};
