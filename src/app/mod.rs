// Application lifecycle: orchestrator, status and service capabilities.

pub mod app;
pub mod error;
pub mod server;
pub mod service;
pub mod status;

pub use app::{App, ShutdownCause};
pub use error::AppError;
pub use service::{Checkable, Closable, Initializable, Loggable, Measurable, Runnable, Service};
pub use status::{Status, StatusCell};

// Route and middleware capabilities live with their HTTP plumbing.
pub use crate::controller::Controller;
pub use crate::middleware::Middleware;
