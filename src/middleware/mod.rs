// HTTP middlewares and the chain composing them.

pub mod instrument;
pub mod middleware;
pub mod recover;

pub use instrument::{instrument_chain, RequestMetricsMiddleware};
pub use middleware::{Chain, Middleware};
pub use recover::PanicRecoverMiddleware;
