// HTTP controller trait for route registration.

use crate::http::{RouteError, Routes};

/// Trait for services exposing routes on the main server.
pub trait Controller: Send + Sync {
    /// Adds routes to the shared route table.
    ///
    /// Commonly may be represented as:
    /// ```rust
    /// # use modapp::http::{RouteError, Routes};
    /// # async fn handler() -> &'static str { "ok" }
    /// # fn register_routes(routes: &mut Routes) -> Result<(), RouteError> {
    /// routes.get("/path", handler)?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// A `(method, path)` pair already taken by another controller fails with
    /// [`RouteError::Duplicate`].
    fn register_routes(&self, routes: &mut Routes) -> Result<(), RouteError>;
}
