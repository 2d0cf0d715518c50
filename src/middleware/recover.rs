//! Panic recovery middleware.
//

use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Router,
};
use futures::FutureExt;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use tracing::error;

use super::middleware::{Chain, Middleware};
use crate::metrics;

/// Turns a panicking handler into a `500 Internal Server Error`.
pub struct PanicRecoverMiddleware;

impl PanicRecoverMiddleware {
    pub fn new() -> Self {
        Self
    }

    pub fn layer(router: Router) -> Router {
        router.layer(axum::middleware::from_fn(panic_recover_middleware))
    }
}

impl Default for PanicRecoverMiddleware {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn panic_recover_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();

    match AssertUnwindSafe(next.run(request)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let reason = panic_message(&*panic).unwrap_or("unknown panic");

            error!(
                component = "http",
                event = "handler_panicked",
                method = %method,
                path = %path,
                panic = %reason,
                "recovered from handler panic"
            );
            metrics::inc_panics();

            (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
        }
    }
}

/// Text carried by a panic payload, when it is a string.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> Option<&str> {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
}

impl Middleware for PanicRecoverMiddleware {
    fn register_middleware(&self, chain: Chain) -> Chain {
        chain.append(Self::layer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request as HttpRequest, routing::get};
    use tower::ServiceExt;

    #[test]
    fn panic_message_reads_string_payloads() {
        let literal: Box<dyn Any + Send> = Box::new("static reason");
        let owned: Box<dyn Any + Send> = Box::new(format!("owned {}", 7));
        let other: Box<dyn Any + Send> = Box::new(42_u32);

        assert_eq!(panic_message(&*literal), Some("static reason"));
        assert_eq!(panic_message(&*owned), Some("owned 7"));
        assert_eq!(panic_message(&*other), None);
    }

    #[tokio::test]
    async fn panicking_handler_becomes_500() {
        async fn explode() -> &'static str {
            panic!("handler exploded")
        }
        let router = PanicRecoverMiddleware::layer(Router::new().route("/boom", get(explode)));

        let res = router
            .oneshot(HttpRequest::get("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
