// Service registration: loggers, route conflicts and middleware composition.

use axum::http::Method;

use super::support::{get, new_app, Journal, MockService, RunningApp};
use crate::app::{AppError, Status};
use crate::http::RouteError;

/// Two services claiming the same route fail registration before run.
#[tokio::test]
async fn test_route_conflict_fails_registration() {
    let journal = Journal::new();
    let mut app = new_app();

    app.register_service(MockService::new("svc1", &journal).route("/foo").build())
        .expect("first owner of /foo");
    let err = app
        .register_service(MockService::new("svc2", &journal).route("/foo").build())
        .expect_err("second owner of /foo");

    assert!(
        matches!(
            &err,
            AppError::Route(RouteError::Duplicate { method, path })
                if *method == Method::GET && path == "/foo"
        ),
        "{err}"
    );
    assert_eq!(app.status(), Status::Uninitialized);
}

#[tokio::test]
async fn test_registration_hands_out_loggers() {
    let journal = Journal::new();
    let mut app = new_app();
    let svc = MockService::new("svc1", &journal).build();

    app.register_service(svc.clone()).unwrap();

    assert!(svc.has_logger());
    assert_eq!(journal.entries(), vec!["logger:svc1"]);
}

/// Routes are served through service middleware in registration order.
#[tokio::test]
async fn test_routes_and_middleware_are_served() {
    let journal = Journal::new();
    let mut app = new_app();
    app.register_service(
        MockService::new("svc1", &journal)
            .route("/one")
            .header("x-served-by")
            .build(),
    )
    .unwrap();
    app.register_service(
        MockService::new("svc2", &journal)
            .route("/two")
            .header("x-served-by")
            .build(),
    )
    .unwrap();

    let running = RunningApp::spawn(app);
    running.wait_for_status(Status::Running).await;

    let resp = get(&running.main_url("/two")).await;
    assert_eq!(resp.status(), 200);
    // svc1 wraps svc2, so its header is written last
    assert_eq!(resp.headers()["x-served-by"], "svc1");
    assert_eq!(resp.text().await.unwrap(), "svc2");

    let resp = get(&running.main_url("/one")).await;
    assert_eq!(resp.text().await.unwrap(), "svc1");

    let resp = get(&running.main_url("/missing")).await;
    assert_eq!(resp.status(), 404);

    running.shutdown().await.expect("clean shutdown");
}
