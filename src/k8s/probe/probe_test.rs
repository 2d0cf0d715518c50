use super::*;
use std::time::Duration;

#[tokio::test]
async fn empty_registry_is_ok() {
    let registry = Registry::new("readiness");
    let report = registry.measure().await;

    assert!(report.is_ok());
    assert_eq!(report.status_code(), axum::http::StatusCode::OK);
    assert!(report.failures.is_empty());
}

#[tokio::test]
async fn failing_and_slow_checks_are_reported() {
    let registry = Registry::new("readiness");
    registry
        .register(Check::new("db", Duration::from_secs(1), || async { Ok(()) }))
        .unwrap();
    registry
        .register(Check::new("queue", Duration::from_secs(1), || async {
            Err(anyhow::anyhow!("queue unreachable"))
        }))
        .unwrap();
    registry
        .register(Check::new("cache", Duration::from_millis(20), || async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        }))
        .unwrap();

    let report = registry.measure().await;

    assert_eq!(report.status, Availability::Unavailable);
    assert_eq!(
        report.status_code(),
        axum::http::StatusCode::SERVICE_UNAVAILABLE
    );
    assert_eq!(report.failures.len(), 2);
    assert_eq!(report.failures["queue"], "queue unreachable");
    assert!(report.failures["cache"].contains("timed out"));
}

#[test]
fn duplicate_check_is_rejected() {
    let registry = Registry::new("liveness");
    registry
        .register(Check::new("app", Duration::from_secs(1), || async { Ok(()) }))
        .unwrap();

    let err = registry
        .register(Check::new("app", Duration::from_secs(1), || async { Ok(()) }))
        .unwrap_err();
    assert!(matches!(err, ProbeError::Duplicate { .. }));
    assert_eq!(registry.len(), 1);
}

#[test]
fn too_short_timeout_is_raised() {
    let check = Check::new("fast", Duration::ZERO, || async { Ok(()) });
    assert_eq!(check.timeout(), Duration::from_millis(10));
}

#[test]
fn report_serializes_status_names() {
    let report = Report::new(Default::default());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "OK");
    assert!(json.get("failures").is_none());

    let report = Report::new([("app".to_string(), "stopped".to_string())].into());
    let json = serde_json::to_value(&report).unwrap();
    assert_eq!(json["status"], "Unavailable");
    assert_eq!(json["failures"]["app"], "stopped");
}
