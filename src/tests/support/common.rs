// Common test utilities for integration tests.

use std::time::Duration;

use crate::probe::Report;

/// Makes a GET request.
pub async fn get(url: &str) -> reqwest::Response {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("client")
        .get(url)
        .send()
        .await
        .unwrap_or_else(|e| panic!("GET {url}: {e}"))
}

/// Fetches a probe endpoint, returning the status code and the decoded report.
pub async fn get_report(url: &str) -> (u16, Report) {
    let resp = get(url).await;
    let status = resp.status().as_u16();
    let report = resp.json::<Report>().await.expect("report json");
    (status, report)
}
