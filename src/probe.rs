use crate::core::HealthReport;
use crate::utils::error::{CityError, Result};
use crate::utils::validation::validate_url;
use reqwest::Client;
use std::time::Duration;

pub const DEFAULT_HEALTH_URL: &str = "http://127.0.0.1:5000/health";

/// Calls the health endpoint and succeeds only on a 2xx answer whose body is
/// a health report with status `ok`.
pub async fn check_health(url: &str, timeout: Duration) -> Result<HealthReport> {
    validate_url("health_url", url)?;

    let client = Client::builder().timeout(timeout).build()?;
    tracing::debug!("Probing {}", url);
    let response = client.get(url).send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(CityError::HealthCheckError {
            message: format!("{} returned {}: {}", url, status, body.trim()),
        });
    }

    let report: HealthReport = response.json().await.map_err(|e| CityError::HealthCheckError {
        message: format!("unexpected health response: {}", e),
    })?;

    if report.status != "ok" {
        return Err(CityError::HealthCheckError {
            message: format!("service reported status '{}'", report.status),
        });
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn healthy_body(status: &str) -> serde_json::Value {
        serde_json::json!({
            "status": status,
            "store": "loaded",
            "data_file": "cities.json",
            "total_cities": 3,
            "total_keys": 20,
            "loaded_at": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_healthy_service() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(healthy_body("ok"));
        });

        let report = check_health(&server.url("/health"), Duration::from_secs(2))
            .await
            .unwrap();

        mock.assert();
        assert_eq!(report.total_cities, 3);
    }

    #[tokio::test]
    async fn test_unavailable_service() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(503)
                .json_body(serde_json::json!({"status": "error", "store": "unavailable"}));
        });

        let err = check_health(&server.url("/health"), Duration::from_secs(2))
            .await
            .unwrap_err();

        mock.assert();
        assert!(matches!(err, CityError::HealthCheckError { .. }));
    }

    #[tokio::test]
    async fn test_non_ok_status_in_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).json_body(healthy_body("degraded"));
        });

        let err = check_health(&server.url("/health"), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("degraded"));
    }

    #[tokio::test]
    async fn test_garbage_body() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/health");
            then.status(200).body("OK");
        });

        let err = check_health(&server.url("/health"), Duration::from_secs(2))
            .await
            .unwrap_err();
        assert!(matches!(err, CityError::HealthCheckError { .. }));
    }

    #[tokio::test]
    async fn test_invalid_url_is_rejected_before_request() {
        let err = check_health("ftp://localhost/health", Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, CityError::InvalidConfigValueError { .. }));
    }
}
