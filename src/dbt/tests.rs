//! Tests for the dbt Cloud client

use super::*;
use crate::config::DbtConfig;
use crate::error::Error;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn config_for(server: &MockServer) -> DbtConfig {
    DbtConfig {
        api_base_url: format!("{}/api/v2/accounts", server.uri()),
        metadata_api_url: format!("{}/graphql", server.uri()),
        api_token: "dbtc_test".to_string(),
    }
}

fn client_for(server: &MockServer) -> DbtClient {
    DbtClient::new(&config_for(server)).unwrap()
}

#[tokio::test]
async fn test_get_account_id() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/accounts/"))
        .and(header("Authorization", "Token dbtc_test"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": {"code": 200},
            "data": [{"id": 1708, "name": "Acme"}, {"id": 99, "name": "Other"}]
        })))
        .mount(&mock_server)
        .await;

    let account_id = client_for(&mock_server).get_account_id().await.unwrap();
    assert_eq!(account_id, 1708);
}

#[tokio::test]
async fn test_get_account_id_unauthorized() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/accounts/"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Invalid token"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).get_account_id().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_get_account_id_malformed_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/accounts/"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>login</html>"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).get_account_id().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_get_account_id_no_accounts() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/accounts/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": []})))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).get_account_id().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
}

#[tokio::test]
async fn test_get_projects() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/accounts/1708/projects/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [{"id": 1499, "name": "analytics", "account_id": 1708}]
        })))
        .mount(&mock_server)
        .await;

    let projects = client_for(&mock_server).get_projects(1708).await.unwrap();
    assert_eq!(
        projects,
        vec![Project {
            id: 1499,
            name: Some("analytics".to_string()),
            account_id: Some(1708),
        }]
    );
}

#[tokio::test]
async fn test_get_jobs_with_environment_filter() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/v2/accounts/1708/jobs/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": [
                {"id": 117857, "name": "common_run", "environment_id": 1939, "project_id": 1499},
                {"id": 2, "name": "ci", "environment_id": 7, "project_id": 1499}
            ]
        })))
        .mount(&mock_server)
        .await;

    let client = client_for(&mock_server);

    let jobs = client.get_jobs(1708, Some(&[1939])).await.unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].id, 117_857);

    let jobs = client.get_jobs(1708, None).await.unwrap();
    assert_eq!(jobs.len(), 2);
}

#[tokio::test]
async fn test_get_models_for_job() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .and(header("Authorization", "Token dbtc_test"))
        .and(body_string_contains("models(jobId: 117857)"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "models": [{
                    "uniqueId": "model.analytics.common_cars",
                    "packageName": "analytics",
                    "runId": 42,
                    "jobId": 117857,
                    "executionTime": 3.5,
                    "status": "success",
                    "executeCompletedAt": "2024-05-01T10:00:00Z",
                    "database": "PROD",
                    "schema": "common",
                    "name": "common_cars",
                    "alias": "cars",
                    "description": "One row per car",
                    "meta": {"owner": "data"},
                    "stats": [{"id": "row_count", "value": 10}],
                    "columns": [{"name": "id", "description": "Primary key"}]
                }, {
                    "database": "PROD",
                    "schema": "core_ng",
                    "name": "core_rentals",
                    "columns": null,
                    "stats": null
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let models = client_for(&mock_server)
        .get_models_for_job(117_857)
        .await
        .unwrap();

    assert_eq!(models.len(), 2);
    let cars = &models[0];
    assert_eq!(cars.unique_id.as_deref(), Some("model.analytics.common_cars"));
    assert_eq!(cars.alias.as_deref(), Some("cars"));
    assert_eq!(cars.description.as_deref(), Some("One row per car"));
    assert_eq!(cars.columns[0].name, "id");
    assert_eq!(cars.stats[0].value, json!(10));
    assert!(cars.execute_completed_at.is_some());
    assert!(models[1].columns.is_empty());
}

#[tokio::test]
async fn test_get_models_for_job_query_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": null,
            "errors": [{"message": "Job not found"}]
        })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .get_models_for_job(1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Query { ref message } if message == "Job not found"));
    assert!(err.is_terminal());
}

#[tokio::test]
async fn test_get_models_for_job_timeout() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/graphql"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"models": []}}))
                .set_delay(Duration::from_millis(500)),
        )
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .with_discovery_timeout(Duration::from_millis(50))
        .get_models_for_job(1)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Timeout { .. }));
}

#[tokio::test]
async fn test_get_models_for_job_body_stall_is_timeout() {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Headers arrive promptly, the model list never finishes
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut buf = vec![0u8; 64 * 1024];
        let _ = socket.read(&mut buf).await;
        socket
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 200\r\n\r\n{\"data\"",
            )
            .await
            .unwrap();
        socket.flush().await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
    });

    let config = DbtConfig {
        api_base_url: format!("http://{addr}/api/v2/accounts"),
        metadata_api_url: format!("http://{addr}/graphql"),
        api_token: "dbtc_test".to_string(),
    };
    let err = DbtClient::new(&config)
        .unwrap()
        .with_discovery_timeout(Duration::from_millis(300))
        .get_models_for_job(1)
        .await
        .unwrap_err();

    assert!(
        matches!(err, Error::Timeout { timeout_ms: 300 }),
        "unexpected error: {err:?}"
    );
    server.abort();
}

#[test]
fn test_models_query_embeds_job_id() {
    let query = models_query(117_857);
    assert!(query.contains("models(jobId: 117857)"));
    assert!(query.contains("uniqueId"));
    assert!(query.contains("columns {"));
    assert_eq!(query.matches("executionTime").count(), 1);
}
