//! Tests for the Tableau client

use super::*;
use crate::config::TableauConfig;
use crate::error::Error;
use crate::reconcile::MergedTable;
use crate::types::PublishCounts;
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, body_string, body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TABLES_PATH: &str = "/api/3.17/sites/site-id/tables/tbl-luid";

fn config_for(server: &MockServer) -> TableauConfig {
    TableauConfig {
        server: server.uri(),
        site: "site1".to_string(),
        pat_name: "sync".to_string(),
        pat_secret: "secret".to_string(),
        api_version: "3.17".to_string(),
    }
}

fn client_for(server: &MockServer) -> TableauClient {
    TableauClient::new(config_for(server)).unwrap()
}

fn credentials() -> Credentials {
    Credentials {
        token: "session-token".to_string(),
        site_id: "site-id".to_string(),
        user_id: "user-id".to_string(),
    }
}

fn merged_table(luid: Option<&str>) -> MergedTable {
    MergedTable {
        name: "common_cars".to_string(),
        schema: "common".to_string(),
        database: "PROD".to_string(),
        id: Some("tbl-id".to_string()),
        luid: luid.map(String::from),
        full_name: Some("[PROD].[COMMON].[CARS]".to_string()),
        description: Some("One row per car".to_string()),
        meta: None,
        package_name: None,
        unique_id: None,
        alias: None,
        columns: vec![
            crate::dbt::ModelColumn {
                name: "id".to_string(),
                description: Some("Primary key".to_string()),
            },
            crate::dbt::ModelColumn {
                name: "model".to_string(),
                description: Some("Model \u{201c}name\u{201d}".to_string()),
            },
            crate::dbt::ModelColumn {
                name: "undocumented".to_string(),
                description: None,
            },
        ],
    }
}

fn catalog_column(name: &str, luid: &str) -> Column {
    Column {
        name: Some(name.to_string()),
        luid: Some(luid.to_string()),
        ..Column::default()
    }
}

// ============================================================================
// Sign-in
// ============================================================================

#[tokio::test]
async fn test_authenticate() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/3.17/auth/signin"))
        .and(body_json(json!({
            "credentials": {
                "personalAccessTokenName": "sync",
                "personalAccessTokenSecret": "secret",
                "site": {"contentUrl": "site1"}
            }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "credentials": {
                "token": "session-token",
                "site": {"id": "site-id", "contentUrl": "site1"},
                "user": {"id": "user-id"}
            }
        })))
        .expect(1)
        .mount(&mock_server)
        .await;

    let creds = client_for(&mock_server).authenticate().await.unwrap();
    assert_eq!(creds, credentials());
}

#[tokio::test]
async fn test_authenticate_rejected() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/3.17/auth/signin"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": {"summary": "Signin Error", "detail": "Invalid PAT"}
        })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).authenticate().await.unwrap_err();
    assert!(matches!(err, Error::Auth { .. }));
    assert!(err.to_string().contains("401"));
}

#[tokio::test]
async fn test_authenticate_errors_in_body() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/api/3.17/auth/signin"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Site not found"}]
        })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server).authenticate().await.unwrap_err();
    assert!(matches!(err, Error::Auth { ref message } if message == "Site not found"));
}

// ============================================================================
// Metadata API
// ============================================================================

#[tokio::test]
async fn test_get_databases() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(METADATA_GRAPHQL_PATH))
        .and(header("x-tableau-auth", "session-token"))
        .and(body_string_contains("connectionType"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "databases": [{
                    "name": "PROD",
                    "id": "db-1",
                    "tables": [
                        {"name": "cars", "schema": "common", "id": "t-1", "luid": "abc", "fullName": "[PROD].[COMMON].[CARS]"},
                        {"name": "orphan", "schema": null, "id": "t-2", "luid": null}
                    ]
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let databases = client_for(&mock_server)
        .get_databases(&credentials(), &["PROD".to_string()])
        .await
        .unwrap();

    assert_eq!(databases.len(), 1);
    assert_eq!(databases[0].tables.len(), 2);
    assert_eq!(databases[0].tables[0].luid.as_deref(), Some("abc"));
    assert_eq!(databases[0].tables[1].schema, "");
}

#[tokio::test]
async fn test_get_databases_query_error() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(METADATA_GRAPHQL_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "errors": [{"message": "Permission denied"}]
        })))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .get_databases(&credentials(), &[])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Query { .. }));
}

#[tokio::test]
async fn test_get_downstream_workbooks() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(METADATA_GRAPHQL_PATH))
        .and(body_string_contains(r#"luid: \"tbl-luid\""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "databaseTables": [{
                    "name": "cars",
                    "downstreamWorkbooks": [{
                        "id": "wb-1",
                        "luid": "wb-luid",
                        "name": "Sales Dash",
                        "projectName": "Sales",
                        "vizportalUrlId": "123",
                        "tags": [{"id": "tag-1", "name": "certified"}],
                        "owner": {"id": "u-1", "name": "A", "username": "a@x.com"},
                        "upstreamTables": [{"id": "t-1", "luid": "tbl-luid", "name": "cars"}]
                    }]
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let workbooks = client_for(&mock_server)
        .get_downstream_workbooks(&merged_table(Some("tbl-luid")), &credentials())
        .await
        .unwrap();

    assert_eq!(workbooks.len(), 1);
    let workbook = &workbooks[0];
    assert_eq!(workbook.name, "Sales Dash");
    assert_eq!(workbook.vizportal_url_id.as_deref(), Some("123"));
    assert_eq!(workbook.tags[0].name, "certified");
    assert_eq!(
        workbook.owner.as_ref().and_then(|o| o.username.as_deref()),
        Some("a@x.com")
    );
    assert_eq!(workbook.upstream_tables[0].name, "cars");
}

#[tokio::test]
async fn test_get_downstream_workbooks_requires_luid() {
    let mock_server = MockServer::start().await;

    let err = client_for(&mock_server)
        .get_downstream_workbooks(&merged_table(None), &credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::MissingField { .. }));
    assert!(!err.is_terminal());
}

#[tokio::test]
async fn test_get_column_metadata() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(METADATA_GRAPHQL_PATH))
        .and(body_string_contains(r#""variables":{"luid":"tbl-luid"}"#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": {
                "databaseTables": [{
                    "columns": [
                        {"name": "ID", "id": "c-1", "luid": "col-1", "description": null, "remoteType": "I8", "isNullable": false},
                        {"name": "MODEL", "id": "c-2", "luid": "col-2", "description": "old", "remoteType": "WSTR", "isNullable": true}
                    ]
                }]
            }
        })))
        .mount(&mock_server)
        .await;

    let columns = client_for(&mock_server)
        .get_column_metadata(&merged_table(Some("tbl-luid")), &credentials())
        .await
        .unwrap();

    assert_eq!(columns.len(), 2);
    assert_eq!(columns[0].remote_type.as_deref(), Some("I8"));
    assert_eq!(columns[0].is_nullable, Some(false));
    assert_eq!(columns[1].description.as_deref(), Some("old"));
}

// ============================================================================
// Publishing
// ============================================================================

#[tokio::test]
async fn test_publish_column_descriptions() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("{TABLES_PATH}/columns/col-1")))
        .and(header("x-tableau-auth", "session-token"))
        .and(header("Content-Type", "application/xml"))
        .and(body_string_contains(r#"<column description="Primary key"/>"#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("{TABLES_PATH}/columns/col-2")))
        .and(body_string_contains(r#"description="Model &quot;name&quot;""#))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    // no dbt description, so never published
    Mock::given(method("PUT"))
        .and(path(format!("{TABLES_PATH}/columns/col-3")))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let columns = vec![
        catalog_column("ID", "col-1"),
        catalog_column("MODEL", "col-2"),
        catalog_column("UNDOCUMENTED", "col-3"),
    ];

    let counts = client_for(&mock_server)
        .publish_column_descriptions(&merged_table(Some("tbl-luid")), &columns, &credentials())
        .await;

    assert_eq!(counts, PublishCounts::new(1, 1));
}

#[tokio::test]
async fn test_publish_column_descriptions_continue_after_failure() {
    let mock_server = MockServer::start().await;

    // ID sorts first, so its failure precedes the MODEL write
    Mock::given(method("PUT"))
        .and(path(format!("{TABLES_PATH}/columns/col-1")))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("PUT"))
        .and(path(format!("{TABLES_PATH}/columns/col-2")))
        .and(body_string_contains(r#"description="Model &quot;name&quot;""#))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let columns = vec![
        catalog_column("ID", "col-1"),
        catalog_column("MODEL", "col-2"),
    ];

    let counts = client_for(&mock_server)
        .publish_column_descriptions(&merged_table(Some("tbl-luid")), &columns, &credentials())
        .await;

    assert_eq!(counts, PublishCounts::new(1, 1));
}

#[tokio::test]
async fn test_publish_column_descriptions_continue_after_dropped_connection() {
    use std::sync::{Arc, Mutex};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    // Connections asking for col-1 are closed without a response
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requested = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&requested);
    let server = tokio::spawn(async move {
        loop {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 64 * 1024];
            let n = socket.read(&mut buf).await.unwrap_or(0);
            let request_line = String::from_utf8_lossy(&buf[..n])
                .lines()
                .next()
                .unwrap_or_default()
                .to_string();
            seen.lock().unwrap().push(request_line.clone());
            if request_line.contains("/columns/col-1") {
                drop(socket);
                continue;
            }
            socket
                .write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n")
                .await
                .unwrap();
            socket.flush().await.unwrap();
        }
    });

    let client = TableauClient::new(TableauConfig {
        server: format!("http://{addr}"),
        site: "site1".to_string(),
        pat_name: "sync".to_string(),
        pat_secret: "secret".to_string(),
        api_version: "3.17".to_string(),
    })
    .unwrap();
    let columns = vec![
        catalog_column("ID", "col-1"),
        catalog_column("MODEL", "col-2"),
    ];

    let counts = client
        .publish_column_descriptions(&merged_table(Some("tbl-luid")), &columns, &credentials())
        .await;

    assert_eq!(counts, PublishCounts::new(1, 1));
    let requested = requested.lock().unwrap().clone();
    assert!(requested
        .iter()
        .any(|line| line.starts_with(&format!("PUT {TABLES_PATH}/columns/col-2 "))));
    server.abort();
}

#[tokio::test]
async fn test_publish_column_descriptions_unexpected_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(format!("{TABLES_PATH}/columns/col-1")))
        .respond_with(ResponseTemplate::new(202))
        .mount(&mock_server)
        .await;

    let counts = client_for(&mock_server)
        .publish_column_descriptions(
            &merged_table(Some("tbl-luid")),
            &[catalog_column("ID", "col-1")],
            &credentials(),
        )
        .await;

    assert_eq!(counts, PublishCounts::new(0, 1));
}

#[tokio::test]
async fn test_publish_column_descriptions_without_table_luid() {
    let mock_server = MockServer::start().await;

    let counts = client_for(&mock_server)
        .publish_column_descriptions(
            &merged_table(None),
            &[catalog_column("ID", "col-1")],
            &credentials(),
        )
        .await;

    assert_eq!(counts, PublishCounts::default());
}

#[tokio::test]
async fn test_publish_table_description() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(TABLES_PATH))
        .and(header("x-tableau-auth", "session-token"))
        .and(body_string(
            r#"<?xml version="1.0" encoding="UTF-8"?><tsRequest><table description="Cars &amp; trucks"/></tsRequest>"#,
        ))
        .respond_with(ResponseTemplate::new(200).set_body_string("<tsResponse/>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let body = client_for(&mock_server)
        .publish_table_description(&merged_table(Some("tbl-luid")), "Cars & trucks", &credentials())
        .await
        .unwrap();
    assert_eq!(body, "<tsResponse/>");
}

#[tokio::test]
async fn test_publish_table_description_forbidden() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(TABLES_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .publish_table_description(&merged_table(Some("tbl-luid")), "text", &credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 403, .. }));
}

#[tokio::test]
async fn test_publish_table_description_unexpected_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("PUT"))
        .and(path(TABLES_PATH))
        .respond_with(ResponseTemplate::new(202).set_body_string("<tsResponse/>"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let err = client_for(&mock_server)
        .publish_table_description(&merged_table(Some("tbl-luid")), "text", &credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::HttpStatus { status: 202, .. }));
}

#[tokio::test]
async fn test_verify_column_description() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path(format!("{TABLES_PATH}/columns/col-1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<?xml version="1.0"?><tsResponse><column id="col-1" name="ID" description="Primary &amp; key"/></tsResponse>"#,
        ))
        .mount(&mock_server)
        .await;

    let description = client_for(&mock_server)
        .verify_column_description("tbl-luid", "col-1", &credentials())
        .await
        .unwrap();
    assert_eq!(description.as_deref(), Some("Primary & key"));
}

// ============================================================================
// Permission diagnostics
// ============================================================================

#[tokio::test]
async fn test_current_user() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3.17/sites/site-id/users/current"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<tsResponse><user id="user-id" name="a@x.com" siteRole="SiteAdministratorCreator" lastLogin="2024-05-01T10:00:00Z"/></tsResponse>"#,
        ))
        .mount(&mock_server)
        .await;

    let user = client_for(&mock_server)
        .current_user(&credentials())
        .await
        .unwrap();
    assert_eq!(user.name.as_deref(), Some("a@x.com"));
    assert_eq!(user.site_role.as_deref(), Some("SiteAdministratorCreator"));
    assert_eq!(user.last_login.as_deref(), Some("2024-05-01T10:00:00Z"));
}

#[tokio::test]
async fn test_site_status() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3.17/sites/site-id"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<tsResponse><site id="site-id" name="Site One" contentUrl="site1" state="Active"/></tsResponse>"#,
        ))
        .mount(&mock_server)
        .await;

    let site = client_for(&mock_server)
        .site_status(&credentials())
        .await
        .unwrap();
    assert_eq!(site.content_url.as_deref(), Some("site1"));
    assert_eq!(site.state.as_deref(), Some("Active"));
}

#[tokio::test]
async fn test_check_endpoint_access() {
    let mock_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/api/3.17/sites/site-id/tables"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<tsResponse/>"))
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/3.17/sites/site-id/databases"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let results = client_for(&mock_server)
        .check_endpoint_access(&credentials())
        .await;

    let summary: Vec<_> = results
        .iter()
        .map(|r| (r.name.as_str(), r.status, r.has_access))
        .collect();
    assert_eq!(
        summary,
        vec![
            ("tables", Some(200), true),
            ("databases", Some(403), false),
            ("metadata", Some(404), false),
        ]
    );
}
