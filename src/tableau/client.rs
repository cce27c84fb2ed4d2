//! Tableau REST and Metadata API client

use super::payload::{column_description_payload, table_description_payload};
use super::queries::{databases_query, downstream_workbooks_query, COLUMNS_QUERY};
use super::types::{Column, Credentials, Database, EndpointAccess, SiteInfo, UserInfo, Workbook};
use crate::config::TableauConfig;
use crate::decode::{graphql_request, GraphQlDecoder, RecordDecoder, XmlDecoder};
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use crate::reconcile::{format_table_reference, merge_columns, MergedTable};
use crate::types::PublishCounts;
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};

/// Metadata API endpoint, relative to the server
pub const METADATA_GRAPHQL_PATH: &str = "/api/metadata/graphql";

const XML: &str = "application/xml";

/// Client for one Tableau site
#[derive(Debug)]
pub struct TableauClient {
    http: HttpClient,
    config: TableauConfig,
}

impl TableauClient {
    /// Create a client from configuration
    pub fn new(config: TableauConfig) -> Result<Self> {
        let http_config = HttpClientConfig::builder()
            .base_url(config.server.clone())
            .build();

        Ok(Self {
            http: HttpClient::with_config(http_config)?,
            config,
        })
    }

    /// Client configuration
    pub fn config(&self) -> &TableauConfig {
        &self.config
    }

    fn rest_path(&self, path: &str) -> String {
        format!("/api/{}/{}", self.config.api_version, path.trim_start_matches('/'))
    }

    // ========================================================================
    // Authentication
    // ========================================================================

    /// Sign in with the configured personal access token
    pub async fn authenticate(&self) -> Result<Credentials> {
        self.sign_in(
            &self.config.site,
            &self.config.pat_name,
            &self.config.pat_secret,
        )
        .await
    }

    /// Sign in to `site_name` with a personal access token
    pub async fn sign_in(
        &self,
        site_name: &str,
        token_name: &str,
        token_secret: &str,
    ) -> Result<Credentials> {
        let path = self.rest_path("auth/signin");
        info!("Authenticating with Tableau server url: {}", self.http.build_url(&path));

        let body = json!({
            "credentials": {
                "personalAccessTokenName": token_name,
                "personalAccessTokenSecret": token_secret,
                "site": {"contentUrl": site_name}
            }
        });
        let config = RequestConfig::new()
            .header("Accept", "application/json")
            .json(body);

        let response: SignInResponse = self
            .http
            .send_json(Method::POST, &path, config)
            .await
            .map_err(|e| match e {
                Error::HttpStatus { status, body } => {
                    Error::auth(format!("Tableau sign-in failed ({status}): {body}"))
                }
                e if e.is_parse() => Error::auth(format!("Malformed sign-in response: {e}")),
                e => e,
            })
            .inspect_err(|e| error!("Error authenticating with Tableau: {e}"))?;

        let credentials = response.into_credentials()?;
        info!("Tableau user ID: {}", credentials.user_id);
        Ok(credentials)
    }

    // ========================================================================
    // Metadata API
    // ========================================================================

    /// Snowflake databases named in `names`, with their tables
    pub async fn get_databases(
        &self,
        credentials: &Credentials,
        names: &[String],
    ) -> Result<Vec<Database>> {
        let databases: Vec<Database> = self
            .graphql(credentials, &databases_query(names), None, "data.databases")
            .await?;
        info!("Retrieved {} Tableau databases", databases.len());
        Ok(databases)
    }

    /// Workbooks that read from `table`
    pub async fn get_downstream_workbooks(
        &self,
        table: &MergedTable,
        credentials: &Credentials,
    ) -> Result<Vec<Workbook>> {
        let luid = table.require_luid()?;
        info!(
            "Getting downstream workbooks for table: {}",
            format_table_reference(table)
        );

        let workbooks: Vec<Workbook> = self
            .graphql(
                credentials,
                &downstream_workbooks_query(luid),
                None,
                "data.databaseTables[0].downstreamWorkbooks",
            )
            .await?;
        info!("Retrieved {} downstream Tableau workbooks", workbooks.len());
        Ok(workbooks)
    }

    /// Catalog columns of `table`
    pub async fn get_column_metadata(
        &self,
        table: &MergedTable,
        credentials: &Credentials,
    ) -> Result<Vec<Column>> {
        let luid = table.require_luid()?;

        let columns: Vec<Column> = self
            .graphql(
                credentials,
                COLUMNS_QUERY,
                Some(json!({"luid": luid})),
                "data.databaseTables[0].columns",
            )
            .await?;
        info!("Retrieved {} columns for table {}", columns.len(), table.name);
        Ok(columns)
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        credentials: &Credentials,
        query: &str,
        variables: Option<Value>,
        records_path: &str,
    ) -> Result<Vec<T>> {
        let config = RequestConfig::new()
            .header("Accept", "application/json")
            .json(graphql_request(query, variables))
            .auth(credentials.auth());

        let body = self
            .http
            .send_text(Method::POST, METADATA_GRAPHQL_PATH, config)
            .await
            .inspect_err(|e| error!("Tableau Metadata API request failed: {e}"))?;

        GraphQlDecoder::with_path(records_path)
            .decode_as(&body)
            .inspect_err(|e| error!("Invalid Tableau Metadata API response: {e}"))
    }

    // ========================================================================
    // Publishing
    // ========================================================================

    /// Publish dbt column descriptions onto the matching catalog columns.
    ///
    /// Columns without a name, LUID or description are skipped and counted as
    /// neither success nor failure. A failed column never stops the batch.
    pub async fn publish_column_descriptions(
        &self,
        table: &MergedTable,
        columns: &[Column],
        credentials: &Credentials,
    ) -> PublishCounts {
        let reference = format_table_reference(table);
        let mut counts = PublishCounts::default();

        let Some(table_luid) = table.luid.as_deref() else {
            warn!("Skipping column descriptions for {reference}: table has no LUID");
            return counts;
        };

        info!("Publishing Tableau column descriptions for table: {reference}");

        for column in merge_columns(columns, &table.columns) {
            let Some((name, luid, description)) = column.publishable() else {
                warn!(
                    "Skipping column {}: Missing required fields",
                    column.name.as_deref().unwrap_or("Unknown")
                );
                continue;
            };

            let path = self.rest_path(&format!(
                "sites/{}/tables/{table_luid}/columns/{luid}",
                credentials.site_id
            ));
            let payload = column_description_payload(description);
            debug!("Payload: {payload}");

            match self.put_xml(&path, payload, credentials).await {
                Ok(status) if status == StatusCode::OK => {
                    info!("Successfully updated column {name}");
                    counts.record_success();
                }
                Ok(status) => {
                    warn!("Unexpected status code {} for column {name}", status.as_u16());
                    counts.record_failure();
                }
                Err(e) => {
                    error!("Error updating column {name}: {e}");
                    counts.record_failure();
                }
            }
        }

        info!("Completed publishing descriptions for {reference}");
        info!("Success: {}, Failures: {}", counts.success, counts.failure);
        counts
    }

    /// Publish `text` as the description of `table`, returning the response body
    ///
    /// Any status other than 200 is an error, matching how column writes
    /// are counted.
    pub async fn publish_table_description(
        &self,
        table: &MergedTable,
        text: &str,
        credentials: &Credentials,
    ) -> Result<String> {
        let luid = table.require_luid()?;
        let path = self.rest_path(&format!("sites/{}/tables/{luid}", credentials.site_id));

        let config = RequestConfig::new()
            .header("Accept", XML)
            .text(table_description_payload(text), XML)
            .auth(credentials.auth());

        let (status, body) = self
            .http
            .send_for_body(Method::PUT, &path, config)
            .await
            .inspect_err(|e| error!("Failed to update table description: {e}"))?;

        if status != StatusCode::OK {
            warn!(
                "Unexpected status code {} for table {}",
                status.as_u16(),
                table.name
            );
            return Err(Error::http_status(status.as_u16(), body));
        }

        info!("Updated description for table {}", format_table_reference(table));
        Ok(body)
    }

    async fn put_xml(
        &self,
        path: &str,
        payload: String,
        credentials: &Credentials,
    ) -> Result<StatusCode> {
        let config = RequestConfig::new()
            .header("Accept", XML)
            .text(payload, XML)
            .auth(credentials.auth());
        let response = self.http.send(Method::PUT, path, config).await?;
        Ok(response.status())
    }

    /// Current description of a catalog column, read back through REST
    pub async fn verify_column_description(
        &self,
        table_luid: &str,
        column_luid: &str,
        credentials: &Credentials,
    ) -> Result<Option<String>> {
        let path = self.rest_path(&format!(
            "sites/{}/tables/{table_luid}/columns/{column_luid}",
            credentials.site_id
        ));
        let record = self.get_xml_record(&path, "column", credentials).await?;
        Ok(record
            .and_then(|r| r.get("description").and_then(Value::as_str).map(String::from)))
    }

    // ========================================================================
    // Permission diagnostics
    // ========================================================================

    /// Name, site role and last login of the signed-in user
    pub async fn current_user(&self, credentials: &Credentials) -> Result<UserInfo> {
        let path = self.rest_path(&format!("sites/{}/users/current", credentials.site_id));
        info!("Checking user info at: {}", self.http.build_url(&path));

        let record = self
            .get_xml_record(&path, "user", credentials)
            .await?
            .ok_or_else(|| Error::decode("No user information found in response"))?;
        Ok(serde_json::from_value(record)?)
    }

    /// Settings of the site the session is bound to
    pub async fn site_status(&self, credentials: &Credentials) -> Result<SiteInfo> {
        let path = self.rest_path(&format!("sites/{}", credentials.site_id));
        info!("Checking site status at: {}", self.http.build_url(&path));

        let record = self
            .get_xml_record(&path, "site", credentials)
            .await?
            .ok_or_else(|| Error::decode("No site information found in response"))?;
        Ok(serde_json::from_value(record)?)
    }

    /// Probe the catalog REST endpoints the sync depends on
    pub async fn check_endpoint_access(&self, credentials: &Credentials) -> Vec<EndpointAccess> {
        let mut results = Vec::new();

        for name in ["tables", "databases", "metadata"] {
            let path = self.rest_path(&format!("sites/{}/{name}", credentials.site_id));
            info!("Checking {name} endpoint at: {}", self.http.build_url(&path));

            let config = RequestConfig::new()
                .header("Accept", XML)
                .auth(credentials.auth());
            let access = match self.http.send(Method::GET, &path, config).await {
                Ok(response) => EndpointAccess {
                    name: name.to_string(),
                    status: Some(response.status().as_u16()),
                    has_access: response.status() == StatusCode::OK,
                    error: None,
                },
                Err(Error::HttpStatus { status, .. }) => EndpointAccess {
                    name: name.to_string(),
                    status: Some(status),
                    has_access: false,
                    error: None,
                },
                Err(e) => EndpointAccess {
                    name: name.to_string(),
                    status: None,
                    has_access: false,
                    error: Some(e.to_string()),
                },
            };
            results.push(access);
        }

        results
    }

    async fn get_xml_record(
        &self,
        path: &str,
        element: &str,
        credentials: &Credentials,
    ) -> Result<Option<Value>> {
        let config = RequestConfig::new()
            .header("Accept", XML)
            .auth(credentials.auth());
        let body = self
            .http
            .send_text(Method::GET, path, config)
            .await
            .inspect_err(|e| error!("Request error: {e}"))?;
        debug!("Response text: {body}");

        Ok(XmlDecoder::with_element(element)
            .decode(&body)?
            .into_iter()
            .next())
    }
}

// ============================================================================
// Sign-in wire format
// ============================================================================

#[derive(Debug, Deserialize)]
struct SignInResponse {
    #[serde(default)]
    credentials: Option<SignInCredentials>,
    #[serde(default)]
    error: Option<Value>,
    #[serde(default)]
    errors: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct SignInCredentials {
    token: String,
    site: IdRef,
    user: IdRef,
}

#[derive(Debug, Deserialize)]
struct IdRef {
    id: String,
}

impl SignInResponse {
    fn into_credentials(self) -> Result<Credentials> {
        if let Some(message) = self
            .errors
            .as_ref()
            .and_then(|errors| errors.first())
            .or(self.error.as_ref())
            .map(error_message)
        {
            return Err(Error::auth(message));
        }

        let creds = self
            .credentials
            .ok_or_else(|| Error::auth("Sign-in response has no credentials"))?;
        Ok(Credentials {
            token: creds.token,
            site_id: creds.site.id,
            user_id: creds.user.id,
        })
    }
}

fn error_message(error: &Value) -> String {
    ["message", "detail", "summary"]
        .iter()
        .find_map(|key| error.get(*key).and_then(Value::as_str))
        .map_or_else(|| error.to_string(), String::from)
}
