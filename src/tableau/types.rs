//! Tableau record types
//!
//! Field names follow the Metadata API (camelCase) so records deserialize
//! straight out of GraphQL responses.

use crate::auth::AuthConfig;
use crate::types::null_as_default;
use serde::{Deserialize, Serialize};

/// Session credentials returned by sign-in
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub token: String,
    pub site_id: String,
    pub user_id: String,
}

impl Credentials {
    /// Auth config attaching the session token to a request
    pub fn auth(&self) -> AuthConfig {
        AuthConfig::tableau_session(&self.token)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("token", &"***")
            .field("site_id", &self.site_id)
            .field("user_id", &self.user_id)
            .finish()
    }
}

/// Catalog database with its tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Database {
    pub name: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<Table>,
}

/// Catalog table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    #[serde(default, deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub schema: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub luid: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<Column>,
}

impl Table {
    /// Minimal table, used when building fixtures
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: schema.into(),
            id: None,
            luid: None,
            full_name: None,
            columns: Vec::new(),
        }
    }

    /// Set the LUID
    #[must_use]
    pub fn with_luid(mut self, luid: impl Into<String>) -> Self {
        self.luid = Some(luid.into());
        self
    }
}

/// Catalog column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Column {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub luid: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub remote_type: Option<String>,
    #[serde(default)]
    pub is_nullable: Option<bool>,
}

/// Workbook tag
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tag {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
}

/// Workbook owner
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkbookOwner {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    /// Tableau usernames are email addresses
    #[serde(default)]
    pub username: Option<String>,
}

/// Table a workbook reads from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UpstreamTable {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub luid: Option<String>,
    pub name: String,
}

/// Workbook downstream of a catalog table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Workbook {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub luid: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub project_name: Option<String>,
    #[serde(default)]
    pub vizportal_url_id: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<Tag>,
    #[serde(default)]
    pub owner: Option<WorkbookOwner>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub upstream_tables: Vec<UpstreamTable>,
}

/// Signed-in user, from `users/current`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub site_role: Option<String>,
    #[serde(default)]
    pub last_login: Option<String>,
}

/// Site the session is bound to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteInfo {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub content_url: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

/// Result of probing one REST endpoint
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointAccess {
    pub name: String,
    pub status: Option<u16>,
    pub has_access: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
