//! Run configuration
//!
//! Settings are read once from the environment (and a `.env` file when one
//! exists) and passed explicitly into the client constructors.
//!
//! | Variable              | Used by | Required |
//! |-----------------------|---------|----------|
//! | `API_BASE_URL`        | dbt     | yes      |
//! | `METADATA_API_URL`    | dbt     | yes      |
//! | `DBT_API_PAT`         | dbt     | yes      |
//! | `TABLEAU_SERVER`      | Tableau | yes      |
//! | `TABLEAU_SITE`        | Tableau | yes      |
//! | `TABLEAU_PAT_NAME`    | Tableau | yes      |
//! | `TABLEAU_PAT`         | Tableau | yes      |
//! | `TABLEAU_API_VERSION` | Tableau | no       |

use crate::error::{Error, Result};
use std::fmt;

/// Tableau REST API version used when `TABLEAU_API_VERSION` is unset
pub const DEFAULT_TABLEAU_API_VERSION: &str = "3.17";

// ============================================================================
// dbt
// ============================================================================

/// dbt Cloud connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct DbtConfig {
    /// Admin API accounts endpoint, e.g. `https://cloud.getdbt.com/api/v2/accounts`
    pub api_base_url: String,
    /// Discovery GraphQL endpoint
    pub metadata_api_url: String,
    /// Service or personal access token
    pub api_token: String,
}

impl DbtConfig {
    /// Read the dbt settings through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            api_base_url: required(&lookup, "API_BASE_URL")?,
            metadata_api_url: required(&lookup, "METADATA_API_URL")?,
            api_token: required(&lookup, "DBT_API_PAT")?,
        })
    }

    /// Read the dbt settings from the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(env_lookup)
    }
}

impl fmt::Debug for DbtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbtConfig")
            .field("api_base_url", &self.api_base_url)
            .field("metadata_api_url", &self.metadata_api_url)
            .field("api_token", &"***")
            .finish()
    }
}

// ============================================================================
// Tableau
// ============================================================================

/// Tableau Server / Cloud connection settings
#[derive(Clone, PartialEq, Eq)]
pub struct TableauConfig {
    /// Server base URL, e.g. `https://10ax.online.tableau.com`
    pub server: String,
    /// Site content URL
    pub site: String,
    /// Personal access token name
    pub pat_name: String,
    /// Personal access token secret
    pub pat_secret: String,
    /// REST API version
    pub api_version: String,
}

impl TableauConfig {
    /// Read the Tableau settings through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let server = required(&lookup, "TABLEAU_SERVER")?;
        url::Url::parse(&server)
            .map_err(|e| Error::config(format!("TABLEAU_SERVER is not a valid URL: {e}")))?;

        Ok(Self {
            server: server.trim_end_matches('/').to_string(),
            site: required(&lookup, "TABLEAU_SITE")?,
            pat_name: required(&lookup, "TABLEAU_PAT_NAME")?,
            pat_secret: required(&lookup, "TABLEAU_PAT")?,
            api_version: optional(&lookup, "TABLEAU_API_VERSION")
                .unwrap_or_else(|| DEFAULT_TABLEAU_API_VERSION.to_string()),
        })
    }

    /// Read the Tableau settings from the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(env_lookup)
    }
}

impl fmt::Debug for TableauConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TableauConfig")
            .field("server", &self.server)
            .field("site", &self.site)
            .field("pat_name", &self.pat_name)
            .field("pat_secret", &"***")
            .field("api_version", &self.api_version)
            .finish()
    }
}

// ============================================================================
// Full run
// ============================================================================

/// Settings for a full sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncConfig {
    pub dbt: DbtConfig,
    pub tableau: TableauConfig,
}

impl SyncConfig {
    /// Read all settings through `lookup`
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            dbt: DbtConfig::from_lookup(&lookup)?,
            tableau: TableauConfig::from_lookup(&lookup)?,
        })
    }

    /// Read all settings from the process environment
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(env_lookup)
    }
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn optional(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<String> {
    optional(lookup, key).ok_or_else(|| Error::missing_config(key))
}
