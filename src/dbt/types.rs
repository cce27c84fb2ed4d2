//! dbt Cloud record types

use crate::types::{null_as_default, AccountId, EnvironmentId, JobId, JsonObject, JsonValue};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// dbt Cloud account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    #[serde(default)]
    pub name: Option<String>,
}

/// dbt Cloud project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
}

/// dbt Cloud job definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: JobId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub environment_id: Option<EnvironmentId>,
    #[serde(default)]
    pub project_id: Option<u64>,
}

/// Column documentation attached to a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelColumn {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// Single run statistic of a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelStat {
    pub id: String,
    #[serde(default)]
    pub value: JsonValue,
}

/// Model metadata from the Discovery API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[serde(default)]
    pub unique_id: Option<String>,
    #[serde(default)]
    pub package_name: Option<String>,
    #[serde(default)]
    pub run_id: Option<u64>,
    #[serde(default)]
    pub account_id: Option<AccountId>,
    #[serde(default)]
    pub project_id: Option<u64>,
    #[serde(default)]
    pub environment_id: Option<EnvironmentId>,
    #[serde(default)]
    pub job_id: Option<JobId>,
    /// Seconds spent executing the model
    #[serde(default)]
    pub execution_time: Option<f64>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub execute_completed_at: Option<DateTime<Utc>>,
    pub database: String,
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub meta: Option<JsonObject>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<ModelColumn>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stats: Vec<ModelStat>,
}

impl Model {
    /// Minimal model, used when building fixtures
    pub fn new(database: impl Into<String>, schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            unique_id: None,
            package_name: None,
            run_id: None,
            account_id: None,
            project_id: None,
            environment_id: None,
            job_id: None,
            execution_time: None,
            status: None,
            execute_completed_at: None,
            database: database.into(),
            schema: schema.into(),
            name: name.into(),
            alias: None,
            description: None,
            meta: None,
            columns: Vec::new(),
            stats: Vec::new(),
        }
    }

    /// Set the model description
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Add a documented column
    #[must_use]
    pub fn with_column(mut self, name: impl Into<String>, description: Option<&str>) -> Self {
        self.columns.push(ModelColumn {
            name: name.into(),
            description: description.map(String::from),
        });
        self
    }
}
