//! Merged record types

use crate::dbt::{Model, ModelColumn};
use crate::error::{Error, Result};
use crate::tableau::Table;
use crate::types::{Fqn, JsonObject};
use serde::{Deserialize, Serialize};

/// A Tableau table joined with the dbt model that builds it.
///
/// Identifiers come from Tableau; documentation comes from dbt. The LUID and
/// description are needed for write-back but are checked when publishing,
/// not here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedTable {
    pub name: String,
    pub schema: String,
    pub database: String,
    pub id: Option<String>,
    pub luid: Option<String>,
    pub full_name: Option<String>,
    pub description: Option<String>,
    pub meta: Option<JsonObject>,
    pub package_name: Option<String>,
    pub unique_id: Option<String>,
    pub alias: Option<String>,
    pub columns: Vec<ModelColumn>,
}

impl MergedTable {
    /// Combine a catalog table of `database` with its model
    pub fn from_parts(database: &str, table: &Table, model: &Model) -> Self {
        Self {
            name: table.name.clone(),
            schema: table.schema.clone(),
            database: database.to_string(),
            id: table.id.clone(),
            luid: table.luid.clone(),
            full_name: table.full_name.clone(),
            description: model.description.clone(),
            meta: model.meta.clone(),
            package_name: model.package_name.clone(),
            unique_id: model.unique_id.clone(),
            alias: model.alias.clone(),
            columns: model.columns.clone(),
        }
    }

    /// Normalized join key
    pub fn fqn(&self) -> Fqn {
        Fqn::new(&self.database, &self.schema, &self.name)
    }

    /// LUID, or `MissingField` when the catalog did not return one
    pub fn require_luid(&self) -> Result<&str> {
        self.luid
            .as_deref()
            .filter(|luid| !luid.is_empty())
            .ok_or_else(|| Error::missing_field(&self.name, "luid"))
    }

    /// Non-blank dbt description, or `MissingField`
    pub fn require_description(&self) -> Result<&str> {
        self.description
            .as_deref()
            .filter(|d| !d.trim().is_empty())
            .ok_or_else(|| Error::missing_field(&self.name, "description"))
    }
}

/// A catalog column paired with the dbt documentation for it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishColumn {
    pub name: Option<String>,
    pub luid: Option<String>,
    pub description: Option<String>,
}

impl PublishColumn {
    /// `(name, luid, description)` when all three are present and non-blank
    pub fn publishable(&self) -> Option<(&str, &str, &str)> {
        Some((
            non_blank(&self.name)?,
            non_blank(&self.luid)?,
            non_blank(&self.description)?,
        ))
    }
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|s| !s.trim().is_empty())
}
