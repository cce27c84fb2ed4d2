//! Common types used throughout dbt-tableau-sync
//!
//! Shared type aliases and the small identifier types that travel between
//! the dbt and Tableau halves of a run.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

// ============================================================================
// Type Aliases
// ============================================================================

/// JSON value type (re-exported from serde_json)
pub type JsonValue = serde_json::Value;

/// JSON object type
pub type JsonObject = serde_json::Map<String, JsonValue>;

/// Deserialize an explicit JSON `null` as the type's default.
///
/// The GraphQL APIs return `null` rather than `[]` for empty lists.
pub fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// ============================================================================
// Identifiers
// ============================================================================

/// dbt Cloud account identifier
pub type AccountId = u64;

/// dbt Cloud job identifier
pub type JobId = u64;

/// dbt Cloud environment identifier
pub type EnvironmentId = u64;

/// Lower-cased `database.schema.name` triple used to join dbt models and
/// Tableau tables.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Fqn {
    pub database: String,
    pub schema: String,
    pub name: String,
}

impl Fqn {
    /// Build a normalized FQN from its parts
    pub fn new(database: &str, schema: &str, name: &str) -> Self {
        Self {
            database: database.trim().to_lowercase(),
            schema: schema.trim().to_lowercase(),
            name: name.trim().to_lowercase(),
        }
    }
}

impl fmt::Display for Fqn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.database, self.schema, self.name)
    }
}

// ============================================================================
// Publish Outcome
// ============================================================================

/// Success/failure tally of a batch of description writes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishCounts {
    pub success: usize,
    pub failure: usize,
}

impl PublishCounts {
    /// Create new counts
    pub fn new(success: usize, failure: usize) -> Self {
        Self { success, failure }
    }

    /// Record one successful write
    pub fn record_success(&mut self) {
        self.success += 1;
    }

    /// Record one failed write
    pub fn record_failure(&mut self) {
        self.failure += 1;
    }

    /// Total number of attempted writes
    pub fn attempted(&self) -> usize {
        self.success + self.failure
    }
}

impl std::ops::AddAssign for PublishCounts {
    fn add_assign(&mut self, rhs: Self) {
        self.success += rhs.success;
        self.failure += rhs.failure;
    }
}
