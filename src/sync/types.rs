//! Sync engine types
//!
//! Run options and the per-table report produced by a sync.

use crate::error::{Error, Result};
use crate::reconcile::MergedTable;
use crate::tableau::Credentials;
use crate::types::{JobId, PublishCounts};
use serde::Serialize;

/// Catalog database synced when none is given
pub const DEFAULT_DATABASE: &str = "PRODUCTION";

/// Options for one sync run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncOptions {
    /// dbt Cloud job whose latest run provides the models
    pub job_id: JobId,
    /// Tableau catalog databases to match against
    pub databases: Vec<String>,
    /// Fetch and match everything but publish nothing
    pub dry_run: bool,
    /// Also publish the table-level description
    pub publish_table_descriptions: bool,
}

impl SyncOptions {
    /// Options for `job_id` with the defaults
    pub fn new(job_id: JobId) -> Self {
        Self {
            job_id,
            databases: vec![DEFAULT_DATABASE.to_string()],
            dry_run: false,
            publish_table_descriptions: true,
        }
    }

    /// Set the catalog databases
    #[must_use]
    pub fn with_databases(mut self, databases: Vec<String>) -> Self {
        if !databases.is_empty() {
            self.databases = databases;
        }
        self
    }

    /// Set dry-run mode
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Enable or disable table description publishing
    #[must_use]
    pub fn with_table_descriptions(mut self, publish: bool) -> Self {
        self.publish_table_descriptions = publish;
        self
    }
}

/// Output of the fetch phase: a session and the matched tables
#[derive(Debug, Clone)]
pub struct Prepared {
    pub credentials: Credentials,
    /// Number of models returned for the job
    pub models: usize,
    pub tables: Vec<MergedTable>,
}

/// What happened to one merged table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableOutcome {
    /// Descriptions were sent; column failures are in the counts
    Published,
    /// Nothing to send for this table
    Skipped { reason: String },
    /// A request for this table failed
    Failed { error: String },
    /// Dry run: number of columns that would have been published
    DryRun { columns: usize },
}

/// Result of syncing one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TableReport {
    /// `[DATABASE].[SCHEMA].[TABLE]`
    pub table: String,
    pub luid: Option<String>,
    pub columns: PublishCounts,
    pub table_description: bool,
    pub outcome: TableOutcome,
}

impl TableReport {
    pub(crate) fn new(table: String, luid: Option<String>, outcome: TableOutcome) -> Self {
        Self {
            table,
            luid,
            columns: PublishCounts::default(),
            table_description: false,
            outcome,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, TableOutcome::Failed { .. })
    }
}

/// Result of a whole sync run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub job_id: JobId,
    pub models: usize,
    pub tables: Vec<TableReport>,
    pub duration_ms: u64,
}

impl SyncReport {
    /// Column counts summed over all tables
    pub fn column_totals(&self) -> PublishCounts {
        let mut totals = PublishCounts::default();
        for table in &self.tables {
            totals += table.columns;
        }
        totals
    }

    /// Number of tables whose outcome matches `predicate`
    pub fn count(&self, predicate: impl Fn(&TableOutcome) -> bool) -> usize {
        self.tables.iter().filter(|t| predicate(&t.outcome)).count()
    }

    /// Whether any table failed or any column write failed
    pub fn has_failures(&self) -> bool {
        self.tables.iter().any(TableReport::is_failed) || self.column_totals().failure > 0
    }

    /// `Err(PublishFailures)` when anything failed, so the CLI exits non-zero
    pub fn ensure_success(&self) -> Result<()> {
        if !self.has_failures() {
            return Ok(());
        }
        Err(Error::PublishFailures {
            tables: self.count(|o| matches!(o, TableOutcome::Failed { .. })),
            columns: self.column_totals().failure,
        })
    }
}
