//! Sync engine module
//!
//! One run goes through two phases:
//! - fetch: sign in to Tableau, check the dbt token, load the job's models
//!   and the catalog databases, then merge them. Any error here ends the run.
//! - publish: for each merged table, read its catalog columns and send the
//!   column and table descriptions. Failures are logged and recorded in the
//!   table's report, and the run moves on to the next table.
//!
//! The same fetch phase feeds exposure generation.

mod types;

pub use types::{
    Prepared, SyncOptions, SyncReport, TableOutcome, TableReport, DEFAULT_DATABASE,
};

use crate::dbt::DbtClient;
use crate::error::Result;
use crate::exposure::{generate_exposures, restore_upstream_names, ExposureDocument};
use crate::reconcile::{
    format_table_reference, merge, merge_columns, restore_full_model_name, MergedTable,
};
use crate::tableau::{Credentials, TableauClient};
use std::time::Instant;
use tracing::{error, info, warn};

/// Orchestrates a dbt to Tableau sync
#[derive(Debug)]
pub struct SyncEngine {
    dbt: DbtClient,
    tableau: TableauClient,
    options: SyncOptions,
}

impl SyncEngine {
    /// Create a new sync engine
    pub fn new(dbt: DbtClient, tableau: TableauClient, options: SyncOptions) -> Self {
        Self {
            dbt,
            tableau,
            options,
        }
    }

    /// Run options
    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Fetch phase: authenticate and build the merged tables
    pub async fn prepare(&self) -> Result<Prepared> {
        let credentials = self.tableau.authenticate().await?;
        self.dbt.get_account_id().await?;

        let models = self.dbt.get_models_for_job(self.options.job_id).await?;
        let databases = self
            .tableau
            .get_databases(&credentials, &self.options.databases)
            .await?;

        let mut tables = Vec::new();
        for database in databases {
            let database = restore_full_model_name(database);
            tables.extend(merge(&database, &database.tables, &models));
        }

        if tables.is_empty() {
            warn!(
                "No dbt model of job {} matched a table in {:?}",
                self.options.job_id, self.options.databases
            );
        }

        Ok(Prepared {
            credentials,
            models: models.len(),
            tables,
        })
    }

    /// Run a full sync and report per-table outcomes
    pub async fn run(&self) -> Result<SyncReport> {
        let start = Instant::now();
        info!("Starting sync for dbt job {}", self.options.job_id);

        let Prepared {
            credentials,
            models,
            tables,
        } = self.prepare().await?;

        let mut report = SyncReport {
            job_id: self.options.job_id,
            models,
            ..SyncReport::default()
        };
        for table in &tables {
            report.tables.push(self.publish_table(table, &credentials).await);
        }

        #[allow(clippy::cast_possible_truncation)]
        let duration_ms = start.elapsed().as_millis() as u64;
        report.duration_ms = duration_ms;

        let totals = report.column_totals();
        info!(
            "Sync complete: {} tables, {} columns published, {} column failures in {}ms",
            report.tables.len(),
            totals.success,
            totals.failure,
            report.duration_ms
        );
        Ok(report)
    }

    /// Publish the descriptions of one merged table.
    ///
    /// Never fails: problems are recorded in the returned report.
    pub async fn publish_table(&self, table: &MergedTable, credentials: &Credentials) -> TableReport {
        let reference = format_table_reference(table);
        let luid = table.luid.clone();

        if let Err(e) = table.require_luid() {
            warn!("Skipping {reference}: {e}");
            let reason = e.to_string();
            return TableReport::new(reference, luid, TableOutcome::Skipped { reason });
        }

        let columns = match self.tableau.get_column_metadata(table, credentials).await {
            Ok(columns) => columns,
            Err(e) => {
                error!("Failed to read columns of {reference}: {e}");
                let error = e.to_string();
                return TableReport::new(reference, luid, TableOutcome::Failed { error });
            }
        };

        if self.options.dry_run {
            let planned = merge_columns(&columns, &table.columns)
                .iter()
                .filter(|c| c.publishable().is_some())
                .count();
            info!("Dry run: would publish {planned} column descriptions for {reference}");
            return TableReport::new(reference, luid, TableOutcome::DryRun { columns: planned });
        }

        let mut report = TableReport::new(reference, luid, TableOutcome::Published);
        report.columns = self
            .tableau
            .publish_column_descriptions(table, &columns, credentials)
            .await;

        if !self.options.publish_table_descriptions {
            return report;
        }

        match table.require_description() {
            Ok(description) => match self
                .tableau
                .publish_table_description(table, description, credentials)
                .await
            {
                Ok(_) => report.table_description = true,
                Err(e) => {
                    error!("Failed to publish description of {}: {e}", report.table);
                    report.outcome = TableOutcome::Failed { error: e.to_string() };
                }
            },
            Err(e) => warn!("Not publishing table description: {e}"),
        }

        report
    }

    /// Build the exposures document for every merged table
    pub async fn exposures(&self, maturity: u8) -> Result<ExposureDocument> {
        let Prepared {
            credentials, tables, ..
        } = self.prepare().await?;

        let mut workbooks_by_table = Vec::with_capacity(tables.len());
        for table in &tables {
            match self.tableau.get_downstream_workbooks(table, &credentials).await {
                Ok(mut workbooks) => {
                    restore_upstream_names(&mut workbooks, &tables);
                    workbooks_by_table.push(workbooks);
                }
                Err(e) if !e.is_terminal() => {
                    warn!("Skipping {}: {e}", format_table_reference(table));
                }
                Err(e) => return Err(e),
            }
        }

        let config = self.tableau.config();
        Ok(generate_exposures(
            &workbooks_by_table,
            &config.server,
            &config.site,
            maturity,
        ))
    }
}
