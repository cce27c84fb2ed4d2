//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{DbtConfig, SyncConfig, TableauConfig};
use crate::dbt::DbtClient;
use crate::error::Result;
use crate::exposure::write_exposures;
use crate::sync::{SyncEngine, SyncOptions, SyncReport, TableOutcome};
use crate::tableau::TableauClient;
use crate::types::{EnvironmentId, JobId};
use serde::Serialize;
use serde_json::json;
use std::path::Path;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Sync {
                job_id,
                databases,
                dry_run,
                skip_table_descriptions,
            } => {
                let options = SyncOptions::new(*job_id)
                    .with_databases(databases.clone())
                    .with_dry_run(*dry_run)
                    .with_table_descriptions(!skip_table_descriptions);
                self.sync(options).await
            }
            Commands::Exposures {
                job_id,
                databases,
                project,
                maturity,
                output_dir,
            } => {
                let options = SyncOptions::new(*job_id).with_databases(databases.clone());
                self.exposures(options, project, *maturity, output_dir).await
            }
            Commands::Models { job_id } => self.models(*job_id).await,
            Commands::Jobs { environments } => self.jobs(environments).await,
            Commands::Projects => self.projects().await,
            Commands::Check => self.check().await,
        }
    }

    fn engine(options: SyncOptions) -> Result<SyncEngine> {
        let config = SyncConfig::from_env()?;
        Ok(SyncEngine::new(
            DbtClient::new(&config.dbt)?,
            TableauClient::new(config.tableau)?,
            options,
        ))
    }

    fn dbt_client() -> Result<DbtClient> {
        DbtClient::new(&DbtConfig::from_env()?)
    }

    /// Publish descriptions; any failed write makes the command fail
    async fn sync(&self, options: SyncOptions) -> Result<()> {
        let report = Self::engine(options)?.run().await?;

        match self.cli.format {
            OutputFormat::Json => self.output(&report),
            OutputFormat::Pretty => print_report(&report),
        }
        report.ensure_success()
    }

    /// Generate and write the exposures file
    async fn exposures(
        &self,
        options: SyncOptions,
        project: &str,
        maturity: u8,
        output_dir: &Path,
    ) -> Result<()> {
        let document = Self::engine(options)?.exposures(maturity).await?;
        let path = write_exposures(&document, output_dir, project)?;

        self.output(&json!({
            "path": path.display().to_string(),
            "exposures": document.exposures.len(),
        }));
        Ok(())
    }

    /// List models of a job
    async fn models(&self, job_id: JobId) -> Result<()> {
        let models = Self::dbt_client()?.get_models_for_job(job_id).await?;

        let rows: Vec<_> = models
            .iter()
            .map(|m| {
                json!({
                    "unique_id": m.unique_id,
                    "fqn": format!("{}.{}.{}", m.database, m.schema, m.name),
                    "status": m.status,
                    "documented_columns": m.columns.iter().filter(|c| c.description.is_some()).count(),
                    "columns": m.columns.len(),
                })
            })
            .collect();
        self.output(&rows);
        Ok(())
    }

    /// List jobs, optionally filtered by environment
    async fn jobs(&self, environments: &[EnvironmentId]) -> Result<()> {
        let client = Self::dbt_client()?;
        let account_id = client.get_account_id().await?;

        let filter = (!environments.is_empty()).then_some(environments);
        let jobs = client.get_jobs(account_id, filter).await?;
        self.output(&jobs);
        Ok(())
    }

    /// List projects
    async fn projects(&self) -> Result<()> {
        let client = Self::dbt_client()?;
        let account_id = client.get_account_id().await?;
        let projects = client.get_projects(account_id).await?;
        self.output(&projects);
        Ok(())
    }

    /// Tableau permission diagnostics
    async fn check(&self) -> Result<()> {
        let client = TableauClient::new(TableauConfig::from_env()?)?;
        let credentials = client.authenticate().await?;
        info!("Signed in to Tableau site {}", credentials.site_id);

        let user = client.current_user(&credentials).await;
        let site = client.site_status(&credentials).await;
        let endpoints = client.check_endpoint_access(&credentials).await;

        self.output(&json!({
            "user": user.as_ref().ok(),
            "user_error": user.as_ref().err().map(ToString::to_string),
            "site": site.as_ref().ok(),
            "site_error": site.as_ref().err().map(ToString::to_string),
            "endpoints": endpoints,
        }));
        Ok(())
    }

    /// Output a serializable value in the selected format
    fn output<T: Serialize + ?Sized>(&self, value: &T) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(value).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
            }
        }
    }
}

fn print_report(report: &SyncReport) {
    for table in &report.tables {
        match &table.outcome {
            TableOutcome::Published => println!(
                "{}: {} succeeded, {} failed{}",
                table.table,
                table.columns.success,
                table.columns.failure,
                if table.table_description {
                    ", table description updated"
                } else {
                    ""
                }
            ),
            TableOutcome::DryRun { columns } => {
                println!("{}: would publish {columns} column descriptions", table.table);
            }
            TableOutcome::Skipped { reason } => println!("{}: skipped ({reason})", table.table),
            TableOutcome::Failed { error } => println!("{}: failed ({error})", table.table),
        }
    }

    let totals = report.column_totals();
    println!(
        "\n{} models, {} matched tables, {} columns published, {} failures ({}ms)",
        report.models,
        report.tables.len(),
        totals.success,
        totals.failure,
        report.duration_ms
    );
}
