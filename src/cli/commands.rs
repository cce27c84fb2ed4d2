//! CLI commands and argument parsing

use crate::exposure::EXPOSURES_DIR;
use crate::types::{EnvironmentId, JobId};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Sync dbt Cloud model documentation into the Tableau catalog
#[derive(Parser, Debug)]
#[command(name = "dbt-tableau-sync")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Publish dbt table and column descriptions to Tableau
    Sync {
        /// dbt Cloud job whose latest run provides the models
        #[arg(short, long)]
        job_id: JobId,

        /// Tableau catalog database to match (repeatable)
        #[arg(short, long = "database")]
        databases: Vec<String>,

        /// Match and report without publishing anything
        #[arg(long)]
        dry_run: bool,

        /// Publish column descriptions only
        #[arg(long)]
        skip_table_descriptions: bool,
    },

    /// Write dbt exposures for workbooks downstream of the synced tables
    Exposures {
        /// dbt Cloud job whose latest run provides the models
        #[arg(short, long)]
        job_id: JobId,

        /// Tableau catalog database to match (repeatable)
        #[arg(short, long = "database")]
        databases: Vec<String>,

        /// dbt project name, used in the file name
        #[arg(short, long)]
        project: String,

        /// Exposure maturity level
        #[arg(long, default_value = "1")]
        maturity: u8,

        /// Directory to write the exposures file to
        #[arg(short, long, default_value = EXPOSURES_DIR)]
        output_dir: PathBuf,
    },

    /// List the models of a job's latest run
    Models {
        /// dbt Cloud job id
        #[arg(short, long)]
        job_id: JobId,
    },

    /// List dbt Cloud jobs
    Jobs {
        /// Only jobs in these environments (repeatable)
        #[arg(short, long = "environment")]
        environments: Vec<EnvironmentId>,
    },

    /// List dbt Cloud projects
    Projects,

    /// Check Tableau sign-in and catalog permissions
    Check,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one document per line)
    Json,
    /// Human-readable output
    Pretty,
}
