//! CLI module
//!
//! Command-line interface for running syncs.
//!
//! # Commands
//!
//! - `sync` - Publish dbt descriptions to the Tableau catalog
//! - `exposures` - Write dbt exposures for downstream workbooks
//! - `models` - List the models of a job
//! - `jobs` - List jobs, optionally by environment
//! - `projects` - List projects
//! - `check` - Diagnose Tableau permissions

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
