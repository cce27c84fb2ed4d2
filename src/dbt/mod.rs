//! dbt Cloud client module
//!
//! Two APIs are involved:
//! - the Admin REST API (accounts, projects, jobs), authenticated with
//!   `Authorization: Token {key}`
//! - the Discovery GraphQL API, queried once per job for model metadata
//!
//! Every failure here is terminal for the run.

mod client;
mod types;

pub use client::{models_query, DbtClient, DISCOVERY_TIMEOUT};
pub use types::{Account, Job, Model, ModelColumn, ModelStat, Project};

#[cfg(test)]
mod tests;
