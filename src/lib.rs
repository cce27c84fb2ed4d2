//! # dbt-tableau-sync
//!
//! Publishes dbt Cloud model documentation into the Tableau catalog.
//!
//! ## Features
//!
//! - **dbt Cloud**: accounts, projects and jobs from the Admin API, model
//!   metadata from the Discovery API
//! - **Tableau**: PAT sign-in, catalog databases, columns and downstream
//!   workbooks from the Metadata API
//! - **Reconciliation**: joins models and tables on `database.schema.name`
//! - **Publishing**: table and column descriptions written back over REST
//! - **Exposures**: dbt exposure YAML for workbooks built on synced tables
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dbt_tableau_sync::{DbtClient, SyncConfig, SyncEngine, SyncOptions, TableauClient};
//!
//! #[tokio::main]
//! async fn main() -> dbt_tableau_sync::Result<()> {
//!     let config = SyncConfig::from_env()?;
//!     let engine = SyncEngine::new(
//!         DbtClient::new(&config.dbt)?,
//!         TableauClient::new(config.tableau)?,
//!         SyncOptions::new(117857).with_databases(vec!["PRODUCTION".into()]),
//!     );
//!
//!     let report = engine.run().await?;
//!     println!("{:?}", report.column_totals());
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//!  dbt Cloud                                   Tableau
//! ┌──────────────┐                    ┌───────────────────────┐
//! │ Admin API    │                    │ REST sign-in          │
//! │ Discovery API│                    │ Metadata GraphQL      │
//! └──────┬───────┘                    └──────────┬────────────┘
//!        │ models                     databases  │
//!        └───────────────┐  ┌────────────────────┘
//!                        ▼  ▼
//!                 ┌─────────────────┐
//!                 │    reconcile    │  FQN join
//!                 └────────┬────────┘
//!                          │ merged tables
//!          ┌───────────────┴────────────────┐
//!          ▼                                ▼
//!   column/table PUTs                downstream workbooks
//!   (per table, isolated)            → exposures YAML
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Common types and type aliases
pub mod types;

/// Environment configuration
pub mod config;

/// Request authentication
pub mod auth;

/// HTTP client
pub mod http;

/// Response decoders (JSON, GraphQL, XML)
pub mod decode;

/// dbt Cloud client
pub mod dbt;

/// Tableau client
pub mod tableau;

/// Model/table reconciliation
pub mod reconcile;

/// dbt exposure generation
pub mod exposure;

/// Sync orchestration
pub mod sync;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};
pub use types::*;

// Re-export commonly used types
pub use config::{DbtConfig, SyncConfig, TableauConfig};
pub use dbt::DbtClient;
pub use exposure::ExposureDocument;
pub use reconcile::MergedTable;
pub use sync::{SyncEngine, SyncOptions, SyncReport};
pub use tableau::TableauClient;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
