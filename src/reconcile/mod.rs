//! Name reconciliation between dbt models and Tableau catalog tables
//!
//! Models and tables are joined on their lower-cased
//! `database.schema.name` triple. Joining on the bare table name would pair
//! tables from different schemas that happen to share a name, so it is never
//! used.
//!
//! Tableau names some tables without the prefix dbt puts on them;
//! [`restore_full_model_name`] puts it back and must run before [`merge`].

mod merge;
mod types;

pub use merge::{format_table_reference, merge, merge_columns, restore_full_model_name};
pub use types::{MergedTable, PublishColumn};
