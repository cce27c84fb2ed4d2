//! Tableau client module
//!
//! Covers the three Tableau surfaces a sync touches:
//! - REST sign-in with a personal access token
//! - Metadata (catalog) GraphQL queries for databases, tables, columns and
//!   downstream workbooks
//! - REST PUTs of table and column descriptions, plus a few read-only REST
//!   calls used to diagnose permissions

mod client;
mod payload;
mod queries;
mod types;

pub use client::{TableauClient, METADATA_GRAPHQL_PATH};
pub use payload::{column_description_payload, sanitize_description, table_description_payload};
pub use queries::{databases_query, downstream_workbooks_query, COLUMNS_QUERY};
pub use types::{
    Column, Credentials, Database, EndpointAccess, SiteInfo, Table, Tag, UpstreamTable, UserInfo,
    Workbook, WorkbookOwner,
};

#[cfg(test)]
mod tests;
