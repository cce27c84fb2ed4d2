//! Authentication module
//!
//! Supports dbt Cloud API tokens (`Authorization: Token ...`)
//! and Tableau session tokens (`x-tableau-auth`).
//!
//! Tableau session tokens are obtained by the sign-in call in
//! [`crate::tableau::TableauClient::authenticate`] and then carried here.

mod authenticator;
mod types;

pub use authenticator::Authenticator;
pub use types::{AuthConfig, DBT_AUTH_HEADER, TABLEAU_AUTH_HEADER};
