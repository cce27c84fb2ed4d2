//! Auth configuration types

use std::fmt;

/// Header carrying the dbt Cloud API token
pub const DBT_AUTH_HEADER: &str = "Authorization";

/// Header carrying the Tableau session token
pub const TABLEAU_AUTH_HEADER: &str = "x-tableau-auth";

/// Credentials attached to outgoing requests
///
/// Both APIs authenticate with a single header; only its name and value
/// prefix differ.
#[derive(Clone, Default, PartialEq, Eq)]
pub enum AuthConfig {
    /// Anonymous request (the Tableau sign-in call)
    #[default]
    None,

    /// Token sent as `{name}: {prefix}{token}`
    Header {
        name: &'static str,
        prefix: &'static str,
        token: String,
    },
}

impl AuthConfig {
    /// dbt Cloud service token: `Authorization: Token {key}`
    pub fn dbt_token(key: impl Into<String>) -> Self {
        Self::Header {
            name: DBT_AUTH_HEADER,
            prefix: "Token ",
            token: key.into(),
        }
    }

    /// Tableau session token: `x-tableau-auth: {token}`
    pub fn tableau_session(token: impl Into<String>) -> Self {
        Self::Header {
            name: TABLEAU_AUTH_HEADER,
            prefix: "",
            token: token.into(),
        }
    }

    /// Header name and full value this config writes, if any
    pub fn header(&self) -> Option<(&'static str, String)> {
        match self {
            AuthConfig::None => None,
            AuthConfig::Header {
                name,
                prefix,
                token,
            } => Some((*name, format!("{prefix}{token}"))),
        }
    }
}

// Tokens never reach log output.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthConfig::None => f.write_str("None"),
            AuthConfig::Header { name, .. } => f
                .debug_struct("Header")
                .field("name", name)
                .field("token", &"***")
                .finish(),
        }
    }
}
