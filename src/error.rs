//! Error types for dbt-tableau-sync
//!
//! Every public API returns `Result<T, Error>`. Errors raised while fetching
//! metadata end the run; errors raised while publishing a single description
//! are logged and counted by the caller (see [`Error::is_terminal`]).

use thiserror::Error;

/// The main error type for the sync
#[derive(Error, Debug)]
pub enum Error {
    // ============================================================================
    // Environment
    // ============================================================================
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Missing required environment variable: {field}")]
    MissingConfigField { field: String },

    // ============================================================================
    // Transport
    // ============================================================================
    #[error("Authentication failed: {message}")]
    Auth { message: String },

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    // ============================================================================
    // Response bodies
    // ============================================================================
    #[error("GraphQL query failed: {message}")]
    Query { message: String },

    #[error("No records at '{path}': {message}")]
    RecordExtraction { path: String, message: String },

    #[error("Failed to decode response: {message}")]
    Decode { message: String },

    #[error("Malformed Tableau XML: {message}")]
    XmlParse { message: String },

    #[error("Invalid JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    // ============================================================================
    // Publishing and exposure output
    // ============================================================================
    #[error("'{record}' is missing required field: {field}")]
    MissingField { record: String, field: String },

    #[error("Sync finished with {tables} failed tables and {columns} failed column writes")]
    PublishFailures { tables: usize, columns: usize },

    #[error("Failed to render exposures YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Unset or blank environment variable `field`
    pub fn missing_config(field: impl Into<String>) -> Self {
        Self::MissingConfigField {
            field: field.into(),
        }
    }

    pub fn auth(message: impl Into<String>) -> Self {
        Self::Auth {
            message: message.into(),
        }
    }

    /// Non-2xx response with its body text
    pub fn http_status(status: u16, body: impl Into<String>) -> Self {
        Self::HttpStatus {
            status,
            body: body.into(),
        }
    }

    /// GraphQL `errors` array, joined into one message
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
        }
    }

    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    pub fn extraction(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::RecordExtraction {
            path: path.into(),
            message: message.into(),
        }
    }

    /// A merged table or column lacks a value required to publish it
    pub fn missing_field(record: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            record: record.into(),
            field: field.into(),
        }
    }

    /// Whether this error should end the run.
    ///
    /// `MissingField` only ever describes one record that cannot be published,
    /// so the run carries on with the next one. Everything else is terminal
    /// when raised during the fetch phase.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Error::MissingField { .. })
    }

    /// Whether a response body could not be parsed
    pub fn is_parse(&self) -> bool {
        matches!(
            self,
            Error::JsonParse(_)
                | Error::XmlParse { .. }
                | Error::Decode { .. }
                | Error::RecordExtraction { .. }
        )
    }
}

/// Result type alias for dbt-tableau-sync
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::missing_config("DBT_API_PAT");
        assert_eq!(
            err.to_string(),
            "Missing required environment variable: DBT_API_PAT"
        );

        let err = Error::http_status(404, "Not found");
        assert_eq!(err.to_string(), "HTTP 404: Not found");

        let err = Error::missing_field("orders", "luid");
        assert_eq!(err.to_string(), "'orders' is missing required field: luid");
    }

    #[test]
    fn test_is_terminal() {
        assert!(Error::auth("bad token").is_terminal());
        assert!(Error::query("field not found").is_terminal());
        assert!(Error::Timeout { timeout_ms: 1000 }.is_terminal());
        assert!(Error::decode("eof").is_terminal());
        assert!(!Error::missing_field("orders", "description").is_terminal());
    }

    #[test]
    fn test_is_parse() {
        assert!(Error::decode("bad").is_parse());
        assert!(Error::XmlParse {
            message: "bad".to_string()
        }
        .is_parse());
        assert!(Error::extraction("data.models", "missing").is_parse());
        assert!(!Error::auth("nope").is_parse());
        assert!(!Error::http_status(500, "").is_parse());
    }
}
