//! HTTP client module
//!
//! Thin wrapper over `reqwest` shared by the dbt and Tableau clients.
//! Non-2xx responses become `Error::HttpStatus` with the body attached,
//! elapsed deadlines become `Error::Timeout`. The dbt client authenticates
//! every request with its token; Tableau requests carry the session token
//! per request.
//!
//! Requests are issued one at a time and never retried.

mod client;

pub use client::{HttpClient, HttpClientConfig, HttpClientConfigBuilder, RequestBody, RequestConfig};
