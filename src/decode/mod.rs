//! Response decoder module
//!
//! Supports: JSON (with dot-path record extraction), GraphQL envelopes,
//! and the attribute-only XML returned by the Tableau REST API.
//!
//! # Overview
//!
//! Every API call in this crate ends the same way: parse the body and pull a
//! list out of a fixed key path. The decoders here do exactly that and turn
//! missing paths and GraphQL `errors` arrays into typed errors.

mod decoders;
mod types;

pub use decoders::{extract_simple_path, graphql_request, GraphQlDecoder, JsonDecoder, XmlDecoder};
pub use types::RecordDecoder;
