//! Decoder trait

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde_json::Value;

/// Trait for decoding response bodies into records
pub trait RecordDecoder: Send + Sync {
    /// Decode the response body into a list of records
    fn decode(&self, body: &str) -> Result<Vec<Value>>;

    /// Decode the response body into typed records
    fn decode_as<T: DeserializeOwned>(&self, body: &str) -> Result<Vec<T>>
    where
        Self: Sized,
    {
        self.decode(body)?
            .into_iter()
            .map(|record| {
                serde_json::from_value(record)
                    .map_err(|e| Error::decode(format!("Unexpected record shape: {e}")))
            })
            .collect()
    }
}
