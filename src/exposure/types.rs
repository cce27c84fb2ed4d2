//! Exposure document types

use crate::error::Result;
use serde::{Deserialize, Serialize};

/// Schema version of dbt property files
pub const EXPOSURE_DOCUMENT_VERSION: u32 = 2;

/// Kind of downstream artifact
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExposureType {
    #[default]
    Dashboard,
    Notebook,
    Analysis,
    Ml,
    Application,
}

/// Owner of an exposure
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureOwner {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// A single exposure entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exposure {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ExposureType,
    pub maturity: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub depends_on: Vec<String>,
    pub owner: ExposureOwner,
}

/// Top-level exposures file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExposureDocument {
    pub version: u32,
    pub exposures: Vec<Exposure>,
}

impl ExposureDocument {
    pub fn new(exposures: Vec<Exposure>) -> Self {
        Self {
            version: EXPOSURE_DOCUMENT_VERSION,
            exposures,
        }
    }

    /// Render as a YAML document
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }
}
