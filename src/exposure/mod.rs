//! dbt exposure generation
//!
//! Turns the workbooks found downstream of merged tables into a dbt
//! exposures document (`version: 2`), one `dashboard` exposure per workbook.

mod generate;
mod types;

pub use generate::{
    exposure_file_path, generate_exposures, restore_upstream_names, write_exposures,
    EXPOSURES_DIR,
};
pub use types::{Exposure, ExposureDocument, ExposureOwner, ExposureType};
