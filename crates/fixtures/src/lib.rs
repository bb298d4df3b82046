//! Fixture data for the ACS E2E suite
//!
//! Loads the JSON and spreadsheet files that drive the data-driven
//! scenarios, normalizes them into records, and pairs records with image
//! assets. A missing or empty fixture is reported as *unavailable* so the
//! dependent test can be skipped instead of failed.

pub mod assets;
pub mod error;
pub mod generate;
pub mod json;
pub mod record;
pub mod sheet;

use std::path::Path;

pub use assets::{ImageAsset, ImageAssets};
pub use error::{FixtureError, FixtureResult};
pub use record::{EmployeeRecord, LocationRecord};

/// Load employees from a `.json` or `.xlsx` fixture, picked by extension.
pub fn load_employees(path: &Path, sheet: Option<&str>) -> FixtureResult<Vec<EmployeeRecord>> {
    match extension(path).as_deref() {
        Some("json") => json::load_employees(path),
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => sheet::load_employees(path, sheet),
        _ if !path.exists() => Err(FixtureError::NotFound(path.to_path_buf())),
        _ => Err(FixtureError::UnsupportedFormat(path.to_path_buf())),
    }
}

/// Load locations from a `.json` or `.xlsx` fixture, picked by extension.
pub fn load_locations(path: &Path, sheet: Option<&str>) -> FixtureResult<Vec<LocationRecord>> {
    match extension(path).as_deref() {
        Some("json") => json::load_locations(path),
        Some("xlsx") | Some("xlsm") | Some("xls") | Some("ods") => sheet::load_locations(path, sheet),
        _ if !path.exists() => Err(FixtureError::NotFound(path.to_path_buf())),
        _ => Err(FixtureError::UnsupportedFormat(path.to_path_buf())),
    }
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}
