//! JSON fixture files
//!
//! Employee fixtures are an object with an `employees` array, location
//! fixtures an object with a `locations` array:
//!
//! ```json
//! { "employees": [ { "name": "...", "department": "...", "access_cases": ["..."] } ] }
//! ```

use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{FixtureError, FixtureResult};
use crate::record::{EmployeeRecord, LocationRecord};

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct EmployeeFile {
    #[serde(default)]
    pub employees: Vec<EmployeeRecord>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct LocationFile {
    #[serde(default)]
    pub locations: Vec<LocationRecord>,
}

/// Load the `employees` array of a JSON fixture.
pub fn load_employees(path: &Path) -> FixtureResult<Vec<EmployeeRecord>> {
    let file: EmployeeFile = read_json(path)?;
    non_empty(path, file.employees)
}

/// Load the `locations` array of a JSON fixture.
pub fn load_locations(path: &Path) -> FixtureResult<Vec<LocationRecord>> {
    let file: LocationFile = read_json(path)?;
    non_empty(path, file.locations)
}

fn read_json<T: DeserializeOwned>(path: &Path) -> FixtureResult<T> {
    if !path.exists() {
        return Err(FixtureError::NotFound(path.to_path_buf()));
    }
    let content = std::fs::read_to_string(path)?;
    let parsed = serde_json::from_str(&content)?;
    debug!("Parsed JSON fixture {}", path.display());
    Ok(parsed)
}

pub(crate) fn non_empty<T>(path: &Path, records: Vec<T>) -> FixtureResult<Vec<T>> {
    if records.is_empty() {
        return Err(FixtureError::Empty(path.to_path_buf()));
    }
    Ok(records)
}

/// Write employee records as a JSON fixture.
pub fn write_employees(path: &Path, employees: &[EmployeeRecord]) -> FixtureResult<()> {
    let file = EmployeeFile { employees: employees.to_vec() };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

/// Write location records as a JSON fixture.
pub fn write_locations(path: &Path, locations: &[LocationRecord]) -> FixtureResult<()> {
    let file = LocationFile { locations: locations.to_vec() };
    std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}
