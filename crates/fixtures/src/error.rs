//! Error types for fixture loading

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FixtureError {
    #[error("Fixture file not found: {0}")]
    NotFound(PathBuf),

    #[error("Fixture yielded no records: {0}")]
    Empty(PathBuf),

    #[error("Not enough image assets: {needed} record(s) but only {found} image(s) in {dir}")]
    InsufficientAssets {
        needed: usize,
        found: usize,
        dir: PathBuf,
    },

    #[error("Sheet '{0}' not found in workbook")]
    SheetNotFound(String),

    #[error("Unexpected header in column {column}: expected '{expected}', found '{found}'")]
    Header {
        column: usize,
        expected: String,
        found: String,
    },

    #[error("Row {row}: {reason}")]
    InvalidRow { row: usize, reason: String },

    #[error("Unsupported fixture format: {0}")]
    UnsupportedFormat(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Spreadsheet read error: {0}")]
    SheetRead(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    SheetWrite(#[from] rust_xlsxwriter::XlsxError),
}

impl FixtureError {
    /// Whether the error means "this environment has no data for the test"
    /// rather than "the data is broken". Callers skip instead of failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            FixtureError::NotFound(_) | FixtureError::Empty(_) | FixtureError::InsufficientAssets { .. }
        )
    }
}

pub type FixtureResult<T> = Result<T, FixtureError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_covers_only_environment_gaps() {
        assert!(FixtureError::NotFound("a.json".into()).is_unavailable());
        assert!(FixtureError::Empty("a.json".into()).is_unavailable());
        assert!(FixtureError::InsufficientAssets { needed: 5, found: 2, dir: "img".into() }.is_unavailable());
        assert!(!FixtureError::SheetNotFound("임직원_추가".into()).is_unavailable());
        assert!(!FixtureError::InvalidRow { row: 3, reason: "bad date".into() }.is_unavailable());
    }
}
