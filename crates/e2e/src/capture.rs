//! Failure capture
//!
//! A full-page screenshot per failed test, at a path derived from the test
//! name so a report can link to it. Only called on failure.

use std::path::PathBuf;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{info, warn};

use crate::page::Page;

static UNSAFE_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w.\-]+").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct FailureCapture {
    dir: PathBuf,
}

impl FailureCapture {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Screenshot path for a test
    pub fn path_for(&self, test_name: &str) -> PathBuf {
        self.dir.join(format!("{}.png", file_stem(test_name)))
    }

    /// Take the screenshot. Errors are logged, never returned: the test
    /// already failed and that failure is what gets reported.
    pub async fn capture(&self, page: &Page, test_name: &str) -> Option<PathBuf> {
        let path = self.path_for(test_name);
        match page.screenshot(&path, true).await {
            Ok(path) => {
                info!("Failure screenshot: {}", path.display());
                Some(path)
            }
            Err(e) => {
                warn!("Could not capture screenshot for '{}': {}", test_name, e);
                None
            }
        }
    }
}

fn file_stem(test_name: &str) -> String {
    let cleaned = UNSAFE_CHARS.replace_all(test_name.trim(), "_");
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "unnamed".to_string()
    } else {
        cleaned.to_string()
    }
}
