//! Error types for E2E testing

use acs_fixtures::FixtureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum E2eError {
    #[error("Target application unreachable at {url} after {attempts} attempts")]
    Unreachable { url: String, attempts: usize },

    #[error("Node.js not found. Install Node and run: npm install playwright && npx playwright install")]
    NodeNotFound,

    #[error("Playwright driver failed to start: {0}")]
    DriverStartup(String),

    #[error("Playwright driver exited")]
    DriverClosed,

    #[error("Playwright error: {0}")]
    Playwright(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fixture: {0}")]
    Fixture(#[from] FixtureError),

    #[error("Assertion failed: {0}")]
    AssertionFailed(String),

    #[error("Invalid lifecycle transition for '{entity}': {from} -> {to}")]
    InvalidTransition {
        entity: String,
        from: String,
        to: String,
    },

    #[error("Timeout waiting for: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

impl E2eError {
    /// The test could not run in this environment; report it as skipped.
    pub fn is_skip(&self) -> bool {
        matches!(self, E2eError::Fixture(e) if e.is_unavailable())
    }

    /// No valid session can exist, so every dependent test is moot.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            E2eError::Authentication(_)
                | E2eError::NodeNotFound
                | E2eError::DriverStartup(_)
                | E2eError::Config(_)
        )
    }
}

pub type E2eResult<T> = Result<T, E2eError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification() {
        let skip = E2eError::from(FixtureError::NotFound("em_add.json".into()));
        assert!(skip.is_skip());
        assert!(!skip.is_fatal());

        let broken = E2eError::from(FixtureError::InvalidRow { row: 2, reason: "x".into() });
        assert!(!broken.is_skip());

        assert!(E2eError::Authentication("still on /signin".into()).is_fatal());
        assert!(!E2eError::AssertionFailed("row not visible".into()).is_fatal());
        assert!(!E2eError::Timeout("click".into()).is_skip());
    }
}
