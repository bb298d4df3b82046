//! Suite configuration
//!
//! Layering, lowest to highest precedence: built-in defaults, an optional
//! YAML file, `ACS_E2E_*` environment variables, then CLI flags applied by
//! the harness binary. Credentials are never hard-coded.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dialog::UnhandledDialogPolicy;
use crate::error::{E2eError, E2eResult};
use crate::playwright::{Browser, PlaywrightConfig};

/// Complete configuration for one suite run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct E2eConfig {
    /// Base URL of the management console
    pub base_url: String,

    /// Path of the sign-in surface, relative to `base_url`
    pub signin_path: String,

    /// Test account
    pub credentials: Credentials,

    /// Browser settings
    pub playwright: PlaywrightConfig,

    /// Bounded waits and settle delay
    pub timeouts: Timeouts,

    /// Where screenshots and the results report go
    pub report_dir: PathBuf,

    /// Directory holding JSON/xlsx fixtures
    pub fixtures_dir: PathBuf,

    /// Directory holding image assets for employee photos
    pub images_dir: PathBuf,

    /// Resolution for dialogs no subscription matched
    pub unhandled_dialog: UnhandledDialogPolicy,

    /// Seed for randomized dropdown choices (random when unset)
    pub seed: Option<u64>,
}

impl Default for E2eConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            signin_path: "/signin".to_string(),
            credentials: Credentials::default(),
            playwright: PlaywrightConfig::default(),
            timeouts: Timeouts::default(),
            report_dir: PathBuf::from("test-results"),
            fixtures_dir: PathBuf::from("fixtures"),
            images_dir: PathBuf::from("fixtures/images"),
            unhandled_dialog: UnhandledDialogPolicy::default(),
            seed: None,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,

    #[serde(skip_serializing)]
    pub password: Option<String>,
}

impl Default for Credentials {
    fn default() -> Self {
        Self {
            username: "superadmin".to_string(),
            password: None,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Bounded waits, all in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Timeouts {
    /// Single interaction (click, fill, select)
    pub action_ms: u64,

    /// Visible / hidden assertions
    pub assertion_ms: u64,

    /// Page loads and network idle
    pub navigation_ms: u64,

    /// Leaving the sign-in path after submitting credentials
    pub sign_in_ms: u64,

    /// Driver process startup
    pub launch_ms: u64,

    /// Pause after every interaction
    pub settle_ms: u64,

    /// Readiness check of the target before the run
    pub preflight_ms: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            action_ms: 10_000,
            assertion_ms: 10_000,
            navigation_ms: 30_000,
            sign_in_ms: 20_000,
            launch_ms: 30_000,
            settle_ms: 500,
            preflight_ms: 30_000,
        }
    }
}

impl Timeouts {
    pub fn action(&self) -> Duration {
        Duration::from_millis(self.action_ms)
    }

    pub fn assertion(&self) -> Duration {
        Duration::from_millis(self.assertion_ms)
    }

    pub fn navigation(&self) -> Duration {
        Duration::from_millis(self.navigation_ms)
    }

    pub fn sign_in(&self) -> Duration {
        Duration::from_millis(self.sign_in_ms)
    }

    pub fn launch(&self) -> Duration {
        Duration::from_millis(self.launch_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_ms)
    }

    pub fn preflight(&self) -> Duration {
        Duration::from_millis(self.preflight_ms)
    }
}

impl E2eConfig {
    /// Parse a config from a YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        serde_yaml::from_str(yaml).map_err(E2eError::from)
    }

    /// Load the optional YAML file, then apply the process environment.
    pub fn load(path: Option<&Path>) -> E2eResult<Self> {
        let mut config = match path {
            Some(path) => Self::from_yaml(&std::fs::read_to_string(path)?)?,
            None => Self::default(),
        };
        config.apply_env(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Apply `ACS_E2E_*` overrides from `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> E2eResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = lookup("ACS_E2E_BASE_URL") {
            self.base_url = v;
        }
        if let Some(v) = lookup("ACS_E2E_USERNAME") {
            self.credentials.username = v;
        }
        if let Some(v) = lookup("ACS_E2E_PASSWORD") {
            self.credentials.password = Some(v);
        }
        if let Some(v) = lookup("ACS_E2E_HEADLESS") {
            self.playwright.headless = parse_bool("ACS_E2E_HEADLESS", &v)?;
        }
        if let Some(v) = lookup("ACS_E2E_BROWSER") {
            self.playwright.browser = v.parse()?;
        }
        if let Some(v) = lookup("ACS_E2E_NODE_PATH") {
            self.playwright.node_path = Some(PathBuf::from(v));
        }
        if let Some(v) = lookup("ACS_E2E_REPORT_DIR") {
            self.report_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ACS_E2E_FIXTURES_DIR") {
            self.fixtures_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ACS_E2E_IMAGES_DIR") {
            self.images_dir = PathBuf::from(v);
        }
        if let Some(v) = lookup("ACS_E2E_SEED") {
            let seed = v
                .parse()
                .map_err(|_| E2eError::Config(format!("ACS_E2E_SEED is not a number: {}", v)))?;
            self.seed = Some(seed);
        }
        Ok(())
    }

    /// Absolute URL of a path on the console
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }

    pub fn home_url(&self) -> String {
        self.url("/")
    }

    pub fn signin_url(&self) -> String {
        self.url(&self.signin_path)
    }

    pub fn screenshot_dir(&self) -> PathBuf {
        self.report_dir.join("screenshots")
    }

    /// Password for the test account, required once a session is needed
    pub fn password(&self) -> E2eResult<&str> {
        self.credentials
            .password
            .as_deref()
            .filter(|p| !p.is_empty())
            .ok_or_else(|| E2eError::Config("no password configured; set ACS_E2E_PASSWORD".to_string()))
    }
}

fn parse_bool(key: &str, value: &str) -> E2eResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(E2eError::Config(format!("{} is not a boolean: {}", key, other))),
    }
}

impl std::str::FromStr for Browser {
    type Err = E2eError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" => Ok(Browser::Webkit),
            other => Err(E2eError::Config(format!("unknown browser: {}", other))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn yaml_fills_missing_fields_with_defaults() {
        let yaml = r#"
base_url: https://acs.example.test/
credentials:
  username: qa-admin
timeouts:
  settle_ms: 250
"#;
        let config = E2eConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.credentials.username, "qa-admin");
        assert_eq!(config.timeouts.settle_ms, 250);
        assert_eq!(config.timeouts.sign_in_ms, 20_000);
        assert_eq!(config.signin_url(), "https://acs.example.test/signin");
    }

    #[test]
    fn env_overrides_file_values() {
        let env: HashMap<&str, &str> = [
            ("ACS_E2E_BASE_URL", "http://10.0.0.5:3000"),
            ("ACS_E2E_PASSWORD", "from-env"),
            ("ACS_E2E_HEADLESS", "false"),
            ("ACS_E2E_BROWSER", "firefox"),
            ("ACS_E2E_SEED", "99"),
        ]
        .into_iter()
        .collect();

        let mut config = E2eConfig::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.base_url, "http://10.0.0.5:3000");
        assert_eq!(config.password().unwrap(), "from-env");
        assert!(!config.playwright.headless);
        assert!(matches!(config.playwright.browser, Browser::Firefox));
        assert_eq!(config.seed, Some(99));
        assert_eq!(config.credentials.username, "superadmin");
    }

    #[test]
    fn bad_env_values_are_config_errors() {
        let mut config = E2eConfig::default();
        let err = config
            .apply_env(|key| (key == "ACS_E2E_HEADLESS").then(|| "maybe".to_string()))
            .unwrap_err();
        assert!(matches!(err, E2eError::Config(_)));
    }

    #[test]
    fn missing_password_is_reported_and_redacted() {
        let mut config = E2eConfig::default();
        assert!(matches!(config.password(), Err(E2eError::Config(_))));

        config.credentials.password = Some("hunter2".to_string());
        let debug = format!("{:?}", config.credentials);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
