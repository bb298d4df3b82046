//! Page handle
//!
//! Every interaction is followed by the configured settle delay, and every
//! wait carries an explicit timeout. A wait that expires surfaces as
//! [`E2eError::Timeout`] or, for assertions, [`E2eError::AssertionFailed`].

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tracing::debug;

use crate::config::Timeouts;
use crate::dialog::{DialogEvent, DialogMatcher, DialogSubscription, Lifetime, PageId, Resolution};
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::playwright::{ContextId, Driver};

/// Load states accepted by `wait_for_load_state`
#[derive(Debug, Clone, Copy)]
pub enum LoadState {
    NetworkIdle,
}

impl LoadState {
    fn as_str(&self) -> &'static str {
        match self {
            LoadState::NetworkIdle => "networkidle",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum WaitState {
    Visible,
    Hidden,
}

impl WaitState {
    fn as_str(&self) -> &'static str {
        match self {
            WaitState::Visible => "visible",
            WaitState::Hidden => "hidden",
        }
    }
}

/// One browser tab. Cheap to clone; clones drive the same tab.
#[derive(Clone)]
pub struct Page {
    id: PageId,
    context: ContextId,
    /// Anonymous pages own a private context and close it with the page
    owns_context: bool,
    driver: Arc<Driver>,
    timeouts: Timeouts,
}

impl Page {
    pub(crate) async fn open(
        driver: Arc<Driver>,
        context: ContextId,
        owns_context: bool,
        timeouts: Timeouts,
    ) -> E2eResult<Self> {
        let id = driver.new_page(context, timeouts.action()).await?;
        debug!("Opened page {} in context {}", id, context);
        Ok(Self {
            id,
            context,
            owns_context,
            driver,
            timeouts,
        })
    }

    pub fn id(&self) -> PageId {
        self.id
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    async fn call(&self, method: &str, mut params: Value, timeout: Duration) -> E2eResult<Value> {
        params["page"] = json!(self.id);
        params["timeout"] = json!(timeout.as_millis() as u64);
        self.driver.call(method, params, timeout).await
    }

    /// Pause so asynchronous rendering can catch up
    pub async fn settle(&self) {
        tokio::time::sleep(self.timeouts.settle()).await;
    }

    pub async fn goto(&self, url: &str) -> E2eResult<()> {
        debug!("page {}: goto {}", self.id, url);
        self.call("goto", json!({ "url": url }), self.timeouts.navigation()).await?;
        self.settle().await;
        Ok(())
    }

    pub async fn wait_for_load_state(&self, state: LoadState) -> E2eResult<()> {
        self.call("waitForLoadState", json!({ "state": state.as_str() }), self.timeouts.navigation())
            .await?;
        Ok(())
    }

    pub async fn url(&self) -> E2eResult<String> {
        let value = self.call("url", json!({}), self.timeouts.action()).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// Wait until the address contains `fragment`
    pub async fn wait_for_url_containing(&self, fragment: &str, timeout: Duration) -> E2eResult<String> {
        self.wait_for_url(fragment, false, timeout).await
    }

    /// Wait until the address no longer contains `fragment`
    pub async fn wait_for_url_leaving(&self, fragment: &str, timeout: Duration) -> E2eResult<String> {
        self.wait_for_url(fragment, true, timeout).await
    }

    async fn wait_for_url(&self, fragment: &str, negate: bool, timeout: Duration) -> E2eResult<String> {
        let value = self
            .call("waitForUrl", json!({ "fragment": fragment, "negate": negate }), timeout)
            .await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn click(&self, locator: &Locator) -> E2eResult<()> {
        debug!("page {}: click {}", self.id, locator);
        self.call("click", json!({ "locator": locator }), self.timeouts.action()).await?;
        self.settle().await;
        Ok(())
    }

    pub async fn fill(&self, locator: &Locator, value: &str) -> E2eResult<()> {
        debug!("page {}: fill {}", self.id, locator);
        self.call("fill", json!({ "locator": locator, "value": value }), self.timeouts.action())
            .await?;
        self.settle().await;
        Ok(())
    }

    pub async fn press(&self, locator: &Locator, key: &str) -> E2eResult<()> {
        self.call("press", json!({ "locator": locator, "key": key }), self.timeouts.action())
            .await?;
        self.settle().await;
        Ok(())
    }

    /// Key press on whatever has focus
    pub async fn press_key(&self, key: &str) -> E2eResult<()> {
        self.call("keyboardPress", json!({ "key": key }), self.timeouts.action()).await?;
        self.settle().await;
        Ok(())
    }

    pub async fn set_checked(&self, locator: &Locator, checked: bool) -> E2eResult<()> {
        self.call("setChecked", json!({ "locator": locator, "checked": checked }), self.timeouts.action())
            .await?;
        self.settle().await;
        Ok(())
    }

    pub async fn set_input_files(&self, locator: &Locator, files: &[PathBuf]) -> E2eResult<()> {
        let files: Vec<String> = files.iter().map(|p| p.to_string_lossy().to_string()).collect();
        self.call("setInputFiles", json!({ "locator": locator, "files": files }), self.timeouts.action())
            .await?;
        self.settle().await;
        Ok(())
    }

    pub async fn count(&self, locator: &Locator) -> E2eResult<usize> {
        let value = self.call("count", json!({ "locator": locator }), self.timeouts.action()).await?;
        Ok(value.as_u64().unwrap_or(0) as usize)
    }

    pub async fn is_visible(&self, locator: &Locator) -> E2eResult<bool> {
        let value = self
            .call("isVisible", json!({ "locator": locator }), self.timeouts.action())
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Inner text of every match, in document order
    pub async fn inner_texts(&self, locator: &Locator) -> E2eResult<Vec<String>> {
        let value = self
            .call("innerTexts", json!({ "locator": locator }), self.timeouts.action())
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn wait_for(&self, locator: &Locator, state: WaitState, timeout: Duration) -> E2eResult<()> {
        self.call("waitFor", json!({ "locator": locator, "state": state.as_str() }), timeout)
            .await?;
        Ok(())
    }

    /// Wait (bounded) for the element to become visible
    pub async fn wait_visible(&self, locator: &Locator, timeout: Duration) -> E2eResult<()> {
        self.wait_for(locator, WaitState::Visible, timeout).await
    }

    /// Assert that `locator` becomes visible within the assertion timeout
    pub async fn expect_visible(&self, locator: &Locator) -> E2eResult<()> {
        match self.wait_for(locator, WaitState::Visible, self.timeouts.assertion()).await {
            Err(E2eError::Timeout(_)) => Err(E2eError::AssertionFailed(format!(
                "{} not visible within {} ms",
                locator, self.timeouts.assertion_ms
            ))),
            other => other,
        }
    }

    /// Assert that no visible element matches `locator` within the assertion timeout
    pub async fn expect_hidden(&self, locator: &Locator) -> E2eResult<()> {
        match self.wait_for(locator, WaitState::Hidden, self.timeouts.assertion()).await {
            Err(E2eError::Timeout(_)) => Err(E2eError::AssertionFailed(format!(
                "{} still visible after {} ms",
                locator, self.timeouts.assertion_ms
            ))),
            other => other,
        }
    }

    /// Full-page or viewport screenshot to `path`
    pub async fn screenshot(&self, path: &Path, full_page: bool) -> E2eResult<PathBuf> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        self.call(
            "screenshot",
            json!({ "path": path.to_string_lossy(), "full_page": full_page }),
            self.timeouts.navigation(),
        )
        .await?;
        Ok(path.to_path_buf())
    }

    /// Answer native dialogs matching `matcher` with `resolution`.
    ///
    /// Keep the returned handle alive for as long as the subscription should
    /// apply.
    pub fn on_dialog(&self, matcher: DialogMatcher, resolution: Resolution, lifetime: Lifetime) -> DialogSubscription {
        self.driver.dialogs().subscribe(self.id, matcher, resolution, lifetime)
    }

    /// Accept the next dialog whose message contains `keyword`
    pub fn accept_next_dialog(&self, keyword: &str) -> DialogSubscription {
        self.on_dialog(DialogMatcher::contains(keyword), Resolution::accept(), Lifetime::Once)
    }

    /// Dialogs seen on this page since the last call
    pub fn take_dialogs(&self) -> Vec<DialogEvent> {
        self.driver.dialogs().take_log(self.id)
    }

    pub async fn close(&self) -> E2eResult<()> {
        self.driver.close_page(self.id).await?;
        if self.owns_context {
            self.driver.close_context(self.context).await?;
        }
        Ok(())
    }
}
