//! Authenticated session shared by a run
//!
//! One browser context is signed in once and every test opens its pages in
//! it. Tests are therefore not isolated from each other: cookies, server
//! side data and anything the console caches leak across tests. Scenarios
//! compensate by using timestamp-unique entity names and by always
//! navigating from the home page instead of trusting the current screen.
//!
//! Both the driver process and the session are created lazily by
//! [`Harness`] on first use, and a failed sign-in is remembered so it is
//! never retried within the run.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::capture::FailureCapture;
use crate::config::E2eConfig;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::Page;
use crate::playwright::{ContextId, Driver};

/// Fields of the sign-in form
pub struct SignInForm;

impl SignInForm {
    pub fn username() -> Locator {
        Locator::textbox("Enter your Login ID or Email")
    }

    pub fn password() -> Locator {
        Locator::textbox("Password")
    }

    pub fn submit() -> Locator {
        Locator::button("Sign In")
    }
}

/// Fill and submit the sign-in form, then require the address to leave the
/// sign-in path within the sign-in timeout.
pub async fn sign_in(page: &Page, config: &E2eConfig, username: &str, password: &str) -> E2eResult<String> {
    let timeouts = page.timeouts();

    page.goto(&config.signin_url()).await?;
    page.wait_visible(&SignInForm::username(), timeouts.action()).await?;
    page.wait_visible(&SignInForm::password(), timeouts.action()).await?;

    page.fill(&SignInForm::username(), username).await?;
    page.fill(&SignInForm::password(), password).await?;
    page.click(&SignInForm::submit()).await?;

    page.wait_for_url_leaving(&config.signin_path, timeouts.sign_in())
        .await
        .map_err(|e| match e {
            E2eError::Timeout(_) => E2eError::Authentication(format!(
                "still on {} after {} ms",
                config.signin_path, timeouts.sign_in_ms
            )),
            other => other,
        })
}

/// An authenticated browser context
pub struct Session {
    driver: Arc<Driver>,
    context: ContextId,
    config: Arc<E2eConfig>,
}

impl Session {
    /// Sign in once in a fresh context.
    ///
    /// On failure a full-page screenshot is written and
    /// [`E2eError::Authentication`] is returned; callers treat it as fatal.
    pub async fn authenticate(
        driver: Arc<Driver>,
        config: Arc<E2eConfig>,
        capture: &FailureCapture,
    ) -> E2eResult<Self> {
        let password = config.password()?.to_string();
        let context = driver.new_context(config.timeouts.action()).await?;
        let page = Page::open(driver.clone(), context, false, config.timeouts.clone()).await?;

        info!("Signing in as {} at {}", config.credentials.username, config.signin_url());
        match sign_in(&page, &config, &config.credentials.username, &password).await {
            Ok(url) => {
                info!("Signed in, landed on {}", url);
                if let Err(e) = page.close().await {
                    warn!("Closing the sign-in page: {}", e);
                }
                Ok(Self { driver, context, config })
            }
            Err(e) => {
                error!("Sign-in failed: {}", e);
                capture.capture(&page, "signin-failure").await;
                let _ = driver.close_context(context).await;
                Err(match e {
                    E2eError::Authentication(_) => e,
                    other => E2eError::Authentication(other.to_string()),
                })
            }
        }
    }

    /// New tab in the authenticated context
    pub async fn new_page(&self) -> E2eResult<Page> {
        Page::open(self.driver.clone(), self.context, false, self.config.timeouts.clone()).await
    }

    pub async fn close(&self) -> E2eResult<()> {
        self.driver.close_context(self.context).await
    }
}

/// Run-scoped owner of the driver and the shared session
pub struct Harness {
    config: Arc<E2eConfig>,
    capture: FailureCapture,
    driver: OnceCell<Result<Arc<Driver>, String>>,
    session: OnceCell<Result<Arc<Session>, String>>,
}

impl Harness {
    pub fn new(config: Arc<E2eConfig>) -> Self {
        let capture = FailureCapture::new(config.screenshot_dir());
        Self {
            config,
            capture,
            driver: OnceCell::new(),
            session: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &Arc<E2eConfig> {
        &self.config
    }

    pub fn capture(&self) -> &FailureCapture {
        &self.capture
    }

    /// Launch the browser on first use
    pub async fn driver(&self) -> E2eResult<Arc<Driver>> {
        let mut first_error = None;
        let slot = &mut first_error;
        let outcome = self
            .driver
            .get_or_init(|| async move {
                let launched = Driver::launch(
                    &self.config.playwright,
                    self.config.unhandled_dialog,
                    self.config.timeouts.launch(),
                )
                .await;
                launched.map_err(|e| {
                    let message = e.to_string();
                    *slot = Some(e);
                    message
                })
            })
            .await;

        if let Some(e) = first_error {
            return Err(e);
        }
        match outcome {
            Ok(driver) => Ok(driver.clone()),
            Err(message) => Err(E2eError::DriverStartup(message.clone())),
        }
    }

    /// Sign in on first use; later callers share the same session
    pub async fn session(&self) -> E2eResult<Arc<Session>> {
        let driver = self.driver().await?;

        let mut first_error = None;
        let slot = &mut first_error;
        let outcome = self
            .session
            .get_or_init(|| async move {
                match Session::authenticate(driver, self.config.clone(), &self.capture).await {
                    Ok(session) => Ok(Arc::new(session)),
                    Err(e) => {
                        let message = e.to_string();
                        *slot = Some(e);
                        Err(message)
                    }
                }
            })
            .await;

        if let Some(e) = first_error {
            return Err(e);
        }
        match outcome {
            Ok(session) => Ok(session.clone()),
            Err(message) => Err(E2eError::Authentication(message.clone())),
        }
    }

    /// Page in a private, unauthenticated context; closing the page
    /// disposes the context.
    pub async fn anonymous_page(&self) -> E2eResult<Page> {
        let driver = self.driver().await?;
        let context = driver.new_context(self.config.timeouts.action()).await?;
        Page::open(driver, context, true, self.config.timeouts.clone()).await
    }

    /// Tear down whatever was started
    pub async fn shutdown(&self) -> E2eResult<()> {
        if let Some(Ok(session)) = self.session.get() {
            let _ = session.close().await;
        }
        if let Some(Ok(driver)) = self.driver.get() {
            driver.shutdown().await?;
        }
        Ok(())
    }
}
