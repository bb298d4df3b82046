//! Sign-in surface, exercised from unauthenticated contexts

use futures::future::BoxFuture;
use futures::FutureExt;
use reqwest::Url;
use tracing::info;

use crate::config::E2eConfig;
use crate::error::{E2eError, E2eResult};
use crate::locator::Locator;
use crate::page::{LoadState, Page};
use crate::runner::{TestCase, TestContext};
use crate::session::{sign_in, SignInForm};

/// Where the console sends an expired session back to after sign-in
const RETURN_PATH: &str = "/location?tab=location";

/// Texts the console shows next to a rejected sign-in
const REJECTION_TEXTS: [&str; 2] = ["오류", "실패"];

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "auth::signin_page_loads",
            tags: &["auth", "smoke"],
            run: signin_page_loads,
        },
        TestCase {
            name: "auth::signin_with_valid_credentials",
            tags: &["auth", "smoke"],
            run: signin_with_valid_credentials,
        },
        TestCase {
            name: "auth::signin_with_tab_navigation",
            tags: &["auth"],
            run: signin_with_tab_navigation,
        },
        TestCase {
            name: "auth::signin_with_enter_key",
            tags: &["auth"],
            run: signin_with_enter_key,
        },
        TestCase {
            name: "auth::signin_with_return_url",
            tags: &["auth"],
            run: signin_with_return_url,
        },
        TestCase {
            name: "auth::signin_with_empty_fields",
            tags: &["auth", "negative"],
            run: signin_with_empty_fields,
        },
        TestCase {
            name: "auth::signin_with_invalid_credentials",
            tags: &["auth", "negative"],
            run: signin_with_invalid_credentials,
        },
        TestCase {
            name: "auth::signin_with_username_only",
            tags: &["auth", "negative"],
            run: signin_with_username_only,
        },
        TestCase {
            name: "auth::signin_with_password_only",
            tags: &["auth", "negative"],
            run: signin_with_password_only,
        },
    ]
}

/// Sign-in address carrying an expired-session reason and a return target
fn return_url_signin(config: &E2eConfig, return_path: &str) -> E2eResult<String> {
    let url = Url::parse_with_params(
        &config.signin_url(),
        &[("reason", "session_expired"), ("returnUrl", return_path)],
    )
    .map_err(|e| E2eError::Config(format!("sign-in URL: {}", e)))?;
    Ok(url.to_string())
}

async fn open_signin(page: &Page, url: &str) -> E2eResult<()> {
    page.goto(url).await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await?;
    page.expect_visible(&SignInForm::username()).await
}

/// Require the page to leave the sign-in path
async fn expect_signed_in(page: &Page, config: &E2eConfig) -> E2eResult<String> {
    let landed = page
        .wait_for_url_leaving(&config.signin_path, page.timeouts().sign_in())
        .await
        .map_err(|e| match e {
            E2eError::Timeout(_) => E2eError::AssertionFailed(format!(
                "still on {} after {} ms",
                config.signin_path,
                page.timeouts().sign_in_ms
            )),
            other => other,
        })?;
    if landed.contains(&config.signin_path) {
        return Err(E2eError::AssertionFailed(format!("still on sign-in: {}", landed)));
    }
    Ok(landed)
}

/// Require the submission to be refused: still on the sign-in path, or an
/// error text on screen.
async fn expect_rejected(page: &Page, config: &E2eConfig, attempt: &str) -> E2eResult<()> {
    page.wait_for_load_state(LoadState::NetworkIdle).await?;
    page.settle().await;

    let url = page.url().await?;
    if url.contains(&config.signin_path) {
        return Ok(());
    }
    for text in REJECTION_TEXTS {
        if page.is_visible(&Locator::text(text)).await? {
            return Ok(());
        }
    }
    Err(E2eError::AssertionFailed(format!("{} left the sign-in page for {}", attempt, url)))
}

/// Fill whichever fields are given and click Sign In
async fn submit_partial(page: &Page, username: Option<&str>, password: Option<&str>) -> E2eResult<()> {
    if let Some(username) = username {
        page.fill(&SignInForm::username(), username).await?;
    }
    if let Some(password) = password {
        page.fill(&SignInForm::password(), password).await?;
    }
    page.click(&SignInForm::submit()).await
}

fn signin_page_loads(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        open_signin(&page, &ctx.config().signin_url()).await?;

        page.expect_visible(&SignInForm::password()).await?;
        page.expect_visible(&SignInForm::submit()).await
    }
    .boxed()
}

fn signin_with_valid_credentials(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        let config = ctx.config();
        let password = config.password()?;

        let landed = sign_in(&page, config, &config.credentials.username, password).await?;
        if landed.contains(&config.signin_path) {
            return Err(E2eError::AssertionFailed(format!("still on sign-in: {}", landed)));
        }
        Ok(())
    }
    .boxed()
}

fn signin_with_tab_navigation(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        let config = ctx.config();
        let password = config.password()?;
        open_signin(&page, &config.signin_url()).await?;

        page.click(&SignInForm::username()).await?;
        page.fill(&SignInForm::username(), &config.credentials.username).await?;
        page.press(&SignInForm::username(), "Tab").await?;
        page.fill(&SignInForm::password(), password).await?;
        page.click(&SignInForm::submit()).await?;

        expect_signed_in(&page, config).await.map(|_| ())
    }
    .boxed()
}

fn signin_with_enter_key(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        let config = ctx.config();
        let password = config.password()?;
        open_signin(&page, &config.signin_url()).await?;

        page.fill(&SignInForm::username(), &config.credentials.username).await?;
        page.fill(&SignInForm::password(), password).await?;
        page.press(&SignInForm::password(), "Enter").await?;

        expect_signed_in(&page, config).await.map(|_| ())
    }
    .boxed()
}

fn signin_with_return_url(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        let config = ctx.config();
        let password = config.password()?;
        open_signin(&page, &return_url_signin(config, RETURN_PATH)?).await?;

        submit_partial(&page, Some(&config.credentials.username), Some(password)).await?;
        let landed = expect_signed_in(&page, config).await?;
        info!("Returned to {}", landed);
        Ok(())
    }
    .boxed()
}

fn signin_with_empty_fields(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        let config = ctx.config();
        open_signin(&page, &config.signin_url()).await?;

        submit_partial(&page, None, None).await?;
        expect_rejected(&page, config, "empty form").await
    }
    .boxed()
}

fn signin_with_invalid_credentials(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        let config = ctx.config();
        open_signin(&page, &config.signin_url()).await?;

        submit_partial(&page, Some("wronguser"), Some("wrongpassword")).await?;
        expect_rejected(&page, config, "unknown account").await
    }
    .boxed()
}

fn signin_with_username_only(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        let config = ctx.config();
        open_signin(&page, &config.signin_url()).await?;

        submit_partial(&page, Some(&config.credentials.username), None).await?;
        expect_rejected(&page, config, "username without password").await
    }
    .boxed()
}

fn signin_with_password_only(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.anonymous_page().await?;
        let config = ctx.config();
        let password = config.password()?;
        open_signin(&page, &config.signin_url()).await?;

        submit_partial(&page, None, Some(password)).await?;
        expect_rejected(&page, config, "password without username").await
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn return_url_is_form_encoded() {
        let config = E2eConfig {
            base_url: "https://console.example".to_string(),
            ..Default::default()
        };
        let url = return_url_signin(&config, RETURN_PATH).unwrap();
        assert_eq!(
            url,
            "https://console.example/signin?reason=session_expired&returnUrl=%2Flocation%3Ftab%3Dlocation"
        );
    }

    #[test]
    fn rejected_attempts_are_tagged_negative() {
        let negative: Vec<_> = cases().into_iter().filter(|c| c.has_tag("negative")).map(|c| c.name).collect();
        assert_eq!(
            negative,
            vec![
                "auth::signin_with_empty_fields",
                "auth::signin_with_invalid_credentials",
                "auth::signin_with_username_only",
                "auth::signin_with_password_only",
            ]
        );
    }
}
