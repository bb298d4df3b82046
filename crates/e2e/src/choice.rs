//! Dropdown choices and unique entity names

use chrono::Local;
use rand::seq::SliceRandom;
use rand::Rng;
use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::locator::{AriaRole, Locator};
use crate::page::Page;

/// Option labels that stand for "nothing selected"
const PLACEHOLDERS: &[&str] = &["선택", "전체"];

pub fn is_placeholder(label: &str) -> bool {
    let label = label.trim();
    label.is_empty()
        || PLACEHOLDERS.contains(&label)
        || label.starts_with("--")
        || label.starts_with("선택")
}

/// Uniform pick among the real options, `None` if there are none
pub fn pick_option<'a, R: Rng + ?Sized>(options: &'a [String], rng: &mut R) -> Option<&'a str> {
    let real: Vec<&'a str> = options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !is_placeholder(o))
        .collect();
    real.choose(rng).copied()
}

/// Decide which option to select: `preferred` must be offered, otherwise a
/// real option is drawn at random.
pub fn resolve_option<R: Rng + ?Sized>(
    options: &[String],
    preferred: Option<&str>,
    rng: &mut R,
) -> E2eResult<String> {
    match preferred {
        Some(wanted) => options
            .iter()
            .find(|o| o.trim() == wanted)
            .map(|o| o.trim().to_string())
            .ok_or_else(|| {
                E2eError::AssertionFailed(format!("option '{}' not offered (have: {})", wanted, options.join(", ")))
            }),
        None => pick_option(options, rng)
            .map(String::from)
            .ok_or_else(|| E2eError::AssertionFailed("dropdown offers no selectable option".to_string())),
    }
}

/// Labels of the options in the open dropdown. The listbox is rendered in
/// a portal, so options are looked up page-wide.
async fn open_options(page: &Page, trigger: &Locator) -> E2eResult<Vec<String>> {
    page.click(trigger).await?;
    page.wait_visible(&Locator::role(AriaRole::Listbox), page.timeouts().action())
        .await?;
    page.inner_texts(&Locator::role(AriaRole::Option)).await
}

fn option(label: &str) -> Locator {
    Locator::named(AriaRole::Option, label)
}

/// Open the dropdown behind `trigger` and pick `preferred`, or a random real
/// option when the fixture leaves it open. Returns the selected label.
pub async fn choose_option<R: Rng + ?Sized>(
    page: &Page,
    trigger: &Locator,
    preferred: Option<&str>,
    rng: &mut R,
) -> E2eResult<String> {
    let options = open_options(page, trigger).await?;
    let label = resolve_option(&options, preferred, rng)?;
    debug!("{}: selecting '{}'", trigger, label);
    page.click(&option(&label)).await?;
    Ok(label)
}

/// Multi-select variant. Every wanted label must be offered; with nothing
/// wanted, between one and `max_random` real options are drawn.
pub async fn choose_many<R: Rng + ?Sized>(
    page: &Page,
    trigger: &Locator,
    wanted: &[String],
    max_random: usize,
    rng: &mut R,
) -> E2eResult<Vec<String>> {
    let options = open_options(page, trigger).await?;
    let labels = resolve_many(&options, wanted, max_random, rng)?;
    for label in &labels {
        page.click(&option(label)).await?;
    }
    page.press_key("Escape").await?;
    Ok(labels)
}

pub fn resolve_many<R: Rng + ?Sized>(
    options: &[String],
    wanted: &[String],
    max_random: usize,
    rng: &mut R,
) -> E2eResult<Vec<String>> {
    if !wanted.is_empty() {
        return wanted
            .iter()
            .map(|w| resolve_option(options, Some(w.as_str()), rng))
            .collect();
    }
    let real: Vec<&str> = options
        .iter()
        .map(|o| o.trim())
        .filter(|o| !is_placeholder(o))
        .collect();
    if real.is_empty() {
        return Err(E2eError::AssertionFailed("dropdown offers no selectable option".to_string()));
    }
    let count = rng.gen_range(1..=max_random.clamp(1, real.len()));
    Ok(real
        .choose_multiple(rng, count)
        .map(|s| s.to_string())
        .collect())
}

/// `prefix` followed by a local timestamp, unique enough across runs that
/// share one backend
pub fn unique_name(prefix: &str) -> String {
    format!("{}_{}", prefix, Local::now().format("%m%d%H%M%S%3f"))
}
