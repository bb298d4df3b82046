//! Test runner: executes registered cases against the shared session

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use acs_fixtures::ImageAssets;
use futures::future::BoxFuture;
use futures::stream::{self, StreamExt};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::config::E2eConfig;
use crate::dialog::DialogEvent;
use crate::error::{E2eError, E2eResult};
use crate::navigation::{navigate_to, Surface};
use crate::page::Page;
use crate::session::Harness;

/// Body of a test case
pub type TestFn = for<'a> fn(&'a mut TestContext) -> BoxFuture<'a, E2eResult<()>>;

/// A registered test
#[derive(Clone, Copy)]
pub struct TestCase {
    pub name: &'static str,
    pub tags: &'static [&'static str],
    pub run: TestFn,
}

impl TestCase {
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(&tag)
    }
}

impl std::fmt::Debug for TestCase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TestCase")
            .field("name", &self.name)
            .field("tags", &self.tags)
            .finish()
    }
}

/// Keep the cases matching `name` (exact) and `tag`
pub fn select(cases: Vec<TestCase>, name: Option<&str>, tag: Option<&str>) -> Vec<TestCase> {
    cases
        .into_iter()
        .filter(|c| name.map_or(true, |n| c.name == n))
        .filter(|c| tag.map_or(true, |t| c.has_tag(t)))
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Passed,
    Failed,
    /// Fixture or assets unavailable in this environment
    Skipped,
    /// Not run because an earlier fatal error made it moot
    Aborted,
}

impl Outcome {
    pub fn of(result: &E2eResult<()>) -> Self {
        match result {
            Ok(()) => Outcome::Passed,
            Err(e) if e.is_skip() => Outcome::Skipped,
            Err(_) => Outcome::Failed,
        }
    }
}

/// Result of running a single test
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub outcome: Outcome,
    pub duration_ms: u64,
    pub error: Option<String>,
    pub screenshot: Option<PathBuf>,
    pub dialogs: Vec<DialogEvent>,
}

/// Result of running all tests
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub aborted: usize,
    pub seed: u64,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0 && self.aborted == 0
    }
}

/// Everything a test body gets: the shared session, a lazily opened page,
/// and its own seeded RNG.
pub struct TestContext {
    name: &'static str,
    harness: Arc<Harness>,
    rng: StdRng,
    page: Option<Page>,
    anonymous: Vec<Page>,
}

impl TestContext {
    pub fn new(name: &'static str, harness: Arc<Harness>, seed: u64) -> Self {
        Self {
            name,
            harness,
            rng: StdRng::seed_from_u64(seed),
            page: None,
            anonymous: Vec::new(),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn config(&self) -> &E2eConfig {
        self.harness.config()
    }

    pub fn rng(&mut self) -> &mut StdRng {
        &mut self.rng
    }

    /// Page in the authenticated context, opened (and signed in) on first use
    pub async fn page(&mut self) -> E2eResult<Page> {
        if let Some(page) = &self.page {
            return Ok(page.clone());
        }
        let session = self.harness.session().await?;
        let page = session.new_page().await?;
        self.page = Some(page.clone());
        Ok(page)
    }

    /// Authenticated page positioned on `surface`
    pub async fn open(&mut self, surface: Surface) -> E2eResult<Page> {
        let page = self.page().await?;
        navigate_to(&page, &self.config().home_url(), surface).await?;
        Ok(page)
    }

    /// Page that has never signed in
    pub async fn anonymous_page(&mut self) -> E2eResult<Page> {
        let page = self.harness.anonymous_page().await?;
        self.anonymous.push(page.clone());
        Ok(page)
    }

    pub fn fixture_path(&self, file: &str) -> PathBuf {
        self.config().fixtures_dir.join(file)
    }

    pub fn images(&self) -> E2eResult<ImageAssets> {
        Ok(ImageAssets::scan(&self.config().images_dir)?)
    }

    fn pages(&self) -> impl Iterator<Item = &Page> {
        self.page.iter().chain(self.anonymous.iter())
    }

    async fn finish(self, failed: bool) -> (Option<PathBuf>, Vec<DialogEvent>) {
        let screenshot = match self.pages().last() {
            Some(page) if failed => self.harness.capture().capture(page, self.name).await,
            _ => None,
        };

        let mut dialogs = Vec::new();
        for page in self.pages() {
            dialogs.extend(page.take_dialogs());
            if let Err(e) = page.close().await {
                debug!("Closing page {}: {}", page.id(), e);
            }
        }
        (screenshot, dialogs)
    }
}

/// Runs test cases, up to `jobs` at a time, against one harness
pub struct TestRunner {
    harness: Arc<Harness>,
    jobs: usize,
    seed: u64,
    aborted: AtomicBool,
    abort_reason: Mutex<Option<String>>,
}

impl TestRunner {
    pub fn new(config: E2eConfig) -> Self {
        let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
        Self {
            harness: Arc::new(Harness::new(Arc::new(config))),
            jobs: 1,
            seed,
            aborted: AtomicBool::new(false),
            abort_reason: Mutex::new(None),
        }
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn harness(&self) -> &Arc<Harness> {
        &self.harness
    }

    /// Run `cases` and report them in registration order
    pub async fn run(&self, cases: &[TestCase]) -> TestSuiteResult {
        let start = Instant::now();
        info!(
            "Running {} test(s), {} at a time, seed {}",
            cases.len(),
            self.jobs,
            self.seed
        );

        let mut indexed: Vec<(usize, TestResult)> = stream::iter(cases.iter().enumerate())
            .map(|(i, case)| async move { (i, self.run_case(case, i).await) })
            .buffer_unordered(self.jobs)
            .collect()
            .await;
        indexed.sort_by_key(|(i, _)| *i);
        let results: Vec<TestResult> = indexed.into_iter().map(|(_, r)| r).collect();

        let count = |outcome: Outcome| results.iter().filter(|r| r.outcome == outcome).count();
        let suite = TestSuiteResult {
            total: results.len(),
            passed: count(Outcome::Passed),
            failed: count(Outcome::Failed),
            skipped: count(Outcome::Skipped),
            aborted: count(Outcome::Aborted),
            seed: self.seed,
            duration_ms: start.elapsed().as_millis() as u64,
            results,
        };

        info!(
            "Test Results: {} passed, {} failed, {} skipped, {} aborted ({} ms)",
            suite.passed, suite.failed, suite.skipped, suite.aborted, suite.duration_ms
        );
        suite
    }

    async fn run_case(&self, case: &TestCase, index: usize) -> TestResult {
        if self.aborted.load(Ordering::SeqCst) {
            let reason = self.abort_reason.lock().clone().unwrap_or_default();
            warn!("- {} aborted", case.name);
            return TestResult {
                name: case.name.to_string(),
                outcome: Outcome::Aborted,
                duration_ms: 0,
                error: Some(format!("aborted: {}", reason)),
                screenshot: None,
                dialogs: Vec::new(),
            };
        }

        let start = Instant::now();
        debug!("Running test: {}", case.name);

        let mut ctx = TestContext::new(case.name, self.harness.clone(), self.seed.wrapping_add(index as u64));
        let result = (case.run)(&mut ctx).await;
        let outcome = Outcome::of(&result);
        let (screenshot, dialogs) = ctx.finish(outcome == Outcome::Failed).await;
        let duration_ms = start.elapsed().as_millis() as u64;

        match (&outcome, &result) {
            (Outcome::Passed, _) => info!("✓ {} ({} ms)", case.name, duration_ms),
            (Outcome::Skipped, Err(e)) => info!("○ {} skipped: {}", case.name, e),
            (_, Err(e)) => {
                error!("✗ {} - {}", case.name, e);
                if e.is_fatal() {
                    self.abort(e);
                }
            }
            _ => {}
        }

        TestResult {
            name: case.name.to_string(),
            outcome,
            duration_ms,
            error: result.err().map(|e| e.to_string()),
            screenshot,
            dialogs,
        }
    }

    fn abort(&self, cause: &E2eError) {
        error!("Fatal: {}; remaining tests are aborted", cause);
        *self.abort_reason.lock() = Some(cause.to_string());
        self.aborted.store(true, Ordering::SeqCst);
    }

    /// Close the session and stop the browser
    pub async fn shutdown(&self) -> E2eResult<()> {
        self.harness.shutdown().await
    }

    /// Write `results` as `test-results.json` under `dir`
    pub fn write_results(&self, dir: &Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        std::fs::create_dir_all(dir)?;

        let path = dir.join("test-results.json");
        let json = serde_json::to_string_pretty(results)?;
        std::fs::write(&path, json)?;

        info!("Results written to: {}", path.display());
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use acs_fixtures::FixtureError;
    use futures::FutureExt;

    fn passes(_: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
        async { Ok(()) }.boxed()
    }

    fn lacks_fixture(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
        async move {
            let path = ctx.fixture_path("missing.json");
            acs_fixtures::load_employees(&path, None)?;
            Ok(())
        }
        .boxed()
    }

    fn asserts(_: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
        async { Err(E2eError::AssertionFailed("cell not visible".into())) }.boxed()
    }

    fn cannot_sign_in(_: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
        async { Err(E2eError::Authentication("still on /signin".into())) }.boxed()
    }

    fn case(name: &'static str, run: TestFn) -> TestCase {
        TestCase { name, tags: &["unit"], run }
    }

    fn runner(dir: &Path) -> TestRunner {
        let config = E2eConfig {
            fixtures_dir: dir.to_path_buf(),
            report_dir: dir.join("report"),
            seed: Some(11),
            ..Default::default()
        };
        TestRunner::new(config)
    }

    #[test]
    fn outcome_classification() {
        assert_eq!(Outcome::of(&Ok(())), Outcome::Passed);
        let missing: E2eResult<()> = Err(FixtureError::NotFound(PathBuf::from("x.json")).into());
        assert_eq!(Outcome::of(&missing), Outcome::Skipped);
        let timeout: E2eResult<()> = Err(E2eError::Timeout("waitFor".into()));
        assert_eq!(Outcome::of(&timeout), Outcome::Failed);
    }

    #[tokio::test]
    async fn skips_fail_and_abort_without_a_browser() {
        let dir = tempfile::tempdir().unwrap();
        let runner = runner(dir.path());
        let cases = [
            case("passes", passes),
            case("lacks_fixture", lacks_fixture),
            case("asserts", asserts),
            case("cannot_sign_in", cannot_sign_in),
            case("after_fatal", passes),
        ];

        let suite = runner.run(&cases).await;
        let outcomes: Vec<Outcome> = suite.results.iter().map(|r| r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                Outcome::Passed,
                Outcome::Skipped,
                Outcome::Failed,
                Outcome::Failed,
                Outcome::Aborted
            ]
        );
        assert_eq!(suite.seed, 11);
        assert!(!suite.success());
        assert!(suite.results.iter().all(|r| r.screenshot.is_none()));

        let path = runner.write_results(&dir.path().join("report"), &suite).unwrap();
        let back: TestSuiteResult = serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(back.aborted, 1);
        assert_eq!(back.results[1].outcome, Outcome::Skipped);

        runner.shutdown().await.unwrap();
    }

    #[test]
    fn select_filters_by_name_and_tag() {
        let cases = vec![
            TestCase { name: "a", tags: &["auth"], run: passes },
            TestCase { name: "b", tags: &["location"], run: passes },
        ];
        assert_eq!(select(cases.clone(), Some("b"), None).len(), 1);
        assert_eq!(select(cases.clone(), None, Some("auth"))[0].name, "a");
        assert!(select(cases, Some("a"), Some("location")).is_empty());
    }
}
