//! E2E test harness entry point
//!
//! Runs the registered browser tests against a deployed console.
//! Run with: cargo test --package acs-e2e --test e2e -- --base-url https://console.example
//!
//! Without a target (no `--base-url`, `--config` or `ACS_E2E_BASE_URL`) the
//! binary exits successfully without launching a browser, so a plain
//! `cargo test` of the workspace stays offline.

use std::path::PathBuf;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use acs_e2e::runner::select;
use acs_e2e::server::wait_until_reachable;
use acs_e2e::{suites, E2eConfig, E2eError, E2eResult, TestRunner};

#[derive(Parser, Debug)]
#[command(name = "acs-e2e")]
#[command(about = "E2E test runner for the ACS management console")]
struct Args {
    /// YAML configuration file
    #[arg(short, long, env = "ACS_E2E_CONFIG")]
    config: Option<PathBuf>,

    /// Console base URL (overrides config and environment)
    #[arg(long)]
    base_url: Option<String>,

    /// Run only tests matching this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only a specific test by name
    #[arg(short, long)]
    name: Option<String>,

    /// Tests to run concurrently, each on its own page
    #[arg(short, long, default_value = "1")]
    jobs: usize,

    /// Seed for randomized choices
    #[arg(long)]
    seed: Option<u64>,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long)]
    browser: Option<String>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Do not check the console before launching the browser
    #[arg(long)]
    skip_preflight: bool,

    /// Print the registered tests and exit
    #[arg(long)]
    list: bool,

    /// Output directory for results
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

fn has_target(args: &Args) -> bool {
    args.base_url.is_some() || args.config.is_some() || std::env::var_os("ACS_E2E_BASE_URL").is_some()
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let cases = select(suites::all(), args.name.as_deref(), args.tag.as_deref());

    if args.list {
        for case in &cases {
            println!("{} [{}]", case.name, case.tags.join(", "));
        }
        return Ok(true);
    }
    if !has_target(&args) {
        warn!("No console configured (--base-url, --config or ACS_E2E_BASE_URL); nothing to run");
        return Ok(true);
    }
    if cases.is_empty() {
        return Err(E2eError::Config("no test matches the given name/tag".to_string()));
    }

    let mut config = E2eConfig::load(args.config.as_deref())?;
    if let Some(base_url) = args.base_url {
        config.base_url = base_url;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(browser) = args.browser {
        config.playwright.browser = browser.parse()?;
    }
    if args.headed {
        config.playwright.headless = false;
    }
    if let Some(output) = args.output {
        config.report_dir = output;
    }

    if !args.skip_preflight {
        wait_until_reachable(
            &config.home_url(),
            config.timeouts.preflight(),
            config.playwright.ignore_https_errors,
        )
        .await?;
    }

    let report_dir = config.report_dir.clone();
    let runner = TestRunner::new(config).with_jobs(args.jobs);
    info!("Seed {} (set ACS_E2E_SEED or --seed to reproduce)", runner.seed());

    let results = runner.run(&cases).await;
    if let Err(e) = runner.shutdown().await {
        warn!("Shutdown: {}", e);
    }
    runner.write_results(&report_dir, &results)?;

    Ok(results.success())
}
