//! ACS E2E Test Suite
//!
//! Browser-driven tests for the access-control management console:
//! - Drives Playwright through a long-lived Node driver process
//! - Signs in once and shares the session across tests
//! - Resolves native dialogs through per-page subscriptions
//! - Feeds JSON/xlsx fixtures and image assets into create/edit/delete flows
//! - Captures a screenshot for every failed test
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── Harness (lazy)                                       │
//! │    │     ├── Driver ── node driver.js ── Playwright         │
//! │    │     │     └── DialogRouter (per-page subscriptions)    │
//! │    │     └── Session (one signed-in browser context)        │
//! │    ├── run(cases) -> TestSuiteResult                        │
//! │    └── FailureCapture on Failed                             │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestCase { name, tags, run(&mut TestContext) }             │
//! │    ├── navigate_to(Surface)                                 │
//! │    ├── scenario::{employee, location}                       │
//! │    │     └── Lifecycle: absent → created → edited → absent  │
//! │    └── acs_fixtures::{load_*, ImageAssets}                  │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod capture;
pub mod choice;
pub mod config;
pub mod dialog;
pub mod error;
pub mod lifecycle;
pub mod locator;
pub mod navigation;
pub mod page;
pub mod playwright;
pub mod runner;
pub mod scenario;
pub mod server;
pub mod session;
pub mod suites;

pub use config::E2eConfig;
pub use error::{E2eError, E2eResult};
pub use runner::{TestCase, TestRunner};
