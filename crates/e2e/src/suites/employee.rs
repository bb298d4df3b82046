//! Employee management: data-driven adds and removals, edit, search, single
//! and bulk delete

use std::collections::HashSet;
use std::path::Path;

use acs_fixtures::{EmployeeRecord, ImageAsset};
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use crate::choice::unique_name;
use crate::dialog::{DialogMatcher, Lifetime, Resolution};
use crate::error::{E2eError, E2eResult};
use crate::lifecycle::Lifecycle;
use crate::locator::{AriaRole, Locator};
use crate::navigation::Surface;
use crate::runner::{TestCase, TestContext};
use crate::scenario::employee::{self, NewEmployee, RemovalTarget};
use crate::suites::{EMPLOYEE_JSON, EMPLOYEE_REMOVE_JSON, EMPLOYEE_SHEET};

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "employee::add_edit_delete",
            tags: &["employee", "smoke"],
            run: add_edit_delete,
        },
        TestCase {
            name: "employee::search_and_delete",
            tags: &["employee"],
            run: search_and_delete,
        },
        TestCase {
            name: "employee::add_from_json",
            tags: &["employee", "fixture"],
            run: add_from_json,
        },
        TestCase {
            name: "employee::add_from_sheet",
            tags: &["employee", "fixture"],
            run: add_from_sheet,
        },
        TestCase {
            name: "employee::remove_from_json",
            tags: &["employee", "fixture"],
            run: remove_from_json,
        },
    ]
}

fn add_edit_delete(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let images = ctx.images()?;
        let page = ctx.open(Surface::EmployeeManagement).await?;

        let employee = NewEmployee::new(EmployeeRecord::default(), images.iter().next());
        let mut lifecycle = employee::add(&page, &employee, ctx.rng()).await?;
        employee::rename(&page, &mut lifecycle, &employee.name, &unique_name("수정")).await?;
        employee::delete(&page, &mut lifecycle).await
    }
    .boxed()
}

fn search_and_delete(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let images = ctx.images()?;
        let page = ctx.open(Surface::EmployeeManagement).await?;

        let employee = NewEmployee::new(EmployeeRecord::default(), images.iter().next());
        let mut lifecycle = employee::add(&page, &employee, ctx.rng()).await?;

        let page = ctx.open(Surface::EmployeeManagement).await?;
        employee::search(&page, &employee.name).await?;
        page.expect_visible(&employee::cell(&employee.employee_no)).await?;
        employee::delete(&page, &mut lifecycle).await
    }
    .boxed()
}

/// Every expected identifier must sit in a list cell, and no two of them
/// may be the same.
fn check_listed(listed: &[String], expected: &[&str]) -> E2eResult<()> {
    let distinct: HashSet<&str> = expected.iter().copied().collect();
    if distinct.len() != expected.len() {
        return Err(E2eError::AssertionFailed(format!(
            "{} employees added but only {} distinct identifiers",
            expected.len(),
            distinct.len()
        )));
    }

    let cells: HashSet<&str> = listed.iter().map(|c| c.trim()).collect();
    let missing: Vec<&str> = expected.iter().copied().filter(|id| !cells.contains(id)).collect();
    if !missing.is_empty() {
        return Err(E2eError::AssertionFailed(format!(
            "not in the employee list: {}",
            missing.join(", ")
        )));
    }
    Ok(())
}

/// Load `file`, pair each record with an image, add them all, check the
/// list shows every image stem, then remove them again in one bulk delete.
async fn add_fixture_batch(ctx: &mut TestContext, file: &Path) -> E2eResult<()> {
    let records = acs_fixtures::load_employees(file, None)?;
    let paired: Vec<(EmployeeRecord, ImageAsset)> = ctx.images()?.pair_with(records)?;
    info!("{} employee(s) from {}", paired.len(), file.display());

    let page = ctx.open(Surface::EmployeeManagement).await?;
    let mut added: Vec<Lifecycle> = Vec::with_capacity(paired.len());
    for (record, asset) in &paired {
        let employee = NewEmployee::new(record.clone(), Some(asset));
        added.push(employee::add(&page, &employee, ctx.rng()).await?);
    }

    let listed = page.inner_texts(&Locator::role(AriaRole::Cell)).await?;
    let stems: Vec<&str> = paired.iter().map(|(_, a)| a.stem.as_str()).collect();
    check_listed(&listed, &stems)?;

    employee::bulk_delete(&page, &mut added).await
}

fn add_from_json(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let file = ctx.fixture_path(EMPLOYEE_JSON);
        add_fixture_batch(ctx, &file).await
    }
    .boxed()
}

fn add_from_sheet(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let file = ctx.fixture_path(EMPLOYEE_SHEET);
        add_fixture_batch(ctx, &file).await
    }
    .boxed()
}

/// Each entry deletes the named employee, or the top row when it has no name.
fn remove_from_json(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let records = acs_fixtures::load_employees(&ctx.fixture_path(EMPLOYEE_REMOVE_JSON), None)?;
        let targets: Vec<RemovalTarget> = records.iter().map(RemovalTarget::of).collect();

        let page = ctx.open(Surface::EmployeeManagement).await?;
        let _confirmations = page.on_dialog(DialogMatcher::Any, Resolution::accept(), Lifetime::Persistent);

        let mut removed = Vec::new();
        for target in &targets {
            if let Some(label) = employee::remove(&page, target).await? {
                removed.push(label);
            }
        }
        info!("Removed {} of {} employee(s): {}", removed.len(), targets.len(), removed.join(", "));
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(texts: &[&str]) -> Vec<String> {
        texts.iter().map(|t| t.to_string()).collect()
    }

    #[test]
    fn listed_identifiers_pass() {
        let listed = cells(&["", "1000508 ", "홍길동", "1000509", "개발팀"]);
        assert!(check_listed(&listed, &["1000508", "1000509"]).is_ok());
    }

    #[test]
    fn identifier_missing_from_the_list_fails() {
        let listed = cells(&["1000508", "홍길동"]);
        let err = check_listed(&listed, &["1000508", "1000509"]).unwrap_err();
        assert!(err.to_string().ends_with("not in the employee list: 1000509"));
    }

    #[test]
    fn duplicate_identifiers_fail_even_when_listed() {
        let listed = cells(&["1000508"]);
        let err = check_listed(&listed, &["1000508", "1000508"]).unwrap_err();
        assert!(matches!(err, E2eError::AssertionFailed(_)));
    }
}
