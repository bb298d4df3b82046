//! Location tree: one to three level lifecycles, cancelled edits, dialog
//! checks, fixture import

use std::collections::HashMap;

use chrono::Local;
use futures::future::BoxFuture;
use futures::FutureExt;
use tracing::info;

use crate::choice::unique_name;
use crate::dialog::{DialogEvent, DialogKind};
use crate::error::{E2eError, E2eResult};
use crate::navigation::Surface;
use crate::runner::{TestCase, TestContext};
use crate::scenario::location::{self, NewLocation};
use crate::suites::LOCATION_JSON;

pub fn cases() -> Vec<TestCase> {
    vec![
        TestCase {
            name: "location::root_add_edit_delete",
            tags: &["location", "smoke"],
            run: root_add_edit_delete,
        },
        TestCase {
            name: "location::child_add_edit_delete",
            tags: &["location"],
            run: child_add_edit_delete,
        },
        TestCase {
            name: "location::grandchild_add_edit_delete",
            tags: &["location"],
            run: grandchild_add_edit_delete,
        },
        TestCase {
            name: "location::dialogs_are_anticipated",
            tags: &["location", "dialog"],
            run: dialogs_are_anticipated,
        },
        TestCase {
            name: "location::cancel_edit_keeps_name",
            tags: &["location"],
            run: cancel_edit_keeps_name,
        },
        TestCase {
            name: "location::add_from_json",
            tags: &["location", "fixture"],
            run: add_from_json,
        },
    ]
}

fn root_add_edit_delete(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.open(Surface::LocationManagement).await?;

        let root = NewLocation::root(unique_name("1단_원본"), 1);
        let mut lifecycle = location::add(&page, &root, ctx.rng()).await?;
        location::rename(&page, &mut lifecycle, &unique_name("1단_수정")).await?;
        location::delete(&page, &mut lifecycle).await
    }
    .boxed()
}

fn child_add_edit_delete(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.open(Surface::LocationManagement).await?;

        let parent = NewLocation::root(unique_name("2단_부모"), 10);
        let mut parent_lifecycle = location::add(&page, &parent, ctx.rng()).await?;

        let child = NewLocation::root(unique_name("2단_원본"), 1).child_of(parent.name.as_str());
        let mut child_lifecycle = location::add(&page, &child, ctx.rng()).await?;
        location::rename(&page, &mut child_lifecycle, &unique_name("2단_수정")).await?;
        location::delete(&page, &mut child_lifecycle).await?;

        location::delete(&page, &mut parent_lifecycle).await
    }
    .boxed()
}

fn grandchild_add_edit_delete(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.open(Surface::LocationManagement).await?;

        let top = NewLocation::root(unique_name("3단_부모1"), 10);
        let mut top_lifecycle = location::add(&page, &top, ctx.rng()).await?;
        let middle = NewLocation::root(unique_name("3단_부모2"), 1).child_of(top.name.as_str());
        let mut middle_lifecycle = location::add(&page, &middle, ctx.rng()).await?;

        let leaf = NewLocation::root(unique_name("3단_원본"), 1).child_of(middle.name.as_str());
        let mut leaf_lifecycle = location::add(&page, &leaf, ctx.rng()).await?;
        location::rename(&page, &mut leaf_lifecycle, &unique_name("3단_수정")).await?;
        location::delete(&page, &mut leaf_lifecycle).await?;

        location::delete(&page, &mut middle_lifecycle).await?;
        location::delete(&page, &mut top_lifecycle).await
    }
    .boxed()
}

/// Every dialog raised during `step` must have been answered by the
/// workflow's own subscription, and must be a plain alert or confirm.
fn check_dialogs(step: &str, events: &[DialogEvent]) -> E2eResult<()> {
    for event in events {
        info!("{}: {:?} \"{}\" -> {:?}", step, event.kind, event.message, event.resolution);
        if event.unexpected {
            return Err(E2eError::AssertionFailed(format!(
                "{}: unanticipated {:?} \"{}\"",
                step, event.kind, event.message
            )));
        }
        if !matches!(event.kind, DialogKind::Alert | DialogKind::Confirm) {
            return Err(E2eError::AssertionFailed(format!("{}: {:?} dialog raised", step, event.kind)));
        }
        if event.message.trim().is_empty() {
            return Err(E2eError::AssertionFailed(format!("{}: dialog without a message", step)));
        }
        if !event.resolution.is_accept() {
            return Err(E2eError::AssertionFailed(format!("{}: \"{}\" was dismissed", step, event.message)));
        }
    }
    Ok(())
}

fn dialogs_are_anticipated(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.open(Surface::LocationManagement).await?;
        page.take_dialogs();

        let root = NewLocation::root(unique_name("다이얼로그"), 1);
        let mut lifecycle = location::add(&page, &root, ctx.rng()).await?;
        check_dialogs("save", &page.take_dialogs())?;

        location::rename(&page, &mut lifecycle, &unique_name("다이얼로그_수정")).await?;
        check_dialogs("edit", &page.take_dialogs())?;

        location::delete(&page, &mut lifecycle).await?;
        check_dialogs("delete", &page.take_dialogs())
    }
    .boxed()
}

fn cancel_edit_keeps_name(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let page = ctx.open(Surface::LocationManagement).await?;

        let root = NewLocation::root(unique_name("취소_원본"), 1);
        let mut lifecycle = location::add(&page, &root, ctx.rng()).await?;
        location::cancel_edit(&page, &mut lifecycle, &unique_name("변경취소")).await?;
        location::delete(&page, &mut lifecycle).await
    }
    .boxed()
}

/// Suffix every fixture name (and parent reference) with one run stamp so
/// reruns against the same backend do not collide.
fn stamped(locations: Vec<NewLocation>, stamp: &str) -> Vec<NewLocation> {
    let renamed: HashMap<String, String> = locations
        .iter()
        .map(|l| (l.name.clone(), format!("{}_{}", l.name, stamp)))
        .collect();
    locations
        .into_iter()
        .map(|mut l| {
            l.name = renamed[&l.name].clone();
            l.parent = l.parent.map(|p| renamed.get(&p).cloned().unwrap_or(p));
            l
        })
        .collect()
}

fn add_from_json(ctx: &mut TestContext) -> BoxFuture<'_, E2eResult<()>> {
    async move {
        let records = acs_fixtures::load_locations(&ctx.fixture_path(LOCATION_JSON), None)?;
        let stamp = Local::now().format("%m%d%H%M%S").to_string();
        let locations = stamped(
            records
                .iter()
                .enumerate()
                .map(|(i, r)| NewLocation::from_record(r, i))
                .collect(),
            &stamp,
        );

        let page = ctx.open(Surface::LocationManagement).await?;
        let mut added = Vec::with_capacity(locations.len());
        for location in &locations {
            added.push(location::add(&page, location, ctx.rng()).await?);
        }

        // Children were added after their parents
        for lifecycle in added.iter_mut().rev() {
            location::delete(&page, lifecycle).await?;
        }
        Ok(())
    }
    .boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialog::Resolution;

    fn event(kind: DialogKind, message: &str, unexpected: bool) -> DialogEvent {
        DialogEvent {
            page: 1,
            kind,
            message: message.to_string(),
            default_value: String::new(),
            resolution: Resolution::accept(),
            handled_by: None,
            unexpected,
        }
    }

    #[test]
    fn anticipated_confirms_pass() {
        let events = vec![
            event(DialogKind::Confirm, "저장하시겠습니까?", false),
            event(DialogKind::Alert, "저장되었습니다", false),
        ];
        assert!(check_dialogs("save", &events).is_ok());
        assert!(check_dialogs("edit", &[]).is_ok());
    }

    #[test]
    fn unanticipated_dialog_fails_the_step() {
        let events = vec![event(DialogKind::Confirm, "삭제하시겠습니까?", false), event(DialogKind::Alert, "오류", true)];
        let err = check_dialogs("delete", &events).unwrap_err();
        assert!(err.to_string().contains("delete: unanticipated Alert"));
    }

    #[test]
    fn prompt_and_dismissed_dialogs_fail() {
        assert!(check_dialogs("save", &[event(DialogKind::Prompt, "이름?", false)]).is_err());

        let mut dismissed = event(DialogKind::Confirm, "저장하시겠습니까?", false);
        dismissed.resolution = Resolution::Dismiss;
        assert!(check_dialogs("save", &[dismissed]).is_err());
    }

    #[test]
    fn stamping_keeps_parent_links() {
        let locations = vec![
            NewLocation::root("본관", 1),
            NewLocation::root("회의실", 1).child_of("본관"),
            NewLocation::root("창고", 2).child_of("외부"),
        ];
        let stamped = stamped(locations, "0101");
        assert_eq!(stamped[0].name, "본관_0101");
        assert_eq!(stamped[1].parent.as_deref(), Some("본관_0101"));
        assert_eq!(stamped[2].parent.as_deref(), Some("외부"));
    }
}
