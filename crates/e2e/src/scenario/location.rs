//! Location tree workflows on the 장소 정보 관리 screen

use acs_fixtures::LocationRecord;
use rand::Rng;
use tracing::info;

use crate::choice::choose_option;
use crate::error::E2eResult;
use crate::lifecycle::{EntityState, Lifecycle};
use crate::locator::{AriaRole, Locator};
use crate::page::Page;
use crate::scenario::{cancel_button, delete_and_confirm, edit_button, save};

pub struct LocationForm;

impl LocationForm {
    pub fn add_button() -> Locator {
        Locator::button("장소 추가")
    }

    pub fn name() -> Locator {
        Locator::textbox("장소 이름")
    }

    /// The type select renders without an accessible label
    pub fn kind() -> Locator {
        Locator::label("").exact()
    }

    pub fn order() -> Locator {
        Locator::named(AriaRole::Spinbutton, "표시 순서")
    }
}

pub fn tree_item(name: &str) -> Locator {
    Locator::named(AriaRole::Treeitem, name)
}

/// A location to create, root or child
#[derive(Debug, Clone, PartialEq)]
pub struct NewLocation {
    pub name: String,
    pub kind: Option<String>,
    pub order: u32,
    pub parent: Option<String>,
}

impl NewLocation {
    pub fn root(name: impl Into<String>, order: u32) -> Self {
        Self {
            name: name.into(),
            kind: None,
            order,
            parent: None,
        }
    }

    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn from_record(record: &LocationRecord, position: usize) -> Self {
        Self {
            name: record.name.clone(),
            kind: record.kind.clone(),
            order: record.order.unwrap_or(position as u32 + 1),
            parent: record.parent.clone(),
        }
    }
}

/// Create the location (under its parent, when it has one) and require the
/// new tree item to show up.
pub async fn add<R: Rng + ?Sized>(page: &Page, location: &NewLocation, rng: &mut R) -> E2eResult<Lifecycle> {
    let mut lifecycle = Lifecycle::new(location.name.as_str());
    lifecycle.advance(EntityState::Creating)?;

    match &location.parent {
        Some(parent) => {
            info!("Adding location {} under {}", location.name, parent);
            page.expect_visible(&tree_item(parent)).await?;
            page.click(&tree_item(parent)).await?;
        }
        None => info!("Adding root location {}", location.name),
    }

    page.click(&LocationForm::add_button()).await?;
    page.fill(&LocationForm::name(), &location.name).await?;
    choose_option(page, &LocationForm::kind(), location.kind.as_deref(), rng).await?;
    page.fill(&LocationForm::order(), &location.order.to_string()).await?;
    save(page).await?;

    page.expect_visible(&tree_item(&location.name)).await?;
    lifecycle.advance(EntityState::Created)?;
    Ok(lifecycle)
}

/// Select the item and open it for editing
async fn open_editor(page: &Page, name: &str) -> E2eResult<()> {
    page.click(&tree_item(name)).await?;
    if page.is_visible(&edit_button()).await? {
        page.click(&edit_button()).await?;
    }
    page.expect_visible(&LocationForm::name()).await
}

/// Rename, then require the new name visible and the old one gone
pub async fn rename(page: &Page, lifecycle: &mut Lifecycle, new_name: &str) -> E2eResult<()> {
    lifecycle.advance(EntityState::Editing)?;
    let old_name = lifecycle.entity().to_string();
    info!("Renaming location {} to {}", old_name, new_name);

    open_editor(page, &old_name).await?;
    page.fill(&LocationForm::name(), new_name).await?;
    save(page).await?;

    page.expect_visible(&tree_item(new_name)).await?;
    page.expect_hidden(&tree_item(&old_name)).await?;
    lifecycle.rename(new_name);
    lifecycle.advance(EntityState::Edited)
}

/// Type `attempted` into the editor and cancel; the original name must
/// survive and `attempted` must never appear in the tree.
pub async fn cancel_edit(page: &Page, lifecycle: &mut Lifecycle, attempted: &str) -> E2eResult<()> {
    lifecycle.advance(EntityState::Editing)?;
    let name = lifecycle.entity().to_string();
    info!("Cancelling edit of location {}", name);

    open_editor(page, &name).await?;
    page.fill(&LocationForm::name(), attempted).await?;
    page.click(&cancel_button()).await?;

    page.expect_visible(&tree_item(&name)).await?;
    page.expect_hidden(&tree_item(attempted)).await?;
    lifecycle.cancel_edit()
}

pub async fn delete(page: &Page, lifecycle: &mut Lifecycle) -> E2eResult<()> {
    lifecycle.advance(EntityState::Deleting)?;
    let name = lifecycle.entity().to_string();
    info!("Deleting location {}", name);

    page.click(&tree_item(&name)).await?;
    delete_and_confirm(page).await?;

    page.expect_hidden(&tree_item(&name)).await?;
    lifecycle.advance(EntityState::Absent)
}
