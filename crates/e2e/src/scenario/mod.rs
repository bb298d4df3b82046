//! Entity workflows driven through the UI
//!
//! Each workflow step advances a [`Lifecycle`](crate::lifecycle::Lifecycle)
//! only after the screen shows the state the step was meant to reach.

pub mod employee;
pub mod location;

use crate::dialog::{DialogMatcher, Lifetime, Resolution};
use crate::error::E2eResult;
use crate::locator::{AriaRole, Locator};
use crate::page::{LoadState, Page};

pub fn save_button() -> Locator {
    Locator::button("저장")
}

pub fn edit_button() -> Locator {
    Locator::button("수정")
}

pub fn delete_button() -> Locator {
    Locator::button("삭제").first()
}

pub fn cancel_button() -> Locator {
    Locator::button("취소")
}

/// Click 저장 and accept the one confirmation it may raise
pub(crate) async fn save(page: &Page) -> E2eResult<()> {
    let _confirm = page.on_dialog(DialogMatcher::Any, Resolution::accept(), Lifetime::Once);
    page.click(&save_button()).await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await
}

/// Click 삭제 and confirm, whether the console asks natively or with its own
/// modal.
pub(crate) async fn delete_and_confirm(page: &Page) -> E2eResult<()> {
    let _confirm = page.accept_next_dialog("삭제");
    page.click(&delete_button()).await?;

    let modal_confirm = Locator::button("삭제").within(Locator::role(AriaRole::Dialog));
    if page.is_visible(&modal_confirm).await? {
        page.click(&modal_confirm).await?;
    }
    page.wait_for_load_state(LoadState::NetworkIdle).await
}
