//! Menu navigation to the management screens

use tracing::debug;

use crate::error::{E2eError, E2eResult};
use crate::locator::{AriaRole, Locator};
use crate::page::{LoadState, Page};

/// Top-level menu group holding both management screens
const ACCESS_MENU: &str = "출입 통합 관리";

/// Management screens reachable from the side menu
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Surface {
    EmployeeManagement,
    LocationManagement,
}

impl Surface {
    pub const ALL: [Surface; 2] = [Surface::EmployeeManagement, Surface::LocationManagement];

    /// Locators clicked in order, top level first
    pub fn menu_path(&self) -> Vec<Locator> {
        match self {
            Surface::EmployeeManagement => vec![
                Locator::button(ACCESS_MENU),
                Locator::button("임직원 출입자 관리"),
                Locator::named(AriaRole::Tab, "임직원 출입자"),
            ],
            Surface::LocationManagement => vec![
                Locator::button(ACCESS_MENU),
                Locator::button("장소 정보 관리"),
            ],
        }
    }

    /// Element that only exists once the screen has rendered
    pub fn signature(&self) -> Locator {
        match self {
            Surface::EmployeeManagement => Locator::button("임직원 추가"),
            Surface::LocationManagement => Locator::button("장소 추가"),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Surface::EmployeeManagement => "임직원 출입자 관리",
            Surface::LocationManagement => "장소 정보 관리",
        }
    }
}

/// Navigate from the home page to `surface`.
///
/// Always starts from the home page, so it does not depend on where a
/// previous test left this (or another) page.
pub async fn navigate_to<'p>(page: &'p Page, home_url: &str, surface: Surface) -> E2eResult<&'p Page> {
    debug!("Navigating to {:?}", surface);

    page.goto(home_url).await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await?;

    for step in surface.menu_path() {
        page.wait_visible(&step, page.timeouts().action()).await?;
        page.click(&step).await?;
        page.wait_for_load_state(LoadState::NetworkIdle).await?;
    }

    page.expect_visible(&surface.signature()).await.map_err(|e| match e {
        E2eError::AssertionFailed(detail) => {
            E2eError::AssertionFailed(format!("{} did not render: {}", surface.title(), detail))
        }
        other => other,
    })?;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_paths_start_at_the_access_group() {
        for surface in Surface::ALL {
            let path = surface.menu_path();
            assert!(path.len() >= 2);
            assert_eq!(path[0], Locator::button(ACCESS_MENU));
        }
    }

    #[test]
    fn employee_path_ends_on_its_tab() {
        let path = Surface::EmployeeManagement.menu_path();
        assert_eq!(path.last().unwrap().to_string(), r#"tab[name="임직원 출입자"]"#);
    }
}
