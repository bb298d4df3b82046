//! Employee workflows on the 임직원 출입자 관리 screen
//!
//! Employees are identified in the list by their employee number (사번),
//! which is the image file stem when the fixture comes with photos.

use std::path::PathBuf;

use acs_fixtures::{EmployeeRecord, ImageAsset};
use chrono::{Local, NaiveDate};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::choice::{choose_many, choose_option, unique_name};
use crate::dialog::{DialogMatcher, Lifetime, Resolution};
use crate::error::{E2eError, E2eResult};
use crate::lifecycle::{EntityState, Lifecycle};
use crate::locator::{AriaRole, Locator};
use crate::page::{LoadState, Page};
use crate::scenario::{delete_and_confirm, edit_button, save};

const ADD_PATH: &str = "employeeadd";
const EMAIL_DOMAIN: &str = "acs.test";
const MAX_RANDOM_ACCESS_CASES: usize = 5;

/// Form controls of the add/edit screen
pub struct EmployeeForm;

impl EmployeeForm {
    pub fn add_button() -> Locator {
        Locator::button("임직원 추가")
    }

    pub fn employee_no() -> Locator {
        Locator::label("사번")
    }

    pub fn name() -> Locator {
        Locator::label("이름")
    }

    pub fn email() -> Locator {
        Locator::label("이메일")
    }

    pub fn note() -> Locator {
        Locator::label("비고")
    }

    pub fn department() -> Locator {
        Locator::css("#mui-component-select-departmentId")
    }

    pub fn job_grade() -> Locator {
        Locator::css("#mui-component-select-jobGradeId")
    }

    pub fn job_position() -> Locator {
        Locator::css("#mui-component-select-jobPositionId")
    }

    pub fn access_cases() -> Locator {
        Locator::css("#mui-component-select-accessCaseId")
    }

    pub fn rf_cards() -> Locator {
        Locator::named(AriaRole::Combobox, "출입 카드")
    }

    fn start_date_group() -> Locator {
        Locator::named(AriaRole::Group, "발령 시작일")
    }

    pub fn start_date_picker() -> Locator {
        Locator::label("날짜를 선택하세요").within(Self::start_date_group())
    }

    pub fn start_date_input() -> Locator {
        Locator::role(AriaRole::Textbox).within(Self::start_date_group()).first()
    }

    /// Profile photo input
    pub fn photo() -> Locator {
        Locator::label("Avatar image").nth(0)
    }

    /// Access-control face image input
    pub fn access_image() -> Locator {
        Locator::label("Avatar image").nth(1)
    }
}

/// List cell holding an employee number or name
pub fn cell(text: &str) -> Locator {
    Locator::named(AriaRole::Cell, text)
}

/// Name column of the first list row
fn top_row_cell() -> Locator {
    Locator::css("tbody tr td:nth-child(3)").first()
}

/// Filter panel above the employee list
pub struct ListFilter;

impl ListFilter {
    pub fn toggle() -> Locator {
        Locator::button("필터")
    }

    pub fn name() -> Locator {
        Locator::textbox("이름")
    }

    pub fn search() -> Locator {
        Locator::button("검색")
    }
}

fn row_checkbox(employee_no: &str) -> Locator {
    Locator::role(AriaRole::Checkbox)
        .within(Locator::role(AriaRole::Row).has_text(employee_no))
        .first()
}

/// What gets typed into the add form
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub employee_no: String,
    pub name: String,
    pub record: EmployeeRecord,
    pub photo: Option<PathBuf>,
}

impl NewEmployee {
    /// Employee number from the image stem, or a timestamp when there is no
    /// image. The record's name wins over a generated one.
    pub fn new(record: EmployeeRecord, asset: Option<&ImageAsset>) -> Self {
        let employee_no = match asset {
            Some(asset) => asset.stem.clone(),
            None => Local::now().format("9%m%d%H%M%S%3f").to_string(),
        };
        let name = record
            .name
            .clone()
            .unwrap_or_else(|| unique_name(&employee_no));
        Self {
            employee_no,
            name,
            photo: asset.map(|a| a.path.clone()),
            record,
        }
    }

    fn email(&self) -> String {
        format!("{}@{}", self.employee_no, EMAIL_DOMAIN)
    }
}

async fn pick_start_date(page: &Page, date: Option<NaiveDate>) -> E2eResult<()> {
    let today = Local::now().date_naive();
    match date {
        Some(date) if date != today => {
            page.fill(&EmployeeForm::start_date_input(), &date.format("%Y-%m-%d").to_string())
                .await
        }
        _ => {
            page.click(&EmployeeForm::start_date_picker()).await?;
            let today_button = Locator::button("오늘");
            if page.is_visible(&today_button).await? {
                page.click(&today_button).await
            } else {
                let day = today.format("%-d").to_string();
                page.click(&Locator::named(AriaRole::Gridcell, day)).await
            }
        }
    }
}

async fn pick_rf_cards(page: &Page, cards: &[String]) -> E2eResult<()> {
    if cards.is_empty() {
        return Ok(());
    }
    page.click(&EmployeeForm::rf_cards()).await?;
    for card in cards {
        let option = Locator::role(AriaRole::Option).has_text(card.as_str()).first();
        if page.count(&option).await? == 0 {
            return Err(E2eError::AssertionFailed(format!("RF card '{}' not offered", card)));
        }
        page.click(&option).await?;
    }
    page.press_key("Escape").await
}

/// Fill and save the add form, then require the new employee number in the list.
pub async fn add<R: Rng + ?Sized>(page: &Page, employee: &NewEmployee, rng: &mut R) -> E2eResult<Lifecycle> {
    let mut lifecycle = Lifecycle::new(employee.employee_no.as_str());
    lifecycle.advance(EntityState::Creating)?;
    info!("Adding employee {} ({})", employee.employee_no, employee.name);

    page.click(&EmployeeForm::add_button()).await?;
    page.wait_for_url_containing(ADD_PATH, page.timeouts().navigation())
        .await?;

    if let Some(photo) = &employee.photo {
        page.set_input_files(&EmployeeForm::photo(), std::slice::from_ref(photo))
            .await?;
    }

    page.fill(&EmployeeForm::employee_no(), &employee.employee_no).await?;
    page.fill(&EmployeeForm::name(), &employee.name).await?;
    page.fill(&EmployeeForm::email(), &employee.email()).await?;

    let record = &employee.record;
    let department = choose_option(page, &EmployeeForm::department(), record.department.as_deref(), rng).await?;
    let grade = choose_option(page, &EmployeeForm::job_grade(), record.job_grade.as_deref(), rng).await?;
    let position = choose_option(page, &EmployeeForm::job_position(), record.job_position.as_deref(), rng).await?;
    debug!("{}: {} / {} / {}", employee.employee_no, department, grade, position);

    pick_start_date(page, record.assignment_start_date).await?;
    choose_many(
        page,
        &EmployeeForm::access_cases(),
        &record.access_cases,
        MAX_RANDOM_ACCESS_CASES,
        rng,
    )
    .await?;
    pick_rf_cards(page, &record.rf_card).await?;

    if let Some(note) = &record.note {
        page.fill(&EmployeeForm::note(), note).await?;
    }
    if let Some(photo) = &employee.photo {
        page.set_input_files(&EmployeeForm::access_image(), std::slice::from_ref(photo))
            .await?;
    }

    save(page).await?;
    page.expect_visible(&cell(&employee.employee_no)).await?;
    lifecycle.advance(EntityState::Created)?;
    Ok(lifecycle)
}

/// Rename an existing employee from `current_name` to `new_name`; the list
/// must show the new name and no longer show the old one.
pub async fn rename(page: &Page, lifecycle: &mut Lifecycle, current_name: &str, new_name: &str) -> E2eResult<()> {
    lifecycle.advance(EntityState::Editing)?;
    let employee_no = lifecycle.entity().to_string();
    info!("Renaming employee {} from {} to {}", employee_no, current_name, new_name);

    page.click(&cell(&employee_no)).await?;
    page.click(&edit_button()).await?;
    page.fill(&EmployeeForm::name(), new_name).await?;
    save(page).await?;

    page.expect_visible(&cell(new_name)).await?;
    page.expect_hidden(&cell(current_name)).await?;
    lifecycle.advance(EntityState::Edited)
}

/// Narrow the list to employees named `name`
pub async fn search(page: &Page, name: &str) -> E2eResult<()> {
    info!("Searching employees for {}", name);
    if page.is_visible(&ListFilter::toggle()).await? {
        page.click(&ListFilter::toggle()).await?;
    }
    page.expect_visible(&ListFilter::name()).await?;
    page.fill(&ListFilter::name(), name).await?;
    page.click(&ListFilter::search()).await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await
}

/// Which row an entry of the removal fixture deletes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemovalTarget {
    /// First row whose cell shows this name
    Named(String),
    /// Whatever employee is listed first
    TopRow,
}

impl RemovalTarget {
    pub fn of(record: &EmployeeRecord) -> Self {
        match record.name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => RemovalTarget::Named(name.to_string()),
            _ => RemovalTarget::TopRow,
        }
    }
}

/// Delete the employee `target` points at. Returns what was removed, or
/// `None` when no such row is listed.
pub async fn remove(page: &Page, target: &RemovalTarget) -> E2eResult<Option<String>> {
    let (row, label) = match target {
        RemovalTarget::Named(name) => (cell(name).first(), name.clone()),
        RemovalTarget::TopRow => (top_row_cell(), String::new()),
    };

    match page.wait_visible(&row, page.timeouts().assertion()).await {
        Ok(()) => {}
        Err(E2eError::Timeout(_)) => {
            warn!("No employee row for {:?}", target);
            return Ok(None);
        }
        Err(e) => return Err(e),
    }

    let label = match target {
        RemovalTarget::Named(_) => label,
        RemovalTarget::TopRow => page
            .inner_texts(&row)
            .await?
            .into_iter()
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
    };
    let listed_before = page.count(&cell(&label)).await?;
    info!("Removing employee {} ({} listed)", label, listed_before);

    page.click(&row).await?;
    delete_and_confirm(page).await?;

    let listed_after = page.count(&cell(&label)).await?;
    if listed_after >= listed_before {
        return Err(E2eError::AssertionFailed(format!(
            "employee {} still listed {} time(s) after delete",
            label, listed_after
        )));
    }
    Ok(Some(label))
}

/// Select the employee's row and delete it
pub async fn delete(page: &Page, lifecycle: &mut Lifecycle) -> E2eResult<()> {
    lifecycle.advance(EntityState::Deleting)?;
    let employee_no = lifecycle.entity().to_string();
    info!("Deleting employee {}", employee_no);

    page.expect_visible(&cell(&employee_no)).await?;
    page.click(&cell(&employee_no)).await?;
    delete_and_confirm(page).await?;

    page.expect_hidden(&cell(&employee_no)).await?;
    lifecycle.advance(EntityState::Absent)
}

/// Tick every row and delete them in one go. The console confirms once per
/// employee, so a persistent handler stays registered for the whole batch.
pub async fn bulk_delete(page: &Page, lifecycles: &mut [Lifecycle]) -> E2eResult<()> {
    if lifecycles.is_empty() {
        return Ok(());
    }
    for lifecycle in lifecycles.iter_mut() {
        lifecycle.advance(EntityState::Deleting)?;
    }
    info!("Bulk deleting {} employee(s)", lifecycles.len());

    let confirmations = page.on_dialog(DialogMatcher::Any, Resolution::accept(), Lifetime::Persistent);

    for lifecycle in lifecycles.iter() {
        page.set_checked(&row_checkbox(lifecycle.entity()), true).await?;
    }
    delete_and_confirm(page).await?;
    page.wait_for_load_state(LoadState::NetworkIdle).await?;

    for lifecycle in lifecycles.iter_mut() {
        page.expect_hidden(&cell(lifecycle.entity())).await?;
        lifecycle.advance(EntityState::Absent)?;
    }
    confirmations.unsubscribe();
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn employee_no_comes_from_the_image_stem() {
        let asset = ImageAsset {
            path: Path::new("/fixtures/images/1000508.jpg").to_path_buf(),
            stem: "1000508".to_string(),
        };
        let employee = NewEmployee::new(EmployeeRecord::default(), Some(&asset));
        assert_eq!(employee.employee_no, "1000508");
        assert!(employee.name.starts_with("1000508_"));
        assert_eq!(employee.email(), "1000508@acs.test");
        assert_eq!(employee.photo.as_deref(), Some(asset.path.as_path()));
    }

    #[test]
    fn removal_target_follows_the_record_name() {
        let named = EmployeeRecord {
            name: Some(" 홍길동 ".to_string()),
            ..Default::default()
        };
        assert_eq!(RemovalTarget::of(&named), RemovalTarget::Named("홍길동".to_string()));

        let blank = EmployeeRecord {
            name: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(RemovalTarget::of(&blank), RemovalTarget::TopRow);
        assert_eq!(RemovalTarget::of(&EmployeeRecord::default()), RemovalTarget::TopRow);
    }

    #[test]
    fn generated_numbers_carry_milliseconds() {
        let employee = NewEmployee::new(EmployeeRecord::default(), None);
        assert_eq!(employee.employee_no.len(), "9MMDDhhmmssfff".len());
        assert!(employee.employee_no.starts_with('9'));
    }

    #[test]
    fn record_name_is_kept() {
        let record = EmployeeRecord {
            name: Some("홍길동".to_string()),
            ..Default::default()
        };
        let employee = NewEmployee::new(record, None);
        assert_eq!(employee.name, "홍길동");
        assert!(employee.photo.is_none());
        assert!(employee.employee_no.chars().all(|c| c.is_ascii_digit()));
    }
}
