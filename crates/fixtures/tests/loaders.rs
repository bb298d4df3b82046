//! Fixture loader tests
//!
//! Writes real JSON and xlsx files into a temp dir and reads them back
//! through the public loaders.

use std::fs;
use std::path::Path;

use chrono::NaiveDate;
use rand::rngs::StdRng;
use rand::SeedableRng;
use rust_xlsxwriter::Workbook;
use tempfile::TempDir;
use test_case::test_case;

use acs_fixtures::sheet::{EMPLOYEE_HEADER, EMPLOYEE_SHEET};
use acs_fixtures::{generate, json, sheet, FixtureError, ImageAssets};

fn write_sheet(path: &Path, name: &str, rows: &[&[&str]]) {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(name).unwrap();
    for (r, row) in rows.iter().enumerate() {
        for (c, value) in row.iter().enumerate() {
            if !value.is_empty() {
                worksheet.write_string(r as u32, c as u16, *value).unwrap();
            }
        }
    }
    workbook.save(path).unwrap();
}

#[test]
fn json_employees_load_in_file_order() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("em_add.json");
    fs::write(
        &path,
        r#"{
  "employees": [
    { "name": "a", "department": "보안운영팀", "job_grade": "대리", "job_position": "팀원",
      "assignment_start_date": "2024-02-01", "access_cases": ["정문", " 후문 "], "rf_card": ["0001"] },
    { "name": "b", "access_cases": [], "rf_card": [] }
  ]
}"#,
    )
    .unwrap();

    let records = acs_fixtures::load_employees(&path, None).unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].name.as_deref(), Some("a"));
    assert_eq!(records[0].access_cases, vec!["정문", "후문"]);
    assert_eq!(records[0].assignment_start_date, NaiveDate::from_ymd_opt(2024, 2, 1));
    assert_eq!(records[1].name.as_deref(), Some("b"));
    assert!(records[1].department.is_none());
}

#[test]
fn missing_file_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let err = acs_fixtures::load_employees(&dir.path().join("absent.json"), None).unwrap_err();
    assert!(matches!(err, FixtureError::NotFound(_)));
    assert!(err.is_unavailable());
}

#[test_case(r#"{ "employees": [] }"# ; "empty array")]
#[test_case(r#"{ }"# ; "missing key")]
fn empty_json_is_unavailable(content: &str) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("em_add.json");
    fs::write(&path, content).unwrap();

    let err = json::load_employees(&path).unwrap_err();
    assert!(matches!(err, FixtureError::Empty(_)));
    assert!(err.is_unavailable());
}

#[test]
fn malformed_json_is_a_hard_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("em_add.json");
    fs::write(&path, "{ \"employees\": [ {").unwrap();

    let err = json::load_employees(&path).unwrap_err();
    assert!(matches!(err, FixtureError::Json(_)));
    assert!(!err.is_unavailable());
}

#[test]
fn sheet_stops_at_first_blank_index() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("em_add.xlsx");
    write_sheet(
        &path,
        EMPLOYEE_SHEET,
        &[
            &EMPLOYEE_HEADER,
            &["1", "보안운영팀", "대리", "팀원", "2024-01-02", "정문, 후문,", "0001,0002", "first"],
            &["2", "영업팀", "", "", "2024.05.06", "", "", ""],
            &["", "ignored", "", "", "", "", "", "trailing formatting row"],
            &["4", "after-sentinel", "", "", "", "", "", ""],
        ],
    );

    let records = sheet::load_employees(&path, None).unwrap();
    assert_eq!(records.len(), 2);

    assert_eq!(records[0].index, Some(1));
    assert_eq!(records[0].access_cases, vec!["정문", "후문"]);
    assert_eq!(records[0].rf_card, vec!["0001", "0002"]);
    assert_eq!(records[0].note.as_deref(), Some("first"));

    assert_eq!(records[1].index, Some(2));
    assert_eq!(records[1].job_grade, None);
    assert_eq!(records[1].assignment_start_date, NaiveDate::from_ymd_opt(2024, 5, 6));
    assert!(records[1].access_cases.is_empty());
}

#[test]
fn sheet_with_only_header_is_unavailable() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("em_add.xlsx");
    write_sheet(&path, EMPLOYEE_SHEET, &[&EMPLOYEE_HEADER]);

    let err = sheet::load_employees(&path, None).unwrap_err();
    assert!(err.is_unavailable());
}

#[test]
fn sheet_header_is_validated() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("em_add.xlsx");
    write_sheet(
        &path,
        EMPLOYEE_SHEET,
        &[&["index", "dept"], &["1", "보안운영팀"]],
    );

    let err = sheet::load_employees(&path, None).unwrap_err();
    match err {
        FixtureError::Header { column, expected, .. } => {
            assert_eq!(column, 2);
            assert_eq!(expected, "department");
        }
        other => panic!("expected header error, got {other}"),
    }
}

#[test]
fn wrong_sheet_name_is_reported() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("em_add.xlsx");
    write_sheet(&path, "Sheet1", &[&EMPLOYEE_HEADER]);

    let err = sheet::load_employees(&path, None).unwrap_err();
    assert!(matches!(err, FixtureError::SheetNotFound(ref name) if name == EMPLOYEE_SHEET));
}

#[test]
fn generated_sheets_load_back() {
    let dir = TempDir::new().unwrap();
    let mut rng = StdRng::seed_from_u64(42);

    let employees = generate::employees(&mut rng, 4);
    let em_path = dir.path().join("employees.xlsx");
    sheet::write_employees(&em_path, EMPLOYEE_SHEET, &employees).unwrap();
    let loaded = acs_fixtures::load_employees(&em_path, None).unwrap();
    assert_eq!(loaded.len(), 4);
    assert_eq!(loaded[2].department, employees[2].department);
    assert_eq!(loaded[2].access_cases, employees[2].access_cases);
    assert_eq!(loaded[2].assignment_start_date, employees[2].assignment_start_date);

    let locations = generate::locations(&mut rng, 3);
    let loc_path = dir.path().join("locations.json");
    json::write_locations(&loc_path, &locations).unwrap();
    assert_eq!(acs_fixtures::load_locations(&loc_path, None).unwrap(), locations);
}

#[test]
fn assets_pair_in_name_order() {
    let dir = TempDir::new().unwrap();
    for name in ["c.png", "a.jpg", "b.jpeg", "notes.txt"] {
        fs::write(dir.path().join(name), b"not really an image").unwrap();
    }

    let assets = ImageAssets::scan(dir.path()).unwrap();
    let stems: Vec<&str> = assets.iter().map(|a| a.stem.as_str()).collect();
    assert_eq!(stems, vec!["a", "b", "c"]);

    let paired = assets.pair_with(vec![10, 20]).unwrap();
    assert_eq!(paired[0].0, 10);
    assert_eq!(paired[0].1.stem, "a");
    assert_eq!(paired[1].1.stem, "b");
}

#[test]
fn too_few_assets_is_unavailable() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("only.png"), b"x").unwrap();

    let assets = ImageAssets::scan(dir.path()).unwrap();
    let err = assets.pair_with(vec![1, 2, 3]).unwrap_err();
    assert!(matches!(err, FixtureError::InsufficientAssets { needed: 3, found: 1, .. }));
    assert!(err.is_unavailable());

    let missing = ImageAssets::scan(&dir.path().join("nope")).unwrap();
    assert!(missing.is_empty());
}
