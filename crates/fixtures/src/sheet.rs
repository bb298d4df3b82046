//! Spreadsheet fixtures (`.xlsx`)
//!
//! Row 1 holds a fixed header, data starts at row 2. Reading stops at the
//! first row whose primary key column is blank, which is how the sheets
//! mark end-of-data (trailing formatting rows are common in hand-edited
//! workbooks).

use std::path::Path;

use calamine::{open_workbook_auto, Data, DataType, Range, Reader};
use rust_xlsxwriter::Workbook;
use tracing::{debug, info};

use crate::error::{FixtureError, FixtureResult};
use crate::json::non_empty;
use crate::record::{parse_date, split_multi, EmployeeRecord, LocationRecord};

/// Conventional sheet name for employee fixtures
pub const EMPLOYEE_SHEET: &str = "임직원_추가";

/// Conventional sheet name for location fixtures
pub const LOCATION_SHEET: &str = "위치_추가";

pub const EMPLOYEE_HEADER: [&str; 8] = [
    "index",
    "department",
    "job_grade",
    "job_position",
    "assignment_start_date",
    "access_cases",
    "rf_card",
    "note",
];

pub const LOCATION_HEADER: [&str; 4] = ["name", "type", "order", "parent"];

/// Read employee rows from `sheet` (defaults to [`EMPLOYEE_SHEET`]).
pub fn load_employees(path: &Path, sheet: Option<&str>) -> FixtureResult<Vec<EmployeeRecord>> {
    let sheet = sheet.unwrap_or(EMPLOYEE_SHEET);
    let range = open_sheet(path, sheet)?;
    check_header(&range, &EMPLOYEE_HEADER)?;

    let mut records = Vec::new();
    for (offset, row) in range.rows().enumerate().skip(1) {
        let row_number = offset + 1;
        let index = cell_text(row.first());
        if index.is_empty() {
            debug!("Row {} has no index, stopping", row_number);
            break;
        }

        let index: u32 = index.parse().map_err(|_| FixtureError::InvalidRow {
            row: row_number,
            reason: format!("index '{}' is not a number", index),
        })?;

        records.push(EmployeeRecord {
            index: Some(index),
            name: None,
            department: optional(cell_text(row.get(1))),
            job_grade: optional(cell_text(row.get(2))),
            job_position: optional(cell_text(row.get(3))),
            assignment_start_date: cell_date(row.get(4), row_number)?,
            access_cases: split_multi(&cell_text(row.get(5))),
            rf_card: split_multi(&cell_text(row.get(6))),
            note: optional(cell_text(row.get(7))),
        });
    }

    info!("Loaded {} employee row(s) from {}:{}", records.len(), path.display(), sheet);
    non_empty(path, records)
}

/// Read location rows from `sheet` (defaults to [`LOCATION_SHEET`]).
pub fn load_locations(path: &Path, sheet: Option<&str>) -> FixtureResult<Vec<LocationRecord>> {
    let sheet = sheet.unwrap_or(LOCATION_SHEET);
    let range = open_sheet(path, sheet)?;
    check_header(&range, &LOCATION_HEADER)?;

    let mut records = Vec::new();
    for (offset, row) in range.rows().enumerate().skip(1) {
        let row_number = offset + 1;
        let name = cell_text(row.first());
        if name.is_empty() {
            break;
        }

        let order = optional(cell_text(row.get(2)))
            .map(|raw| {
                raw.parse::<u32>().map_err(|_| FixtureError::InvalidRow {
                    row: row_number,
                    reason: format!("order '{}' is not a number", raw),
                })
            })
            .transpose()?;

        records.push(LocationRecord {
            name,
            kind: optional(cell_text(row.get(1))),
            order,
            parent: optional(cell_text(row.get(3))),
        });
    }

    info!("Loaded {} location row(s) from {}:{}", records.len(), path.display(), sheet);
    non_empty(path, records)
}

fn open_sheet(path: &Path, sheet: &str) -> FixtureResult<Range<Data>> {
    if !path.exists() {
        return Err(FixtureError::NotFound(path.to_path_buf()));
    }

    let mut workbook = open_workbook_auto(path)?;
    if !workbook.sheet_names().iter().any(|name| name == sheet) {
        return Err(FixtureError::SheetNotFound(sheet.to_string()));
    }

    Ok(workbook.worksheet_range(sheet)?)
}

fn check_header(range: &Range<Data>, expected: &[&str]) -> FixtureResult<()> {
    let header = range.rows().next().unwrap_or(&[]);
    for (column, name) in expected.iter().enumerate() {
        let found = cell_text(header.get(column));
        if !found.eq_ignore_ascii_case(name) {
            return Err(FixtureError::Header {
                column: column + 1,
                expected: name.to_string(),
                found,
            });
        }
    }
    Ok(())
}

fn cell_text(cell: Option<&Data>) -> String {
    match cell {
        None | Some(Data::Empty) => String::new(),
        Some(Data::String(s)) => s.trim().to_string(),
        Some(Data::Float(f)) if f.fract() == 0.0 => format!("{}", *f as i64),
        Some(Data::Int(i)) => i.to_string(),
        Some(other) => other.to_string().trim().to_string(),
    }
}

fn cell_date(cell: Option<&Data>, row: usize) -> FixtureResult<Option<chrono::NaiveDate>> {
    match cell {
        Some(c @ (Data::DateTime(_) | Data::DateTimeIso(_))) => Ok(c.as_date()),
        _ => {
            let text = cell_text(cell);
            if text.is_empty() {
                return Ok(None);
            }
            parse_date(&text).map(Some).ok_or_else(|| FixtureError::InvalidRow {
                row,
                reason: format!("assignment_start_date '{}' is not a date", text),
            })
        }
    }
}

fn optional(text: String) -> Option<String> {
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

/// Write employee records to a workbook with the fixed header.
///
/// Rows without an index get their 1-based position.
pub fn write_employees(path: &Path, sheet: &str, employees: &[EmployeeRecord]) -> FixtureResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (column, name) in EMPLOYEE_HEADER.iter().enumerate() {
        worksheet.write_string(0, column as u16, *name)?;
    }

    for (i, employee) in employees.iter().enumerate() {
        let row = (i + 1) as u32;
        let index = employee.index.unwrap_or((i + 1) as u32);
        worksheet.write_number(row, 0, index as f64)?;
        worksheet.write_string(row, 1, employee.department.clone().unwrap_or_default())?;
        worksheet.write_string(row, 2, employee.job_grade.clone().unwrap_or_default())?;
        worksheet.write_string(row, 3, employee.job_position.clone().unwrap_or_default())?;
        worksheet.write_string(
            row,
            4,
            employee
                .assignment_start_date
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        )?;
        worksheet.write_string(row, 5, employee.access_cases.join(", "))?;
        worksheet.write_string(row, 6, employee.rf_card.join(", "))?;
        worksheet.write_string(row, 7, employee.note.clone().unwrap_or_default())?;
    }

    workbook.save(path)?;
    Ok(())
}

/// Write location records to a workbook with the fixed header.
pub fn write_locations(path: &Path, sheet: &str, locations: &[LocationRecord]) -> FixtureResult<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sheet)?;

    for (column, name) in LOCATION_HEADER.iter().enumerate() {
        worksheet.write_string(0, column as u16, *name)?;
    }

    for (i, location) in locations.iter().enumerate() {
        let row = (i + 1) as u32;
        worksheet.write_string(row, 0, location.name.as_str())?;
        worksheet.write_string(row, 1, location.kind.clone().unwrap_or_default())?;
        if let Some(order) = location.order {
            worksheet.write_number(row, 2, order as f64)?;
        }
        worksheet.write_string(row, 3, location.parent.clone().unwrap_or_default())?;
    }

    workbook.save(path)?;
    Ok(())
}
