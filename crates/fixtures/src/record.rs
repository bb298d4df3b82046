//! Normalized fixture records

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Date layouts accepted in fixture text cells
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y.%m.%d", "%Y/%m/%d"];

/// One employee to create through the employee management screen
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmployeeRecord {
    /// Position in the source file (spreadsheet primary key)
    #[serde(default)]
    pub index: Option<u32>,

    /// Display name; scenarios substitute an image stem or a unique name when absent
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub department: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub job_grade: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub job_position: Option<String>,

    #[serde(default, deserialize_with = "date_or_blank")]
    pub assignment_start_date: Option<NaiveDate>,

    #[serde(default, deserialize_with = "multi_value")]
    pub access_cases: Vec<String>,

    #[serde(default, deserialize_with = "multi_value")]
    pub rf_card: Vec<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    pub note: Option<String>,
}

/// One node of the location tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRecord {
    pub name: String,

    /// Location type label as shown in the type dropdown
    #[serde(rename = "type", default, deserialize_with = "blank_as_none")]
    pub kind: Option<String>,

    /// Display order among siblings
    #[serde(default)]
    pub order: Option<u32>,

    /// Name of the parent tree item; `None` creates a root node
    #[serde(default, deserialize_with = "blank_as_none")]
    pub parent: Option<String>,
}

/// Split a comma-delimited cell into trimmed, non-empty segments.
pub fn split_multi(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Normalize a list of values the same way a delimited cell is normalized,
/// so `["A, B", " C "]` and `"A,B,C"` produce the same result.
pub fn normalize_multi<I, S>(values: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|v| split_multi(v.as_ref()))
        .collect()
}

/// Parse a text date in any of the accepted layouts.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(raw, fmt).ok())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MultiValue {
    List(Vec<String>),
    Joined(String),
}

fn multi_value<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<MultiValue>::deserialize(deserializer)?;
    Ok(match value {
        Some(MultiValue::List(items)) => normalize_multi(items),
        Some(MultiValue::Joined(joined)) => split_multi(&joined),
        None => Vec::new(),
    })
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

fn date_or_blank<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date(raw)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date '{}'", raw))),
    }
}
