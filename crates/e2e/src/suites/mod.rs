//! Registered test cases, grouped by screen

pub mod auth;
pub mod employee;
pub mod location;

use crate::runner::TestCase;

/// Employee fixtures driving the data-driven add and remove tests
pub const EMPLOYEE_JSON: &str = "em_add.json";
pub const EMPLOYEE_SHEET: &str = "em_add.xlsx";
pub const EMPLOYEE_REMOVE_JSON: &str = "em_remove.json";
pub const LOCATION_JSON: &str = "locations.json";

/// Every case, in the order they are reported
pub fn all() -> Vec<TestCase> {
    let mut cases = auth::cases();
    cases.extend(employee::cases());
    cases.extend(location::cases());
    cases
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn case_names_are_unique() {
        let cases = all();
        let names: HashSet<_> = cases.iter().map(|c| c.name).collect();
        assert_eq!(names.len(), cases.len());
    }

    #[test]
    fn every_case_is_tagged_with_its_screen() {
        for case in all() {
            assert!(
                ["auth", "employee", "location"].iter().any(|t| case.has_tag(t)),
                "{} has no screen tag",
                case.name
            );
        }
    }
}
