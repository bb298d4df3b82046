//! Random fixture generation

use chrono::{Duration, NaiveDate};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::record::{EmployeeRecord, LocationRecord};

const DEPARTMENTS: &[&str] = &["경영지원팀", "보안운영팀", "시설관리팀", "연구개발팀", "영업팀"];
const JOB_GRADES: &[&str] = &["사원", "주임", "대리", "과장", "차장", "부장"];
const JOB_POSITIONS: &[&str] = &["팀원", "파트장", "팀장", "센터장"];
const ACCESS_CASES: &[&str] = &["정문", "후문", "서버실", "연구동", "주차장"];
const LOCATION_TYPES: &[&str] = &["건물", "층", "구역"];

/// Generate `count` employees with plausible, randomly chosen attributes.
pub fn employees<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<EmployeeRecord> {
    let epoch = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap_or_default();

    (0..count)
        .map(|i| {
            let access_count = rng.gen_range(1..=3);
            let access_cases = ACCESS_CASES
                .choose_multiple(rng, access_count)
                .map(|s| s.to_string())
                .collect();
            let rf_card = (0..rng.gen_range(0..=2))
                .map(|_| format!("{:010}", rng.gen_range(0..10_000_000_000u64)))
                .collect();

            EmployeeRecord {
                index: Some((i + 1) as u32),
                name: None,
                department: pick(rng, DEPARTMENTS),
                job_grade: pick(rng, JOB_GRADES),
                job_position: pick(rng, JOB_POSITIONS),
                assignment_start_date: Some(epoch + Duration::days(rng.gen_range(0..1500))),
                access_cases,
                rf_card,
                note: Some(format!("generated #{}", i + 1)),
            }
        })
        .collect()
}

/// Generate a small location tree: one building, then floors and zones
/// hanging off earlier nodes.
pub fn locations<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<LocationRecord> {
    let mut records: Vec<LocationRecord> = Vec::with_capacity(count);

    for i in 0..count {
        let parent = if records.is_empty() {
            None
        } else {
            records.choose(rng).map(|r| r.name.clone())
        };
        let kind = match &parent {
            None => LOCATION_TYPES[0],
            Some(_) => LOCATION_TYPES[rng.gen_range(1..LOCATION_TYPES.len())],
        };
        records.push(LocationRecord {
            name: format!("{}-{}", kind, i + 1),
            kind: Some(kind.to_string()),
            order: Some((i + 1) as u32),
            parent,
        });
    }

    records
}

fn pick<R: Rng + ?Sized>(rng: &mut R, pool: &[&str]) -> Option<String> {
    pool.choose(rng).map(|s| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn employees_are_indexed_and_complete() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = employees(&mut rng, 5);

        assert_eq!(records.len(), 5);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.index, Some((i + 1) as u32));
            assert!(record.department.is_some());
            assert!(!record.access_cases.is_empty());
            assert!(record.access_cases.iter().all(|c| !c.contains(',')));
        }
    }

    #[test]
    fn locations_reference_earlier_parents() {
        let mut rng = StdRng::seed_from_u64(11);
        let records = locations(&mut rng, 6);

        assert_eq!(records[0].parent, None);
        for (i, record) in records.iter().enumerate().skip(1) {
            let parent = record.parent.as_deref().unwrap();
            assert!(records[..i].iter().any(|r| r.name == parent));
        }
    }
}
