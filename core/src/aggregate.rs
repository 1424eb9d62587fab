//! Derived per-major and per-program views
//!
//! Everything here is recomputed from scratch each run and written onto the
//! records as derived fields; nothing is persisted. The aggregator assumes
//! the dataset has already been filtered, but degrades quietly (skips, not
//! errors) if it has not.

use std::collections::HashMap;

use log::debug;

use crate::models::{Dataset, RowId};
use crate::terms::TermBuckets;

/// Compute all derived views: per-applicant final destinations, per-major
/// statistics, per-program term buckets.
pub fn annotate(dataset: &mut Dataset, buckets: &TermBuckets) {
    resolve_destinations(dataset);
    annotate_majors(dataset, buckets);
    annotate_programs(dataset, buckets);
}

/// Resolve each applicant's final destination: the authoritative program of
/// the datapoint carrying the destination marker. The marker is expected on
/// at most one datapoint; if several carry it, the one with the largest row
/// id wins and the duplication is left for the data-quality report.
pub fn resolve_destinations(dataset: &mut Dataset) {
    let datapoints = &dataset.datapoints;
    for applicant in dataset.applicants.values_mut() {
        applicant.destination = None;
        for dp_id in &applicant.datapoints {
            let Some(datapoint) = datapoints.get(dp_id) else {
                continue;
            };
            if datapoint.is_destination {
                if let Some(program) = datapoint.program() {
                    applicant.destination = Some(program.clone());
                }
            }
        }
    }
}

fn annotate_majors(dataset: &mut Dataset, buckets: &TermBuckets) {
    let major_ids: Vec<RowId> = dataset.majors.keys().cloned().collect();
    for major_id in major_ids {
        // Term buckets restricted to applicants whose authoritative major
        // is this one. Terms with no such applicant keep an empty slot so
        // the sequence stays aligned across pages.
        let applicants_by_term = restrict_buckets(buckets, |applicant_id| {
            dataset
                .applicants
                .get(applicant_id)
                .map_or(false, |a| a.majors.first() == Some(&major_id))
        });

        // Program frequencies, counted per datapoint: the same program
        // applied to twice by one applicant counts twice.
        let mut first_seen: Vec<RowId> = Vec::new();
        let mut counts: HashMap<RowId, usize> = HashMap::new();
        let mut total = 0usize;
        let mut gpas: Vec<f64> = Vec::new();

        let member_ids = dataset
            .majors
            .get(&major_id)
            .map(|m| m.applicants.clone())
            .unwrap_or_default();
        for applicant_id in &member_ids {
            let Some(applicant) = dataset.applicants.get(applicant_id) else {
                continue;
            };
            if let Some(gpa) = applicant.gpa {
                gpas.push(gpa);
            }
            for dp_id in &applicant.datapoints {
                let Some(program) = dataset.datapoints.get(dp_id).and_then(|d| d.program()) else {
                    continue;
                };
                if !counts.contains_key(program) {
                    first_seen.push(program.clone());
                }
                *counts.entry(program.clone()).or_insert(0) += 1;
                total += 1;
            }
        }

        let mut histogram: Vec<(RowId, usize)> = first_seen
            .into_iter()
            .map(|program| {
                let count = counts.get(&program).copied().unwrap_or(0);
                (program, count)
            })
            .collect();
        // Stable sort: equal frequencies keep first-encountered order.
        histogram.sort_by(|a, b| b.1.cmp(&a.1));

        let gpa_median = median(&gpas).map(round2);

        if let Some(major) = dataset.majors.get_mut(&major_id) {
            major.applicants_by_term = applicants_by_term;
            major.program_histogram = histogram;
            major.datapoint_count = total;
            major.gpa_median = gpa_median;
        }
    }
    debug!("annotated {} majors", dataset.majors.len());
}

fn annotate_programs(dataset: &mut Dataset, buckets: &TermBuckets) {
    // Membership test walks each applicant's datapoints; quadratic in the
    // worst case but the snapshot is small. Pre-index by program if that
    // ever changes.
    let program_ids: Vec<RowId> = dataset.programs.keys().cloned().collect();
    for program_id in program_ids {
        let applicants_by_term = restrict_buckets(buckets, |applicant_id| {
            dataset.applicants.get(applicant_id).map_or(false, |a| {
                a.datapoints.iter().any(|dp_id| {
                    dataset
                        .datapoints
                        .get(dp_id)
                        .map_or(false, |d| d.program() == Some(&program_id))
                })
            })
        });
        if let Some(program) = dataset.programs.get_mut(&program_id) {
            program.applicants_by_term = applicants_by_term;
        }
    }
    debug!("annotated {} programs", dataset.programs.len());
}

fn restrict_buckets<F>(buckets: &TermBuckets, mut keep: F) -> TermBuckets
where
    F: FnMut(&RowId) -> bool,
{
    buckets
        .iter()
        .map(|(stamp, members)| {
            let members = members.iter().filter(|id| keep(*id)).cloned().collect();
            (*stamp, members)
        })
        .collect()
}

/// Standard statistical median; `None` for an empty slice.
pub fn median(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::rebuild_backrefs;
    use crate::terms::{term_buckets, Term, TermStamp};
    use crate::models::{Applicant, Datapoint, Major, Program};
    use serde_json::json;

    fn fixture() -> Dataset {
        let mut ds = Dataset::default();
        ds.applicants.insert(
            "a1".into(),
            Applicant::from_row("a1", &json!({"ID": "A-1", "Major": ["m1"], "GPA": 3.5})),
        );
        ds.applicants.insert(
            "a2".into(),
            Applicant::from_row("a2", &json!({"ID": "A-2", "Major": ["m1"], "GPA": 3.7})),
        );
        ds.applicants.insert(
            "a3".into(),
            Applicant::from_row("a3", &json!({"ID": "A-3", "Major": ["m2"]})),
        );
        ds.majors.insert(
            "m1".into(),
            Major::from_row(
                "m1",
                &json!({"ID": "M-1", "Department": "D", "Major": "One", "Applicants": ["a1", "a2"]}),
            ),
        );
        ds.majors.insert(
            "m2".into(),
            Major::from_row(
                "m2",
                &json!({"ID": "M-2", "Department": "D", "Major": "Two", "Applicants": ["a3"]}),
            ),
        );
        for id in ["p1", "p2"] {
            ds.programs.insert(
                id.into(),
                Program::from_row(id, &json!({"ID": id, "School": "S", "Program": id})),
            );
        }
        let dp = |id: &str, applicant: &str, program: &str, dest: bool| {
            Datapoint::from_row(
                id,
                &json!({
                    "Applicants": [applicant],
                    "Program": [program],
                    "Year": 2024,
                    "Term": "Fall",
                    "Final destination": dest,
                }),
            )
        };
        // a1 applies to p2 once and p1 twice; second p1 application is the
        // final destination. a2 applies to p2. a3 applies to p1.
        ds.datapoints.insert("d1".into(), dp("d1", "a1", "p2", false));
        ds.datapoints.insert("d2".into(), dp("d2", "a1", "p1", false));
        ds.datapoints.insert("d3".into(), dp("d3", "a1", "p1", true));
        ds.datapoints.insert("d4".into(), dp("d4", "a2", "p2", false));
        ds.datapoints.insert("d5".into(), dp("d5", "a3", "p1", false));
        rebuild_backrefs(&mut ds);
        ds
    }

    #[test]
    fn test_median() {
        // Even count averages the two middle values.
        let even = median(&[3.5, 3.7, 3.9, 4.0]).unwrap();
        assert!((even - 3.8).abs() < 1e-9);
        // Odd count takes the middle of the sorted values.
        assert_eq!(median(&[4.0, 3.5, 3.7]), Some(3.7));
        assert_eq!(median(&[]), None);
    }

    #[test]
    fn test_major_histogram_counts_per_datapoint() {
        let mut ds = fixture();
        let buckets = term_buckets(&ds);
        annotate(&mut ds, &buckets);

        // m1: a1 contributes p2, p1, p1; a2 contributes p2. Both end at 2,
        // and p2 was seen first, so the stable sort keeps it first.
        let m1 = &ds.majors["m1"];
        assert_eq!(
            m1.program_histogram,
            vec![("p2".to_string(), 2), ("p1".to_string(), 2)]
        );
        assert_eq!(m1.datapoint_count, 4);
    }

    #[test]
    fn test_major_gpa_median() {
        let mut ds = fixture();
        let buckets = term_buckets(&ds);
        annotate(&mut ds, &buckets);

        assert_eq!(ds.majors["m1"].gpa_median, Some(3.6));
        // m2's only applicant has no GPA: absent, not zero.
        assert_eq!(ds.majors["m2"].gpa_median, None);
    }

    #[test]
    fn test_major_term_restriction() {
        let mut ds = fixture();
        let buckets = term_buckets(&ds);
        annotate(&mut ds, &buckets);

        let stamp = TermStamp::new(2024, Term::Fall);
        assert_eq!(
            ds.majors["m1"].applicants_by_term,
            vec![(stamp, vec!["a1".to_string(), "a2".to_string()])]
        );
        assert_eq!(
            ds.majors["m2"].applicants_by_term,
            vec![(stamp, vec!["a3".to_string()])]
        );
    }

    #[test]
    fn test_program_term_restriction() {
        let mut ds = fixture();
        let buckets = term_buckets(&ds);
        annotate(&mut ds, &buckets);

        let stamp = TermStamp::new(2024, Term::Fall);
        // p1 was applied to by a1 and a3; p2 by a1 and a2.
        assert_eq!(
            ds.programs["p1"].applicants_by_term,
            vec![(stamp, vec!["a1".to_string(), "a3".to_string()])]
        );
        assert_eq!(
            ds.programs["p2"].applicants_by_term,
            vec![(stamp, vec!["a1".to_string(), "a2".to_string()])]
        );
    }

    #[test]
    fn test_destination_resolution() {
        let mut ds = fixture();
        let buckets = term_buckets(&ds);
        annotate(&mut ds, &buckets);

        assert_eq!(ds.applicants["a1"].destination.as_deref(), Some("p1"));
        assert_eq!(ds.applicants["a2"].destination, None);
    }
}
