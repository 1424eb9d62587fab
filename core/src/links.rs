//! Back-reference rebuilding
//!
//! The store keeps applicant→datapoint and program→datapoint link columns,
//! but they are maintained by hand and drift out of sync with the forward
//! references on the datapoints themselves. The datapoint side is the
//! source of truth, so both back-reference lists are dropped and rederived
//! from a single scan.

use log::debug;

use crate::models::Dataset;

/// Rebuild every applicant's and program's datapoint list from the
/// datapoints' forward references.
///
/// Only the authoritative (first) applicant and program reference of each
/// datapoint contributes. A forward reference whose target row is missing
/// is skipped here; the integrity filter is the component that removes such
/// datapoints. Applicants and programs named by no datapoint are left with
/// an empty list, which the filter treats the same as a missing one.
pub fn rebuild_backrefs(dataset: &mut Dataset) {
    for applicant in dataset.applicants.values_mut() {
        applicant.datapoints.clear();
    }
    for program in dataset.programs.values_mut() {
        program.datapoints.clear();
    }

    // BTreeMap iteration makes the rebuilt lists sorted by datapoint id.
    let mut linked = 0usize;
    for (dp_id, datapoint) in &dataset.datapoints {
        if let Some(applicant) = datapoint
            .applicant()
            .and_then(|id| dataset.applicants.get_mut(id))
        {
            applicant.datapoints.push(dp_id.clone());
            linked += 1;
        }
        if let Some(program) = datapoint
            .program()
            .and_then(|id| dataset.programs.get_mut(id))
        {
            program.datapoints.push(dp_id.clone());
            linked += 1;
        }
    }
    debug!(
        "rebuilt back-references: {} links from {} datapoints",
        linked,
        dataset.datapoints.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Applicant, Datapoint, Program};
    use serde_json::json;

    fn dataset() -> Dataset {
        let mut ds = Dataset::default();
        ds.applicants
            .insert("a1".into(), Applicant::from_row("a1", &json!({"ID": "A-1"})));
        ds.programs.insert(
            "p1".into(),
            Program::from_row("p1", &json!({"School": "S", "Program": "P"})),
        );
        ds
    }

    #[test]
    fn test_rebuild_links_first_references() {
        let mut ds = dataset();
        ds.datapoints.insert(
            "d1".into(),
            Datapoint::from_row("d1", &json!({"Applicants": ["a1"], "Program": ["p1"]})),
        );
        ds.datapoints.insert(
            "d2".into(),
            Datapoint::from_row("d2", &json!({"Applicants": ["a1", "a2"], "Program": ["p1"]})),
        );

        rebuild_backrefs(&mut ds);

        assert_eq!(ds.applicants["a1"].datapoints, vec!["d1", "d2"]);
        assert_eq!(ds.programs["p1"].datapoints, vec!["d1", "d2"]);
    }

    #[test]
    fn test_rebuild_replaces_stale_lists() {
        let mut ds = dataset();
        if let Some(a) = ds.applicants.get_mut("a1") {
            a.datapoints = vec!["stale".into()];
        }

        rebuild_backrefs(&mut ds);

        assert!(ds.applicants["a1"].datapoints.is_empty());
    }

    #[test]
    fn test_missing_targets_are_skipped() {
        let mut ds = dataset();
        ds.datapoints.insert(
            "d1".into(),
            Datapoint::from_row(
                "d1",
                &json!({"Applicants": ["ghost"], "Program": ["p1"]}),
            ),
        );

        rebuild_backrefs(&mut ds);

        // Program side still links; the dangling applicant side is a filter
        // problem, not a rebuild problem.
        assert_eq!(ds.programs["p1"].datapoints, vec!["d1"]);
        assert!(ds.applicants["a1"].datapoints.is_empty());
    }
}
