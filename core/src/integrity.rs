//! Referential-integrity filtering
//!
//! The four collections reference each other in a cycle
//! (applicant↔datapoint↔program, applicant↔major), so removing one invalid
//! record can invalidate records that already passed. A single sweep cannot
//! settle that; the filter instead reruns full passes until one makes no
//! change. Each pass judges every record against the previous pass's
//! collection membership, prunes dangling references in place, and batches
//! all removals for the end of the pass.

use log::debug;

use crate::error::{CoreError, Result};
use crate::models::{Dataset, RowId};

/// Caller-chosen validity policy.
#[derive(Debug, Clone, Default)]
pub struct FilterPolicy {
    /// When set, an applicant none of whose live datapoints carries the
    /// final-destination marker is invalid. Off by default: an applicant
    /// who documented outcomes without enrolling anywhere is still data
    /// worth keeping.
    pub require_destination: bool,
}

/// What one filter run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterOutcome {
    /// Passes executed, including the final no-change pass.
    pub passes: usize,

    /// Applicants removed.
    pub removed_applicants: usize,

    /// Datapoints removed.
    pub removed_datapoints: usize,

    /// Majors removed.
    pub removed_majors: usize,

    /// Programs removed.
    pub removed_programs: usize,

    /// Dangling references pruned out of surviving records' lists.
    pub pruned_references: usize,
}

impl FilterOutcome {
    /// Total records removed across the four collections.
    pub fn removed_records(&self) -> usize {
        self.removed_applicants
            + self.removed_datapoints
            + self.removed_majors
            + self.removed_programs
    }
}

/// Prune the dataset to its maximal self-consistent subset.
///
/// Terminates because every changing pass removes at least one record or
/// one reference; the pass bound turns a violation of that into
/// [`CoreError::NonConvergence`] instead of a hang.
pub fn prune_to_consistency(dataset: &mut Dataset, policy: &FilterPolicy) -> Result<FilterOutcome> {
    let records = dataset.record_count();
    let references = dataset.reference_count();
    let max_passes = records + references + 1;

    let mut outcome = FilterOutcome::default();

    loop {
        if outcome.passes == max_passes {
            return Err(CoreError::NonConvergence {
                max_passes,
                records,
                references,
            });
        }
        outcome.passes += 1;

        let mut pruned = 0usize;
        let mut invalid_applicants: Vec<RowId> = Vec::new();
        let mut invalid_datapoints: Vec<RowId> = Vec::new();
        let mut invalid_majors: Vec<RowId> = Vec::new();
        let mut invalid_programs: Vec<RowId> = Vec::new();

        // Judge applicants. Dangling datapoint references are pruned even
        // when the applicant survives, so a later pass sees the short list.
        for (id, applicant) in dataset.applicants.iter_mut() {
            let before = applicant.datapoints.len();
            applicant
                .datapoints
                .retain(|dp| dataset.datapoints.contains_key(dp));
            pruned += before - applicant.datapoints.len();

            let mut valid = !applicant.datapoints.is_empty()
                && applicant
                    .majors
                    .first()
                    .map_or(false, |m| dataset.majors.contains_key(m));
            if valid && policy.require_destination {
                valid = applicant
                    .datapoints
                    .iter()
                    .any(|dp| dataset.datapoints.get(dp).map_or(false, |d| d.is_destination));
            }
            if !valid {
                invalid_applicants.push(id.clone());
            }
        }

        // Judge datapoints.
        for (id, datapoint) in dataset.datapoints.iter_mut() {
            let before = datapoint.applicants.len();
            datapoint
                .applicants
                .retain(|a| dataset.applicants.contains_key(a));
            pruned += before - datapoint.applicants.len();

            let valid = datapoint.term.is_some()
                && !datapoint.applicants.is_empty()
                && datapoint
                    .programs
                    .first()
                    .map_or(false, |p| dataset.programs.contains_key(p));
            if !valid {
                invalid_datapoints.push(id.clone());
            }
        }

        // Judge majors.
        for (id, major) in dataset.majors.iter_mut() {
            let before = major.applicants.len();
            major
                .applicants
                .retain(|a| dataset.applicants.contains_key(a));
            pruned += before - major.applicants.len();

            let valid =
                major.department.is_some() && major.name.is_some() && !major.applicants.is_empty();
            if !valid {
                invalid_majors.push(id.clone());
            }
        }

        // Judge programs.
        for (id, program) in dataset.programs.iter_mut() {
            let before = program.datapoints.len();
            program
                .datapoints
                .retain(|dp| dataset.datapoints.contains_key(dp));
            pruned += before - program.datapoints.len();

            let valid =
                program.school.is_some() && program.name.is_some() && !program.datapoints.is_empty();
            if !valid {
                invalid_programs.push(id.clone());
            }
        }

        // Batched removal, applicants first. Everything judged above saw
        // the membership as it was when the pass started.
        let mut removed = 0usize;
        for id in &invalid_applicants {
            if dataset.applicants.remove(id).is_some() {
                outcome.removed_applicants += 1;
                removed += 1;
            }
        }
        for id in &invalid_datapoints {
            if dataset.datapoints.remove(id).is_some() {
                outcome.removed_datapoints += 1;
                removed += 1;
            }
        }
        for id in &invalid_majors {
            if dataset.majors.remove(id).is_some() {
                outcome.removed_majors += 1;
                removed += 1;
            }
        }
        for id in &invalid_programs {
            if dataset.programs.remove(id).is_some() {
                outcome.removed_programs += 1;
                removed += 1;
            }
        }

        outcome.pruned_references += pruned;
        debug!(
            "filter pass {}: removed {} records, pruned {} references",
            outcome.passes, removed, pruned
        );

        if removed == 0 && pruned == 0 {
            return Ok(outcome);
        }
    }
}
