//! Term ordering and term-derived views
//!
//! A term is identified by an admission year and one of four term names.
//! Both comparisons and groupings go through a single integer key so the
//! whole crate agrees on chronology: `year * 10 + term_index + 1`, with an
//! unknown year pinned to the minimum key 0. Within a year the key orders
//! Spring < Summer < Fall < Winter, and years dominate terms, which is the
//! same ordering as the fractional `year + (index + 1) / 10` scheme the
//! base's maintainers used in spreadsheets.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::models::{Dataset, RowId};

/// Academic term within a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Term {
    /// Spring admissions.
    Spring,

    /// Summer admissions.
    Summer,

    /// Fall admissions, the main cycle.
    Fall,

    /// Winter admissions.
    Winter,
}

impl Term {
    /// Chronological order of terms within one year.
    pub const ORDER: [Term; 4] = [Term::Spring, Term::Summer, Term::Fall, Term::Winter];

    /// Position within [`Term::ORDER`].
    pub fn index(self) -> usize {
        match self {
            Term::Spring => 0,
            Term::Summer => 1,
            Term::Fall => 2,
            Term::Winter => 3,
        }
    }

    /// Canonical name as used by the store.
    pub fn as_str(self) -> &'static str {
        match self {
            Term::Spring => "Spring",
            Term::Summer => "Summer",
            Term::Fall => "Fall",
            Term::Winter => "Winter",
        }
    }
}

impl FromStr for Term {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Spring" => Ok(Term::Spring),
            "Summer" => Ok(Term::Summer),
            "Fall" => Ok(Term::Fall),
            "Winter" => Ok(Term::Winter),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A (year, term) pair with a total chronological order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TermStamp {
    /// Admission year; `None` sorts before every known year.
    pub year: Option<i32>,

    /// Admission term.
    pub term: Term,
}

impl TermStamp {
    /// Build a stamp from a known year.
    pub fn new(year: i32, term: Term) -> Self {
        TermStamp {
            year: Some(year),
            term,
        }
    }

    /// The ordering key. 0 for an unknown year, otherwise
    /// `year * 10 + term_index + 1`, so keys are distinct per (year, term)
    /// and strictly increasing in chronological order.
    pub fn key(&self) -> i64 {
        match self.year {
            None => 0,
            Some(year) => year as i64 * 10 + self.term.index() as i64 + 1,
        }
    }

    /// Human-facing label, e.g. `Fall 2024` or `Fall (year unknown)`.
    pub fn label(&self) -> String {
        match self.year {
            Some(year) => format!("{} {}", self.term, year),
            None => format!("{} (year unknown)", self.term),
        }
    }
}

impl Ord for TermStamp {
    fn cmp(&self, other: &Self) -> Ordering {
        // Unknown-year stamps share key 0; fall back to the term index so
        // the order stays total and consistent with Eq.
        (self.key(), self.term.index()).cmp(&(other.key(), other.term.index()))
    }
}

impl PartialOrd for TermStamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Ordered term buckets: (term, applicant row ids), most recent term first,
/// applicants within a term sorted by display id.
pub type TermBuckets = Vec<(TermStamp, Vec<RowId>)>;

/// Annotate every applicant with its chronologically latest term.
///
/// Scans the applicant's live datapoints; a key tie keeps the datapoint
/// with the smaller row id, so the result does not depend on list order.
pub fn set_latest_terms(dataset: &mut Dataset) {
    let datapoints = &dataset.datapoints;
    for applicant in dataset.applicants.values_mut() {
        let mut best: Option<(&RowId, TermStamp)> = None;
        for dp_id in &applicant.datapoints {
            let Some(dp) = datapoints.get(dp_id) else {
                continue;
            };
            let Some(term) = dp.term else {
                continue;
            };
            let stamp = TermStamp {
                year: dp.year,
                term,
            };
            let take = match &best {
                None => true,
                Some((best_id, best_stamp)) => {
                    stamp.key() > best_stamp.key()
                        || (stamp.key() == best_stamp.key() && dp_id < *best_id)
                }
            };
            if take {
                best = Some((dp_id, stamp));
            }
        }
        applicant.latest_term = best.map(|(_, stamp)| stamp);
    }
}

/// Group applicants by term across the whole dataset.
///
/// Every live datapoint with a known year contributes its authoritative
/// applicant to the (year, term) bucket. Buckets are sets: an applicant
/// reached through several datapoints of the same term appears once.
pub fn term_buckets(dataset: &Dataset) -> TermBuckets {
    let mut buckets: BTreeMap<TermStamp, BTreeSet<RowId>> = BTreeMap::new();

    for datapoint in dataset.datapoints.values() {
        let (Some(year), Some(term)) = (datapoint.year, datapoint.term) else {
            continue;
        };
        let Some(applicant) = datapoint.applicant() else {
            continue;
        };
        buckets
            .entry(TermStamp::new(year, term))
            .or_default()
            .insert(applicant.clone());
    }

    buckets
        .into_iter()
        .rev()
        .map(|(stamp, members)| {
            let mut members: Vec<RowId> = members.into_iter().collect();
            members.sort_by(|a, b| {
                let key = |id: &RowId| {
                    dataset
                        .applicants
                        .get(id)
                        .map(|a| a.display_id.clone())
                        .unwrap_or_default()
                };
                key(a).cmp(&key(b)).then_with(|| a.cmp(b))
            });
            (stamp, members)
        })
        .collect()
}
