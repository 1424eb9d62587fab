//! Datapoint records
//!
//! A datapoint is one application event linking an applicant to a program
//! for a given year and term. The model nominally allows several applicants
//! per datapoint but only the first reference is ever used.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::terms::Term;
use super::{fields, parse_links, parse_year, RowId};

/// One application event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Datapoint {
    /// Store row id.
    pub id: RowId,

    /// Program references; the first entry is authoritative.
    pub programs: Vec<RowId>,

    /// Admission year; unknown years stay `None` and sort first.
    pub year: Option<i32>,

    /// Admission term.
    pub term: Option<Term>,

    /// Applicant references; the first entry is authoritative.
    pub applicants: Vec<RowId>,

    /// Marks the program the applicant ultimately enrolled in.
    pub is_destination: bool,
}

impl Datapoint {
    /// Parse one raw row. Never fails; gaps are left for the filter.
    pub fn from_row(id: &str, row: &Value) -> Self {
        Datapoint {
            id: id.to_string(),
            programs: parse_links(row.get(fields::PROGRAM)),
            year: parse_year(row.get(fields::YEAR)),
            term: row
                .get(fields::TERM)
                .and_then(Value::as_str)
                .and_then(|s| s.parse().ok()),
            applicants: parse_links(row.get(fields::APPLICANTS)),
            is_destination: marker_set(row.get(fields::FINAL_DESTINATION)),
        }
    }

    /// The authoritative program reference.
    pub fn program(&self) -> Option<&RowId> {
        self.programs.first()
    }

    /// The authoritative applicant reference.
    pub fn applicant(&self) -> Option<&RowId> {
        self.applicants.first()
    }
}

/// The destination marker column has appeared as a checkbox, a text flag
/// and a bare presence marker across base revisions. Anything other than
/// null, `false` or an empty string counts as set.
fn marker_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}
