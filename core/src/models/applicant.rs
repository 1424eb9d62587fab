//! Applicant records
//!
//! One applicant per row. The first major reference is the authoritative
//! one; any further entries are informational. The datapoint list is a
//! back-reference and is rebuilt from the datapoint collection rather than
//! trusted from the store.

use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::terms::TermStamp;
use super::{fields, parse_links, parse_strings, parse_text, RowId};

/// An applicant record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Applicant {
    /// Store row id.
    pub id: RowId,

    /// Display identifier, e.g. `A-17`.
    pub display_id: String,

    /// Nickname, if one was entered. See [`apply_default_nicknames`].
    pub nickname: Option<String>,

    /// Major references; the first entry is authoritative.
    pub majors: Vec<RowId>,

    /// Back-references to this applicant's datapoints. Rebuilt, not fetched.
    pub datapoints: Vec<RowId>,

    /// Undergraduate GPA.
    pub gpa: Option<f64>,

    /// Free-text application direction tags.
    pub directions: Vec<String>,

    /// Rich-text application summary, possibly embedding image URLs.
    pub summary: Option<String>,

    /// Derived: chronologically latest application term.
    pub latest_term: Option<TermStamp>,

    /// Derived: program the applicant ultimately enrolled in.
    pub destination: Option<RowId>,
}

impl Applicant {
    /// Parse one raw row. Never fails; gaps are left for the filter.
    pub fn from_row(id: &str, row: &Value) -> Self {
        Applicant {
            id: id.to_string(),
            display_id: parse_text(row.get(fields::DISPLAY_ID)).unwrap_or_else(|| id.to_string()),
            nickname: parse_text(row.get(fields::NICKNAME)),
            majors: parse_links(row.get(fields::MAJOR)),
            datapoints: Vec::new(),
            gpa: row.get(fields::GPA).and_then(Value::as_f64),
            directions: parse_strings(row.get(fields::DIRECTIONS)),
            summary: parse_text(row.get(fields::SUMMARY)),
            latest_term: None,
            destination: None,
        }
    }

    /// Name shown on rendered pages: the nickname when present, otherwise
    /// the display id.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.display_id)
    }
}

/// Give every unnamed applicant a synthetic nickname.
///
/// Uses the numeric tail of the display id (`A-17` becomes `Applicant 17`);
/// a display id with no parseable tail is used verbatim.
pub fn apply_default_nicknames(applicants: &mut BTreeMap<RowId, Applicant>) {
    for applicant in applicants.values_mut() {
        if applicant.nickname.is_some() {
            continue;
        }
        let tail = applicant
            .display_id
            .split('-')
            .nth(1)
            .and_then(|t| t.parse::<u64>().ok());
        applicant.nickname = Some(match tail {
            Some(n) => format!("Applicant {}", n),
            None => format!("Applicant {}", applicant.display_id),
        });
    }
}
