//! Major records

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::terms::TermStamp;
use super::{fields, parse_links, parse_text, RowId};

/// An undergraduate major within a department.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Major {
    /// Store row id.
    pub id: RowId,

    /// Display identifier, e.g. `M-3`.
    pub display_id: String,

    /// Department name.
    pub department: Option<String>,

    /// Major name.
    pub name: Option<String>,

    /// Applicant references, as maintained in the store.
    pub applicants: Vec<RowId>,

    /// Derived: the global term buckets restricted to applicants whose
    /// authoritative major is this one.
    pub applicants_by_term: Vec<(TermStamp, Vec<RowId>)>,

    /// Derived: target-program frequencies across this major's datapoints,
    /// most frequent first.
    pub program_histogram: Vec<(RowId, usize)>,

    /// Derived: total datapoints behind the histogram.
    pub datapoint_count: usize,

    /// Derived: median GPA of this major's applicants, absent when no
    /// applicant carries a GPA.
    pub gpa_median: Option<f64>,
}

impl Major {
    /// Parse one raw row. Never fails; gaps are left for the filter.
    pub fn from_row(id: &str, row: &Value) -> Self {
        Major {
            id: id.to_string(),
            display_id: parse_text(row.get(fields::DISPLAY_ID)).unwrap_or_else(|| id.to_string()),
            department: parse_text(row.get(fields::DEPARTMENT)),
            name: parse_text(row.get(fields::MAJOR)),
            applicants: parse_links(row.get(fields::APPLICANTS)),
            applicants_by_term: Vec::new(),
            program_histogram: Vec::new(),
            datapoint_count: 0,
            gpa_median: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_row() {
        let row = json!({
            "ID": "M-3",
            "Department": "EE",
            "Major": "Electrical Engineering",
            "Applicants": ["a1", {"row_id": "a2"}],
        });
        let m = Major::from_row("m3", &row);
        assert_eq!(m.display_id, "M-3");
        assert_eq!(m.department.as_deref(), Some("EE"));
        assert_eq!(m.applicants, vec!["a1", "a2"]);
        assert_eq!(m.datapoint_count, 0);
        assert!(m.gpa_median.is_none());
    }
}
