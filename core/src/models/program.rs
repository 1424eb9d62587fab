//! Program records

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::terms::TermStamp;
use super::{fields, parse_text, RowId};

/// A degree program at a school.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Program {
    /// Store row id.
    pub id: RowId,

    /// Display identifier, e.g. `P-42`.
    pub display_id: String,

    /// School name.
    pub school: Option<String>,

    /// Program name.
    pub name: Option<String>,

    /// Back-references to datapoints targeting this program. Rebuilt, not
    /// fetched.
    pub datapoints: Vec<RowId>,

    /// Derived: the global term buckets restricted to applicants with at
    /// least one datapoint targeting this program.
    pub applicants_by_term: Vec<(TermStamp, Vec<RowId>)>,
}

impl Program {
    /// Parse one raw row. Never fails; gaps are left for the filter.
    pub fn from_row(id: &str, row: &Value) -> Self {
        Program {
            id: id.to_string(),
            display_id: parse_text(row.get(fields::DISPLAY_ID)).unwrap_or_else(|| id.to_string()),
            school: parse_text(row.get(fields::SCHOOL)),
            name: parse_text(row.get(fields::PROGRAM)),
            datapoints: Vec::new(),
            applicants_by_term: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_row() {
        let row = json!({"ID": "P-42", "School": "MIT", "Program": "EECS PhD"});
        let p = Program::from_row("p42", &row);
        assert_eq!(p.display_id, "P-42");
        assert_eq!(p.school.as_deref(), Some("MIT"));
        assert_eq!(p.name.as_deref(), Some("EECS PhD"));
        assert!(p.datapoints.is_empty());
    }

    #[test]
    fn test_empty_fields_absent() {
        let p = Program::from_row("p1", &json!({"School": ""}));
        assert!(p.school.is_none());
        assert!(p.name.is_none());
    }
}
