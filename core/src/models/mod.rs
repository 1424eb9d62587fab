//! Typed records for the four store collections
//!
//! Rows arrive from the store as loose JSON objects keyed by an opaque
//! `_id`. Everything here parses leniently: a missing or malformed field
//! becomes `None` or an empty list, never an error. Incomplete records are
//! data, and the integrity filter is the component that judges them.

mod applicant;
mod datapoint;
mod major;
mod program;

pub use applicant::{apply_default_nicknames, Applicant};
pub use datapoint::Datapoint;
pub use major::Major;
pub use program::Program;

use std::collections::BTreeMap;
use serde_json::Value;

/// Opaque row identifier assigned by the store.
pub type RowId = String;

/// One raw collection as fetched: row id to row object.
pub type RawRows = BTreeMap<RowId, Value>;

/// Column names used by the remote base.
///
/// The base reuses a column name for both sides of a link: `Program` is the
/// datapoint's program link and the program's own name column, and `Major`
/// is the applicant's major link and the major's name column.
pub mod fields {
    /// Human-facing display identifier, e.g. `A-17`.
    pub const DISPLAY_ID: &str = "ID";

    /// Applicant nickname.
    pub const NICKNAME: &str = "Nickname";

    /// Applicant major link / major name.
    pub const MAJOR: &str = "Major";

    /// Back-reference list to datapoints.
    pub const DATAPOINTS: &str = "Datapoints";

    /// Applicant GPA.
    pub const GPA: &str = "GPA";

    /// Application direction tags.
    pub const DIRECTIONS: &str = "Directions";

    /// Rich-text application summary.
    pub const SUMMARY: &str = "Summary";

    /// Datapoint program link / program name.
    pub const PROGRAM: &str = "Program";

    /// Admission year.
    pub const YEAR: &str = "Year";

    /// Admission term.
    pub const TERM: &str = "Term";

    /// Applicant link list.
    pub const APPLICANTS: &str = "Applicants";

    /// Final-destination marker on a datapoint.
    pub const FINAL_DESTINATION: &str = "Final destination";

    /// Program school name.
    pub const SCHOOL: &str = "School";

    /// Major department name.
    pub const DEPARTMENT: &str = "Department";
}

/// The four collections of one snapshot, keyed by row id.
///
/// Ordered maps keep every scan deterministic: back-reference lists, filter
/// passes and histogram tie-breaks all depend only on row ids, never on
/// hash-map iteration order.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    /// Applicant collection.
    pub applicants: BTreeMap<RowId, Applicant>,

    /// Datapoint collection.
    pub datapoints: BTreeMap<RowId, Datapoint>,

    /// Program collection.
    pub programs: BTreeMap<RowId, Program>,

    /// Major collection.
    pub majors: BTreeMap<RowId, Major>,
}

impl Dataset {
    /// Normalize one raw snapshot into typed records.
    pub fn from_rows(
        applicants: &RawRows,
        datapoints: &RawRows,
        programs: &RawRows,
        majors: &RawRows,
    ) -> Self {
        Dataset {
            applicants: applicants
                .iter()
                .map(|(id, row)| (id.clone(), Applicant::from_row(id, row)))
                .collect(),
            datapoints: datapoints
                .iter()
                .map(|(id, row)| (id.clone(), Datapoint::from_row(id, row)))
                .collect(),
            programs: programs
                .iter()
                .map(|(id, row)| (id.clone(), Program::from_row(id, row)))
                .collect(),
            majors: majors
                .iter()
                .map(|(id, row)| (id.clone(), Major::from_row(id, row)))
                .collect(),
        }
    }

    /// Total number of records across the four collections.
    pub fn record_count(&self) -> usize {
        self.applicants.len() + self.datapoints.len() + self.programs.len() + self.majors.len()
    }

    /// Total number of cross-references held by all records.
    pub fn reference_count(&self) -> usize {
        let a: usize = self
            .applicants
            .values()
            .map(|a| a.majors.len() + a.datapoints.len())
            .sum();
        let d: usize = self
            .datapoints
            .values()
            .map(|d| d.programs.len() + d.applicants.len())
            .sum();
        let p: usize = self.programs.values().map(|p| p.datapoints.len()).sum();
        let m: usize = self.majors.values().map(|m| m.applicants.len()).sum();
        a + d + p + m
    }
}

/// Normalize a link cell into plain row ids.
///
/// The store emits links either as bare id strings or as objects carrying a
/// `row_id` field, depending on column type and API version. Only this
/// function ever sees both shapes.
pub(crate) fn parse_links(value: Option<&Value>) -> Vec<RowId> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| match item {
            Value::String(id) => Some(id.clone()),
            Value::Object(obj) => obj
                .get("row_id")
                .and_then(Value::as_str)
                .map(str::to_string),
            _ => None,
        })
        .collect()
}

/// Extract a non-empty text field.
pub(crate) fn parse_text(value: Option<&Value>) -> Option<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

/// Extract a list of plain strings (multi-select columns).
pub(crate) fn parse_strings(value: Option<&Value>) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(str::to_string)
        .collect()
}

/// Extract an integer year. Numeric columns round-trip through JSON as
/// floats, and older rows stored the year as text.
pub(crate) fn parse_year(value: Option<&Value>) -> Option<i32> {
    match value {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .map(|y| y as i32),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_links_bare_ids() {
        let value = json!(["r1", "r2"]);
        assert_eq!(parse_links(Some(&value)), vec!["r1", "r2"]);
    }

    #[test]
    fn test_parse_links_row_id_objects() {
        let value = json!([{"row_id": "r1", "display_value": "x"}, {"row_id": "r2"}]);
        assert_eq!(parse_links(Some(&value)), vec!["r1", "r2"]);
    }

    #[test]
    fn test_parse_links_mixed_and_junk() {
        let value = json!(["r1", {"row_id": "r2"}, 42, {"other": "y"}]);
        assert_eq!(parse_links(Some(&value)), vec!["r1", "r2"]);

        assert!(parse_links(None).is_empty());
        assert!(parse_links(Some(&json!("not a list"))).is_empty());
    }

    #[test]
    fn test_parse_year_shapes() {
        assert_eq!(parse_year(Some(&json!(2024))), Some(2024));
        assert_eq!(parse_year(Some(&json!(2024.0))), Some(2024));
        assert_eq!(parse_year(Some(&json!("2023"))), Some(2023));
        assert_eq!(parse_year(Some(&json!(null))), None);
        assert_eq!(parse_year(None), None);
    }

    #[test]
    fn test_parse_text_empty_is_absent() {
        assert_eq!(parse_text(Some(&json!(""))), None);
        assert_eq!(parse_text(Some(&json!("x"))), Some("x".to_string()));
    }

    #[test]
    fn test_dataset_counts() {
        let applicants: RawRows = [(
            "a1".to_string(),
            json!({"ID": "A-1", "Major": ["m1"], "GPA": 3.5}),
        )]
        .into_iter()
        .collect();
        let datapoints: RawRows = [(
            "d1".to_string(),
            json!({"Program": ["p1"], "Applicants": ["a1"], "Year": 2024, "Term": "Fall"}),
        )]
        .into_iter()
        .collect();
        let programs: RawRows = [(
            "p1".to_string(),
            json!({"ID": "P-1", "School": "S", "Program": "N"}),
        )]
        .into_iter()
        .collect();
        let majors: RawRows = [(
            "m1".to_string(),
            json!({"ID": "M-1", "Department": "D", "Major": "N", "Applicants": ["a1"]}),
        )]
        .into_iter()
        .collect();

        let ds = Dataset::from_rows(&applicants, &datapoints, &programs, &majors);
        assert_eq!(ds.record_count(), 4);
        // a1 holds 1 major ref; d1 holds 1 program + 1 applicant ref; m1
        // holds 1 applicant ref. Back-reference lists start empty.
        assert_eq!(ds.reference_count(), 4);
    }
}
