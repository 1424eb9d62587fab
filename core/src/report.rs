//! Data-quality reporting
//!
//! The integrity filter silently drops records it cannot trust; operators
//! still want to know which rows in the base need fixing. This scan runs on
//! the raw, unfiltered program collection and reports problems without
//! correcting anything.

use std::collections::BTreeMap;
use std::fmt;

use crate::models::{Datapoint, Program, RowId};

/// Problems found in the program collection.
#[derive(Debug, Clone, Default)]
pub struct ProgramIssues {
    /// Programs sharing a case-insensitive (school, name), keyed by that
    /// pair, listing the display ids involved.
    pub duplicates: Vec<((String, String), Vec<String>)>,

    /// Display ids of programs missing a school or a name.
    pub incomplete: Vec<String>,
}

impl ProgramIssues {
    /// Whether the scan found nothing.
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty() && self.incomplete.is_empty()
    }
}

/// Scan programs for duplicate and incomplete entries.
pub fn scan_programs(programs: &BTreeMap<RowId, Program>) -> ProgramIssues {
    let mut by_name: BTreeMap<(String, String), Vec<String>> = BTreeMap::new();
    let mut incomplete = Vec::new();

    for program in programs.values() {
        match (&program.school, &program.name) {
            (Some(school), Some(name)) => {
                by_name
                    .entry((school.to_lowercase(), name.to_lowercase()))
                    .or_default()
                    .push(program.display_id.clone());
            }
            _ => incomplete.push(program.display_id.clone()),
        }
    }

    ProgramIssues {
        duplicates: by_name
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .collect(),
        incomplete,
    }
}

/// Datapoints repeating an (applicant, program) pair.
///
/// The model expects one application event per applicant and program;
/// several usually mean a row was entered twice.
#[derive(Debug, Clone, Default)]
pub struct DatapointIssues {
    /// Duplicate groups keyed by (applicant row id, program row id),
    /// listing the datapoint row ids involved.
    pub duplicates: Vec<((RowId, RowId), Vec<RowId>)>,
}

impl DatapointIssues {
    /// Whether the scan found nothing.
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// Scan datapoints for repeated (applicant, program) pairs. Only the
/// authoritative references take part, matching how the rest of the system
/// reads datapoints.
pub fn scan_datapoints(datapoints: &BTreeMap<RowId, Datapoint>) -> DatapointIssues {
    let mut by_pair: BTreeMap<(RowId, RowId), Vec<RowId>> = BTreeMap::new();

    for datapoint in datapoints.values() {
        let (Some(applicant), Some(program)) = (datapoint.applicant(), datapoint.program()) else {
            continue;
        };
        by_pair
            .entry((applicant.clone(), program.clone()))
            .or_default()
            .push(datapoint.id.clone());
    }

    DatapointIssues {
        duplicates: by_pair
            .into_iter()
            .filter(|(_, ids)| ids.len() > 1)
            .collect(),
    }
}

impl fmt::Display for DatapointIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.duplicates.is_empty() {
            writeln!(f, "**Duplicate datapoints**")?;
            writeln!(f)?;
            for ((applicant, program), ids) in &self.duplicates {
                writeln!(f, " - {}@{}: {:?}", applicant, program, ids)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for ProgramIssues {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.duplicates.is_empty() {
            writeln!(f, "**Duplicate programs**")?;
            writeln!(f)?;
            for ((school, name), ids) in &self.duplicates {
                writeln!(f, " - {}@{}: {:?}", name, school, ids)?;
            }
            writeln!(f)?;
        }
        if !self.incomplete.is_empty() {
            writeln!(f, "**Incomplete programs**")?;
            for id in &self.incomplete {
                writeln!(f, " - {}", id)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn programs(rows: &[(&str, serde_json::Value)]) -> BTreeMap<RowId, Program> {
        rows.iter()
            .map(|(id, row)| (id.to_string(), Program::from_row(id, row)))
            .collect()
    }

    #[test]
    fn test_duplicates_case_insensitive() {
        let programs = programs(&[
            ("p1", json!({"ID": "P-1", "School": "MIT", "Program": "EECS"})),
            ("p2", json!({"ID": "P-2", "School": "mit", "Program": "eecs"})),
            ("p3", json!({"ID": "P-3", "School": "MIT", "Program": "Math"})),
        ]);

        let issues = scan_programs(&programs);
        assert_eq!(issues.duplicates.len(), 1);
        let ((school, name), ids) = &issues.duplicates[0];
        assert_eq!((school.as_str(), name.as_str()), ("mit", "eecs"));
        assert_eq!(ids, &vec!["P-1".to_string(), "P-2".to_string()]);
        assert!(issues.incomplete.is_empty());
    }

    #[test]
    fn test_incomplete() {
        let programs = programs(&[
            ("p1", json!({"ID": "P-1", "School": "MIT"})),
            ("p2", json!({"ID": "P-2", "Program": "EECS"})),
            ("p3", json!({"ID": "P-3", "School": "", "Program": "EECS"})),
        ]);

        let issues = scan_programs(&programs);
        assert_eq!(issues.incomplete, vec!["P-1", "P-2", "P-3"]);
        assert!(issues.duplicates.is_empty());
    }

    #[test]
    fn test_clean_collection() {
        let programs = programs(&[("p1", json!({"ID": "P-1", "School": "S", "Program": "N"}))]);
        let issues = scan_programs(&programs);
        assert!(issues.is_empty());
        assert_eq!(issues.to_string(), "");
    }

    #[test]
    fn test_duplicate_datapoints() {
        let dp = |applicant: &str, program: &str| {
            json!({"Applicants": [applicant], "Program": [program], "Term": "Fall", "Year": 2024})
        };
        let datapoints: BTreeMap<RowId, Datapoint> = [
            ("d1", dp("a1", "p1")),
            ("d2", dp("a1", "p1")),
            ("d3", dp("a1", "p2")),
            ("d4", dp("a2", "p1")),
        ]
        .into_iter()
        .map(|(id, row)| (id.to_string(), Datapoint::from_row(id, &row)))
        .collect();

        let issues = scan_datapoints(&datapoints);
        assert_eq!(issues.duplicates.len(), 1);
        let ((applicant, program), ids) = &issues.duplicates[0];
        assert_eq!((applicant.as_str(), program.as_str()), ("a1", "p1"));
        assert_eq!(ids, &vec!["d1".to_string(), "d2".to_string()]);

        let rendered = issues.to_string();
        assert!(rendered.contains("**Duplicate datapoints**"));
        assert!(rendered.contains(" - a1@p1: [\"d1\", \"d2\"]"));
    }

    #[test]
    fn test_display_format() {
        let programs = programs(&[
            ("p1", json!({"ID": "P-1", "School": "MIT", "Program": "EECS"})),
            ("p2", json!({"ID": "P-2", "School": "MIT", "Program": "EECS"})),
            ("p3", json!({"ID": "P-3"})),
        ]);

        let rendered = scan_programs(&programs).to_string();
        assert!(rendered.contains("**Duplicate programs**"));
        assert!(rendered.contains(" - eecs@mit: [\"P-1\", \"P-2\"]"));
        assert!(rendered.contains("**Incomplete programs**"));
        assert!(rendered.contains(" - P-3"));
    }
}
