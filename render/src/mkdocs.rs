//! MkDocs site renderer
//!
//! Emits a `docs/` tree of Markdown pages plus a `mkdocs.yml` at the output
//! root. Page bodies are plain Markdown built with `format!`; applicant
//! summaries are passed through verbatim (they are Markdown already, with
//! image URLs rewritten upstream).

use std::path::PathBuf;

use log::info;

use offerbook_core::models::{Applicant, Dataset, Major, Program};
use offerbook_core::{RowId, TermBuckets};

use crate::{build_stamp, write_page, RenderError};

/// Renderer for the MkDocs flavor of the site.
#[derive(Debug, Clone)]
pub struct MkDocsRenderer {
    output_dir: PathBuf,
}

impl MkDocsRenderer {
    /// Renderer writing under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        MkDocsRenderer {
            output_dir: output_dir.into(),
        }
    }

    /// Render every page of the site.
    pub fn build(&self, dataset: &Dataset, buckets: &TermBuckets) -> Result<(), RenderError> {
        let docs = self.output_dir.join("docs");

        info!("generating applicant pages...");
        for applicant in dataset.applicants.values() {
            write_page(
                &docs.join("applicant").join(format!("{}.md", applicant.display_id)),
                &applicant_page(dataset, applicant),
            )?;
        }

        info!("generating major pages...");
        for major in dataset.majors.values() {
            write_page(
                &docs.join("major").join(format!("{}.md", major.display_id)),
                &major_page(dataset, major),
            )?;
        }

        info!("generating program pages...");
        for program in dataset.programs.values() {
            write_page(
                &docs.join("program").join(format!("{}.md", program.display_id)),
                &program_page(dataset, program),
            )?;
        }

        info!("generating index pages...");
        write_page(&docs.join("index.md"), &root_index(dataset))?;
        write_page(
            &docs.join("applicant").join("index.md"),
            &applicant_index(dataset, buckets),
        )?;
        write_page(&docs.join("major").join("index.md"), &major_index(dataset))?;
        write_page(
            &docs.join("program").join("index.md"),
            &program_index(dataset),
        )?;
        write_page(&self.output_dir.join("mkdocs.yml"), &mkdocs_config(dataset))?;

        Ok(())
    }
}

fn applicant_link(dataset: &Dataset, id: &RowId, from_section: bool) -> String {
    let prefix = if from_section { "../applicant/" } else { "" };
    match dataset.applicants.get(id) {
        Some(a) => format!("[{}]({}{}.md)", a.display_name(), prefix, a.display_id),
        None => id.clone(),
    }
}

fn program_link(dataset: &Dataset, id: &RowId) -> String {
    match dataset.programs.get(id) {
        Some(p) => format!(
            "[{}](../program/{}.md)",
            p.name.as_deref().unwrap_or(&p.display_id),
            p.display_id
        ),
        None => id.clone(),
    }
}

fn applicant_page(dataset: &Dataset, applicant: &Applicant) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# {} ({})\n\n",
        applicant.display_name(),
        applicant.display_id
    ));

    if let Some(major) = applicant
        .majors
        .first()
        .and_then(|id| dataset.majors.get(id))
    {
        out.push_str(&format!(
            "- Major: [{}](../major/{}.md)\n",
            major.name.as_deref().unwrap_or(&major.display_id),
            major.display_id
        ));
    }
    if let Some(gpa) = applicant.gpa {
        out.push_str(&format!("- GPA: {:.2}\n", gpa));
    }
    if let Some(term) = applicant.latest_term {
        out.push_str(&format!("- Latest term: {}\n", term.label()));
    }
    if !applicant.directions.is_empty() {
        out.push_str(&format!("- Directions: {}\n", applicant.directions.join(", ")));
    }
    if let Some(destination) = &applicant.destination {
        out.push_str(&format!(
            "- Final destination: {}\n",
            program_link(dataset, destination)
        ));
    }

    out.push_str("\n## Applications\n\n");
    out.push_str("| Term | Program | School | |\n|---|---|---|---|\n");
    for datapoint in sorted_datapoints(dataset, applicant) {
        let term = datapoint
            .term
            .map(|t| offerbook_core::TermStamp { year: datapoint.year, term: t }.label())
            .unwrap_or_default();
        let (program, school) = match datapoint.program().and_then(|id| dataset.programs.get(id)) {
            Some(p) => (
                program_link(dataset, &p.id),
                p.school.clone().unwrap_or_default(),
            ),
            None => (String::new(), String::new()),
        };
        let marker = if datapoint.is_destination {
            "final destination"
        } else {
            ""
        };
        out.push_str(&format!("| {} | {} | {} | {} |\n", term, program, school, marker));
    }

    if let Some(summary) = &applicant.summary {
        out.push_str("\n## Summary\n\n");
        out.push_str(summary);
        out.push('\n');
    }

    out
}

fn sorted_datapoints<'a>(
    dataset: &'a Dataset,
    applicant: &Applicant,
) -> Vec<&'a offerbook_core::Datapoint> {
    let mut datapoints: Vec<_> = applicant
        .datapoints
        .iter()
        .filter_map(|id| dataset.datapoints.get(id))
        .collect();
    datapoints.sort_by(|a, b| {
        let key = |d: &offerbook_core::Datapoint| {
            d.term
                .map(|term| offerbook_core::TermStamp { year: d.year, term }.key())
                .unwrap_or(0)
        };
        key(*b).cmp(&key(*a)).then_with(|| a.id.cmp(&b.id))
    });
    datapoints
}

fn major_page(dataset: &Dataset, major: &Major) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# {} ({})\n\n",
        major.name.as_deref().unwrap_or(&major.display_id),
        major.display_id
    ));
    if let Some(department) = &major.department {
        out.push_str(&format!("Department: {}\n\n", department));
    }
    out.push_str(&format!("- Applicants: {}\n", major.applicants.len()));
    out.push_str(&format!("- Applications: {}\n", major.datapoint_count));
    if let Some(median) = major.gpa_median {
        out.push_str(&format!("- Median GPA: {:.2}\n", median));
    }

    if !major.program_histogram.is_empty() {
        out.push_str("\n## Popular programs\n\n");
        out.push_str("| Program | School | Applications |\n|---|---|---|\n");
        for (program_id, count) in &major.program_histogram {
            let school = dataset
                .programs
                .get(program_id)
                .and_then(|p| p.school.clone())
                .unwrap_or_default();
            out.push_str(&format!(
                "| {} | {} | {} |\n",
                program_link(dataset, program_id),
                school,
                count
            ));
        }
    }

    out.push_str(&term_sections(dataset, &major.applicants_by_term));
    out
}

fn program_page(dataset: &Dataset, program: &Program) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "# {} ({})\n\n",
        program.name.as_deref().unwrap_or(&program.display_id),
        program.display_id
    ));
    if let Some(school) = &program.school {
        out.push_str(&format!("School: {}\n\n", school));
    }
    out.push_str(&format!("- Applications: {}\n", program.datapoints.len()));
    out.push_str(&term_sections(dataset, &program.applicants_by_term));
    out
}

/// `## <term>` sections with one applicant link per line; empty terms are
/// skipped on pages but kept in the derived data.
fn term_sections(dataset: &Dataset, buckets: &TermBuckets) -> String {
    let mut out = String::new();
    out.push_str("\n## Applicants by term\n");
    for (stamp, members) in buckets {
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("\n### {}\n\n", stamp.label()));
        for id in members {
            out.push_str(&format!("- {}\n", applicant_link(dataset, id, true)));
        }
    }
    out
}

fn root_index(dataset: &Dataset) -> String {
    format!(
        "# Offerbook\n\nA directory of graduate application outcomes.\n\n\
         - [Applicants](applicant/index.md): {}\n\
         - [Majors](major/index.md): {}\n\
         - [Programs](program/index.md): {}\n\n\
         Generated {}.\n",
        dataset.applicants.len(),
        dataset.majors.len(),
        dataset.programs.len(),
        build_stamp()
    )
}

fn applicant_index(dataset: &Dataset, buckets: &TermBuckets) -> String {
    let mut out = String::from("# Applicants\n");
    for (stamp, members) in buckets {
        if members.is_empty() {
            continue;
        }
        out.push_str(&format!("\n## {}\n\n", stamp.label()));
        for id in members {
            out.push_str(&format!("- {}\n", applicant_link(dataset, id, false)));
        }
    }
    out
}

fn majors_by_popularity(dataset: &Dataset) -> Vec<&Major> {
    let mut majors: Vec<_> = dataset.majors.values().collect();
    majors.sort_by(|a, b| {
        b.applicants
            .len()
            .cmp(&a.applicants.len())
            .then_with(|| a.display_id.cmp(&b.display_id))
    });
    majors
}

fn programs_by_popularity(dataset: &Dataset) -> Vec<&Program> {
    let mut programs: Vec<_> = dataset.programs.values().collect();
    programs.sort_by(|a, b| {
        b.datapoints
            .len()
            .cmp(&a.datapoints.len())
            .then_with(|| a.display_id.cmp(&b.display_id))
    });
    programs
}

fn major_index(dataset: &Dataset) -> String {
    let mut out = String::from("# Majors\n\n");
    for major in majors_by_popularity(dataset) {
        out.push_str(&format!(
            "- [{}]({}.md) ({} applicants)\n",
            major.name.as_deref().unwrap_or(&major.display_id),
            major.display_id,
            major.applicants.len()
        ));
    }
    out
}

fn program_index(dataset: &Dataset) -> String {
    let mut out = String::from("# Programs\n\n");
    for program in programs_by_popularity(dataset) {
        out.push_str(&format!(
            "- [{} ({})]({}.md) ({} applications)\n",
            program.name.as_deref().unwrap_or(&program.display_id),
            program.school.as_deref().unwrap_or(""),
            program.display_id,
            program.datapoints.len()
        ));
    }
    out
}

fn mkdocs_config(dataset: &Dataset) -> String {
    let mut out = String::new();
    out.push_str("site_name: Offerbook\n");
    out.push_str("site_description: A directory of graduate application outcomes\n");
    out.push_str("theme:\n  name: material\n");
    out.push_str("nav:\n");
    out.push_str("  - Home: index.md\n");

    out.push_str("  - Applicants:\n");
    out.push_str("      - Overview: applicant/index.md\n");
    let mut applicants: Vec<_> = dataset.applicants.values().collect();
    applicants.sort_by(|a, b| a.display_id.cmp(&b.display_id));
    for applicant in applicants {
        out.push_str(&format!(
            "      - \"{}\": applicant/{}.md\n",
            applicant.display_name(),
            applicant.display_id
        ));
    }

    out.push_str("  - Majors:\n");
    out.push_str("      - Overview: major/index.md\n");
    for major in majors_by_popularity(dataset) {
        out.push_str(&format!(
            "      - \"{}\": major/{}.md\n",
            major.name.as_deref().unwrap_or(&major.display_id),
            major.display_id
        ));
    }

    out.push_str("  - Programs:\n");
    out.push_str("      - Overview: program/index.md\n");
    for program in programs_by_popularity(dataset) {
        out.push_str(&format!(
            "      - \"{}\": program/{}.md\n",
            program.name.as_deref().unwrap_or(&program.display_id),
            program.display_id
        ));
    }

    out
}
