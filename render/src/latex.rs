//! LaTeX book renderer
//!
//! Emits a `latex/` tree: one `.tex` fragment per applicant, major and
//! program, an `all_areas.tex` grouping applicants by application
//! direction, and a `main.tex` that stitches the fragments together. All
//! interpolated text is escaped; summaries additionally get the list
//! indentation fix for the downstream `markdown` package.

use std::collections::BTreeMap;
use std::path::PathBuf;

use log::info;

use offerbook_core::models::{Applicant, Dataset, Major, Program};
use offerbook_core::TermBuckets;

use crate::escape::{fix_list_indent, latex_escape};
use crate::{build_date, write_page, RenderError};

/// Renderer for the LaTeX flavor of the site.
#[derive(Debug, Clone)]
pub struct LatexRenderer {
    output_dir: PathBuf,
}

impl LatexRenderer {
    /// Renderer writing under `output_dir`.
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        LatexRenderer {
            output_dir: output_dir.into(),
        }
    }

    /// Render every fragment plus the main document.
    pub fn build(&self, dataset: &Dataset, buckets: &TermBuckets) -> Result<(), RenderError> {
        let root = self.output_dir.join("latex");

        info!("generating applicant fragments...");
        for applicant in dataset.applicants.values() {
            write_page(
                &root.join("applicant").join(format!("{}.tex", applicant.display_id)),
                &applicant_fragment(dataset, applicant),
            )?;
        }

        info!("generating major fragments...");
        for major in dataset.majors.values() {
            write_page(
                &root.join("major").join(format!("{}.tex", major.display_id)),
                &major_fragment(dataset, major),
            )?;
        }

        info!("generating program fragments...");
        for program in dataset.programs.values() {
            write_page(
                &root.join("program").join(format!("{}.tex", program.display_id)),
                &program_fragment(dataset, program),
            )?;
        }

        write_page(&root.join("all_areas.tex"), &areas_fragment(dataset))?;
        write_page(&root.join("main.tex"), &main_document(dataset, buckets))?;

        Ok(())
    }
}

fn applicant_name(dataset: &Dataset, id: &str) -> String {
    dataset
        .applicants
        .get(id)
        .map(|a| latex_escape(a.display_name()))
        .unwrap_or_else(|| latex_escape(id))
}

fn program_title(program: &Program) -> String {
    format!(
        "{} ({})",
        latex_escape(program.name.as_deref().unwrap_or(&program.display_id)),
        latex_escape(program.school.as_deref().unwrap_or(""))
    )
}

fn applicant_fragment(dataset: &Dataset, applicant: &Applicant) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\\subsection{{{} ({})}}\n",
        latex_escape(applicant.display_name()),
        latex_escape(&applicant.display_id)
    ));
    out.push_str(&format!(
        "\\label{{applicant:{}}}\n\n",
        applicant.display_id
    ));

    out.push_str("\\begin{itemize}\n");
    if let Some(major) = applicant
        .majors
        .first()
        .and_then(|id| dataset.majors.get(id))
    {
        out.push_str(&format!(
            "  \\item Major: {}\n",
            latex_escape(major.name.as_deref().unwrap_or(&major.display_id))
        ));
    }
    if let Some(gpa) = applicant.gpa {
        out.push_str(&format!("  \\item GPA: {:.2}\n", gpa));
    }
    if let Some(term) = applicant.latest_term {
        out.push_str(&format!("  \\item Latest term: {}\n", latex_escape(&term.label())));
    }
    if !applicant.directions.is_empty() {
        out.push_str(&format!(
            "  \\item Directions: {}\n",
            latex_escape(&applicant.directions.join(", "))
        ));
    }
    for dp_id in &applicant.datapoints {
        let Some(datapoint) = dataset.datapoints.get(dp_id) else {
            continue;
        };
        let Some(program) = datapoint.program().and_then(|id| dataset.programs.get(id)) else {
            continue;
        };
        let term = datapoint
            .term
            .map(|t| offerbook_core::TermStamp { year: datapoint.year, term: t }.label())
            .unwrap_or_default();
        let marker = if datapoint.is_destination {
            " (final destination)"
        } else {
            ""
        };
        out.push_str(&format!(
            "  \\item {}: {}{}\n",
            latex_escape(&term),
            program_title(program),
            marker
        ));
    }
    out.push_str("\\end{itemize}\n");

    if let Some(summary) = &applicant.summary {
        out.push_str("\n\\begin{markdown}\n");
        out.push_str(&fix_list_indent(summary));
        out.push_str("\n\\end{markdown}\n");
    }

    out
}

fn major_fragment(dataset: &Dataset, major: &Major) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "\\subsection{{{}}}\n",
        latex_escape(major.name.as_deref().unwrap_or(&major.display_id))
    ));
    if let Some(department) = &major.department {
        out.push_str(&format!("{}\n\n", latex_escape(department)));
    }

    out.push_str("\\begin{itemize}\n");
    out.push_str(&format!("  \\item Applicants: {}\n", major.applicants.len()));
    out.push_str(&format!("  \\item Applications: {}\n", major.datapoint_count));
    if let Some(median) = major.gpa_median {
        out.push_str(&format!("  \\item Median GPA: {:.2}\n", median));
    }
    out.push_str("\\end{itemize}\n");

    if !major.program_histogram.is_empty() {
        out.push_str("\n\\paragraph{Popular programs}\n\\begin{itemize}\n");
        for (program_id, count) in &major.program_histogram {
            if let Some(program) = dataset.programs.get(program_id) {
                out.push_str(&format!(
                    "  \\item {}: {}\n",
                    program_title(program),
                    count
                ));
            }
        }
        out.push_str("\\end{itemize}\n");
    }

    out.push_str(&term_paragraphs(dataset, &major.applicants_by_term));
    out
}

fn program_fragment(dataset: &Dataset, program: &Program) -> String {
    let mut out = String::new();
    out.push_str(&format!("\\subsection{{{}}}\n", program_title(program)));
    out.push_str(&format!(
        "\\label{{program:{}}}\n\n",
        program.display_id
    ));
    out.push_str("\\begin{itemize}\n");
    out.push_str(&format!(
        "  \\item Applications: {}\n",
        program.datapoints.len()
    ));
    out.push_str("\\end{itemize}\n");
    out.push_str(&term_paragraphs(dataset, &program.applicants_by_term));
    out
}

fn term_paragraphs(dataset: &Dataset, buckets: &TermBuckets) -> String {
    let mut out = String::new();
    for (stamp, members) in buckets {
        if members.is_empty() {
            continue;
        }
        let names: Vec<String> = members
            .iter()
            .map(|id| applicant_name(dataset, id))
            .collect();
        out.push_str(&format!(
            "\n\\paragraph{{{}}} {}\n",
            latex_escape(&stamp.label()),
            names.join(", ")
        ));
    }
    out
}

/// Applicants grouped by application-direction tag, one subsection per
/// tag. Untagged applicants are omitted.
fn areas_fragment(dataset: &Dataset) -> String {
    let mut by_area: BTreeMap<&str, Vec<&Applicant>> = BTreeMap::new();
    for applicant in dataset.applicants.values() {
        for direction in &applicant.directions {
            by_area.entry(direction.as_str()).or_default().push(applicant);
        }
    }

    let mut out = String::from("\\section{Application directions}\n");
    for (area, mut members) in by_area {
        members.sort_by(|a, b| a.display_id.cmp(&b.display_id));
        let names: Vec<String> = members
            .iter()
            .map(|a| latex_escape(a.display_name()))
            .collect();
        out.push_str(&format!(
            "\n\\subsection{{{}}}\n{}\n",
            latex_escape(area),
            names.join(", ")
        ));
    }
    out
}

fn main_document(dataset: &Dataset, buckets: &TermBuckets) -> String {
    let mut out = String::new();
    out.push_str("\\documentclass{article}\n");
    out.push_str("\\usepackage[utf8]{inputenc}\n");
    out.push_str("\\usepackage{markdown}\n");
    out.push_str("\\usepackage{hyperref}\n\n");
    out.push_str("\\title{Offerbook}\n");
    out.push_str(&format!("\\date{{{}}}\n\n", latex_escape(&build_date())));
    out.push_str("\\begin{document}\n\\maketitle\n\\tableofcontents\n\n");

    out.push_str("\\input{all_areas}\n\n");

    out.push_str("\\section{Majors}\n");
    let mut majors: Vec<&Major> = dataset.majors.values().collect();
    majors.sort_by(|a, b| {
        let key = |m: &Major| (m.department.clone().unwrap_or_default(), m.display_id.clone());
        key(*a).cmp(&key(*b))
    });
    for major in majors {
        out.push_str(&format!("\\input{{major/{}}}\n", major.display_id));
    }

    out.push_str("\n\\section{Programs}\n");
    let mut programs: Vec<&Program> = dataset.programs.values().collect();
    programs.sort_by(|a, b| {
        b.datapoints
            .len()
            .cmp(&a.datapoints.len())
            .then_with(|| a.display_id.cmp(&b.display_id))
    });
    for program in programs {
        out.push_str(&format!("\\input{{program/{}}}\n", program.display_id));
    }

    out.push_str("\n\\section{Applicants}\n");
    // Most recent cohort first, matching the site's applicant index.
    let mut seen: Vec<&str> = Vec::new();
    for (_, members) in buckets {
        for id in members {
            if let Some(applicant) = dataset.applicants.get(id) {
                if !seen.contains(&applicant.display_id.as_str()) {
                    seen.push(&applicant.display_id);
                    out.push_str(&format!("\\input{{applicant/{}}}\n", applicant.display_id));
                }
            }
        }
    }
    // Applicants with no bucketed term (year unknown everywhere) still get
    // a fragment.
    for applicant in dataset.applicants.values() {
        if !seen.contains(&applicant.display_id.as_str()) {
            out.push_str(&format!("\\input{{applicant/{}}}\n", applicant.display_id));
        }
    }

    out.push_str("\n\\end{document}\n");
    out
}
