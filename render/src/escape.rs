//! Text mangling for the LaTeX output
//!
//! Summaries and names come straight from a user-edited base, so anything
//! interpolated into a `.tex` file goes through [`latex_escape`]. Markdown
//! bodies additionally go through [`fix_list_indent`].

use std::sync::OnceLock;

use regex::{Captures, Regex};

/// Escape LaTeX special characters. Backslash first, so the replacements
/// themselves survive.
pub fn latex_escape(text: &str) -> String {
    let mut out = text.replace('\\', "\\textbackslash{}");
    out = out.replace('{', "\\{");
    out = out.replace('}', "\\}");
    out = out.replace('$', "\\$");
    out = out.replace('&', "\\&");
    out = out.replace('#', "\\#");
    out = out.replace('^', "\\textasciicircum{}");
    out = out.replace('_', "\\_");
    out = out.replace('~', "\\textasciitilde{}");
    out = out.replace('%', "\\%");
    out
}

fn list_item_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"(?m)^( +)(\*|-|\+)").expect("static pattern compiles"))
}

/// Double the indentation of Markdown list items.
///
/// The base's editor indents nested lists with 2 spaces; the LaTeX
/// `markdown` package only recognizes 4-space nesting.
pub fn fix_list_indent(text: &str) -> String {
    list_item_pattern()
        .replace_all(text, |caps: &Captures<'_>| {
            format!("{}{}", " ".repeat(caps[1].len() * 2), &caps[2])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latex_escape() {
        assert_eq!(latex_escape("a&b_c"), "a\\&b\\_c");
        assert_eq!(latex_escape("100%"), "100\\%");
        assert_eq!(latex_escape("x\\y"), "x\\textbackslash{}y");
        assert_eq!(latex_escape("{~}"), "\\{\\textasciitilde{}\\}");
    }

    #[test]
    fn test_escape_order_does_not_double_escape() {
        // The braces inserted by the backslash replacement must stay as-is.
        assert_eq!(latex_escape("\\"), "\\textbackslash{}");
    }

    #[test]
    fn test_fix_list_indent() {
        let text = "para\n- top\n  - nested\n    * deeper\n";
        assert_eq!(
            fix_list_indent(text),
            "para\n- top\n    - nested\n        * deeper\n"
        );
    }

    #[test]
    fn test_fix_list_indent_ignores_prose() {
        let text = "  not a list item\n";
        assert_eq!(fix_list_indent(text), text);
    }
}
