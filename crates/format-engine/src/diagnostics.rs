//! Grouped diagnostics with examples and suggested actions

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared_types::Document;

use crate::models::{FormatIssue, FormatReport, IssueCode};
use crate::policy::FormatPolicy;

pub const MAX_EXAMPLES: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FormatDiagnostics {
    pub issue_count: usize,
    /// Codes present, sorted by name
    pub codes: Vec<String>,
    pub by_code: BTreeMap<String, CodeDiagnostics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodeDiagnostics {
    pub count: usize,
    pub examples: Vec<DiagnosticExample>,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticExample {
    pub paragraph_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_value: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Value>,
}

type IndentLookup = BTreeMap<String, Option<i32>>;

fn indent_lookup(document: &Document) -> IndentLookup {
    document
        .paragraph_contexts(true)
        .map(|ctx| (ctx.paragraph_path, ctx.paragraph.first_line_indent_twips()))
        .collect()
}

/// Group `report` issues by code, comparing the pristine template with the rendered document
pub fn build_format_diagnostics(
    template: &Document,
    rendered: &Document,
    policy: &FormatPolicy,
    report: &FormatReport,
) -> FormatDiagnostics {
    let template_indents = indent_lookup(template);
    let rendered_indents = indent_lookup(rendered);

    let mut by_code: BTreeMap<String, CodeDiagnostics> = BTreeMap::new();
    for issue in &report.issues {
        let bucket = by_code
            .entry(issue.code.as_str().to_string())
            .or_insert_with(|| CodeDiagnostics {
                count: 0,
                examples: Vec::new(),
                suggestions: suggestions_for(issue.code, policy),
            });
        bucket.count += 1;
        if bucket.examples.len() < MAX_EXAMPLES {
            bucket
                .examples
                .push(example_for(issue, &template_indents, &rendered_indents));
        }
    }

    FormatDiagnostics {
        issue_count: report.issues.len(),
        codes: by_code.keys().cloned().collect(),
        by_code,
    }
}

fn example_for(
    issue: &FormatIssue,
    template_indents: &IndentLookup,
    rendered_indents: &IndentLookup,
) -> DiagnosticExample {
    let mut template_value = issue.template_value.clone();
    let mut rendered_value = issue.rendered_value.clone();

    if issue.code == IssueCode::FirstLineIndentMismatch {
        let lookup = |indents: &IndentLookup| {
            indents
                .get(&issue.paragraph_path)
                .copied()
                .flatten()
                .map(Value::from)
        };
        template_value = template_value.or_else(|| lookup(template_indents));
        rendered_value = rendered_value.or_else(|| lookup(rendered_indents));
    }

    DiagnosticExample {
        paragraph_path: issue.paragraph_path.clone(),
        run_id: issue.run_id.clone(),
        expected: issue.expected.clone(),
        actual: issue.actual.clone(),
        tolerance: issue.tolerance,
        template_value,
        rendered_value,
        context: issue.context.clone(),
    }
}

pub fn suggestions_for(code: IssueCode, policy: &FormatPolicy) -> Vec<String> {
    match code {
        IssueCode::TableForbidden => vec![
            "Use the template baseline to validate against the template's own shape.".into(),
            "Or set policy.forbid_tables=false for table-based templates.".into(),
        ],
        IssueCode::FirstLineIndentMismatch => vec![
            format!(
                "Align policy.first_line_indent_twips with the dominant template indent (current policy={}).",
                policy
                    .first_line_indent_twips
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| "none".into())
            ),
            format!(
                "Increase policy.twips_tolerance for acceptable variance (current tolerance={}).",
                policy.twips_tolerance
            ),
        ],
        IssueCode::LineSpacingMismatch => vec![
            format!(
                "Align policy.line_spacing_twips with the template spacing (current policy={}).",
                policy.line_spacing_twips
            ),
            "Enable the safe fix mode to align spacing on touched paragraphs.".into(),
        ],
        IssueCode::NumprPresent => vec![
            "Remove direct paragraph numbering (w:numPr) from the template.".into(),
            "Keep numbering policy strict; this rule inspects direct properties only.".into(),
        ],
        IssueCode::LeadingWhitespace => vec![
            "Remove leading spaces from the template paragraph or the supplied value.".into(),
            "Use first-line indent instead of typed whitespace.".into(),
        ],
        IssueCode::RunFontMismatch | IssueCode::RunSizeMismatch => vec![
            "Set run fonts and size directly on the placeholder run in the template.".into(),
            "Use the template baseline to keep each placeholder's own formatting.".into(),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use shared_types::Paragraph;

    #[test]
    fn test_groups_by_code_and_caps_examples() {
        let issues = (0..7)
            .map(|i| FormatIssue::new(IssueCode::LeadingWhitespace, "ws", format!("p{i}")))
            .chain(std::iter::once(FormatIssue::new(
                IssueCode::TableForbidden,
                "tables",
                "t0",
            )))
            .collect();
        let report = FormatReport::from_issues(issues);
        let policy = FormatPolicy::builtin().unwrap();
        let doc = Document::new();

        let diagnostics = build_format_diagnostics(&doc, &doc, &policy, &report);
        assert_eq!(diagnostics.issue_count, 8);
        assert_eq!(diagnostics.codes, vec!["LEADING_WHITESPACE", "TABLE_FORBIDDEN"]);
        let ws = &diagnostics.by_code["LEADING_WHITESPACE"];
        assert_eq!(ws.count, 7);
        assert_eq!(ws.examples.len(), MAX_EXAMPLES);
        assert!(!ws.suggestions.is_empty());
    }

    #[test]
    fn test_indent_examples_carry_template_and_rendered_values() {
        let mut template = Document::new();
        template.add_paragraph(Paragraph::new("x").with_first_line_indent(420));
        let mut rendered = Document::new();
        rendered.add_paragraph(Paragraph::new("x").with_first_line_indent(480));

        let issue = FormatIssue::new(IssueCode::FirstLineIndentMismatch, "indent", "p0")
            .with_expected(420)
            .with_actual(480)
            .with_tolerance(20);
        let report = FormatReport::from_issues(vec![issue]);
        let policy = FormatPolicy::builtin().unwrap();

        let diagnostics = build_format_diagnostics(&template, &rendered, &policy, &report);
        let example = &diagnostics.by_code["FIRST_LINE_INDENT_MISMATCH"].examples[0];
        assert_eq!(example.template_value, Some(json!(420)));
        assert_eq!(example.rendered_value, Some(json!(480)));
        assert_eq!(example.tolerance, Some(20));
    }

    #[test]
    fn test_suggestions_interpolate_policy_values() {
        let policy = FormatPolicy::builtin().unwrap();
        let suggestions = suggestions_for(IssueCode::FirstLineIndentMismatch, &policy);
        assert!(suggestions[0].contains("current policy=420"));
        assert!(suggestions[1].contains("current tolerance=20"));
        let spacing = suggestions_for(IssueCode::LineSpacingMismatch, &policy);
        assert!(spacing[0].contains("360"));
    }
}
