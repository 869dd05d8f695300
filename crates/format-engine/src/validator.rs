//! Format validator
//!
//! Paragraph checks (numbering, spacing, indent, leading whitespace) apply to
//! every visited paragraph. Run checks (font, size) apply only to runs the
//! renderer touched, compared either to the template's pre-render snapshot or
//! to the fixed policy values.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::json;
use shared_types::{Document, Paragraph, ParagraphRunContext, Run};
use tracing::debug;

use crate::models::{
    FormatBaseline, FormatIssue, FormatReport, IssueCode, Observability, RunStyleSnapshot,
    Severity,
};
use crate::policy::FormatPolicy;

/// Outcome of a single expected-vs-actual comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Match,
    Mismatch(Severity, Observability),
}

pub struct FormatValidator<'a> {
    policy: &'a FormatPolicy,
    touched_runs: &'a BTreeSet<String>,
    baseline: FormatBaseline,
    template_run_styles: Option<&'a BTreeMap<String, RunStyleSnapshot>>,
}

impl<'a> FormatValidator<'a> {
    /// Policy-baseline validator
    pub fn new(policy: &'a FormatPolicy, touched_runs: &'a BTreeSet<String>) -> Self {
        Self {
            policy,
            touched_runs,
            baseline: FormatBaseline::Policy,
            template_run_styles: None,
        }
    }

    pub fn with_baseline(mut self, baseline: FormatBaseline) -> Self {
        self.baseline = baseline;
        self
    }

    pub fn with_template_run_styles(
        mut self,
        styles: &'a BTreeMap<String, RunStyleSnapshot>,
    ) -> Self {
        self.template_run_styles = Some(styles);
        self
    }

    pub fn validate(&self, document: &Document) -> FormatReport {
        let mut issues = Vec::new();

        let forbid_tables = self.policy.forbid_tables;
        if forbid_tables && document.has_tables() {
            issues.push(table_forbidden_issue(document.tables.len()));
        }

        for ctx in document.paragraph_contexts(!forbid_tables) {
            self.validate_paragraph(&ctx, &mut issues);
        }

        let report = FormatReport::from_issues(issues);
        debug!(
            baseline = %self.baseline,
            issues = report.issues.len(),
            errors = report.error_count,
            "Validated document format"
        );
        report
    }

    fn validate_paragraph(&self, ctx: &ParagraphRunContext<'_>, issues: &mut Vec<FormatIssue>) {
        let policy = self.policy;
        let paragraph = ctx.paragraph;
        let path = ctx.paragraph_path.as_str();

        if policy.forbid_numpr && paragraph.has_direct_numbering() {
            issues.push(numbering_issue(path).fixable());
        }

        if let Some(actual) = paragraph.line_spacing_twips() {
            let expected = policy.line_spacing_twips;
            if !policy.within_tolerance(actual, expected) {
                issues.push(
                    FormatIssue::new(
                        IssueCode::LineSpacingMismatch,
                        format!("Line spacing twips mismatch: expected {expected}, got {actual}."),
                        path,
                    )
                    .with_expected(expected)
                    .with_actual(actual)
                    .with_tolerance(policy.twips_tolerance),
                );
            }
        }

        if let (Some(expected), Some(actual)) = (
            policy.first_line_indent_twips,
            paragraph.first_line_indent_twips(),
        ) {
            if !policy.within_tolerance(actual, expected) {
                issues.push(
                    FormatIssue::new(
                        IssueCode::FirstLineIndentMismatch,
                        format!(
                            "First-line indent twips mismatch: expected {expected}, got {actual}."
                        ),
                        path,
                    )
                    .with_expected(expected)
                    .with_actual(actual)
                    .with_tolerance(policy.twips_tolerance),
                );
            }
        }

        if policy.trim_leading_spaces && has_leading_trim_char(paragraph, policy) {
            issues.push(
                FormatIssue::new(
                    IssueCode::LeadingWhitespace,
                    "Paragraph has trim-target leading whitespace.",
                    path,
                )
                .fixable(),
            );
        }

        for (run_id, run) in ctx.run_ids.iter().zip(&paragraph.runs) {
            if !self.touched_runs.contains(run_id) {
                continue;
            }
            let snapshot = self.template_run_styles.and_then(|styles| styles.get(run_id));
            issues.extend(self.font_issue(path, run_id, run, snapshot));
            issues.extend(self.size_issue(path, run_id, run, snapshot));
        }
    }

    fn font_issue(
        &self,
        path: &str,
        run_id: &str,
        run: &Run,
        snapshot: Option<&RunStyleSnapshot>,
    ) -> Option<FormatIssue> {
        let latin = run.props.font_latin.as_deref();
        let east_asia = run.props.font_east_asia.as_deref();
        let actual = json!({ "latin": latin, "east_asia": east_asia });

        match self.baseline {
            FormatBaseline::Template => {
                let expected_latin = snapshot.and_then(|s| s.latin_font.as_deref());
                let expected_east_asia = snapshot.and_then(|s| s.east_asia_font.as_deref());
                let Comparison::Mismatch(severity, observability) = compare_fonts_to_template(
                    [(expected_latin, latin), (expected_east_asia, east_asia)],
                ) else {
                    return None;
                };
                let expected = json!({ "latin": expected_latin, "east_asia": expected_east_asia });
                Some(
                    FormatIssue::new(
                        IssueCode::RunFontMismatch,
                        format!(
                            "Touched run font mismatch against template snapshot: \
                             expected latin={expected_latin:?}, eastAsia={expected_east_asia:?}; \
                             got latin={latin:?}, eastAsia={east_asia:?}."
                        ),
                        path,
                    )
                    .with_run(run_id)
                    .fixable()
                    .with_expected(expected.clone())
                    .with_actual(actual.clone())
                    .with_template_value(expected)
                    .with_rendered_value(actual)
                    .with_context("baseline", "template")
                    .with_grade(severity, observability),
                )
            }
            FormatBaseline::Policy => {
                let policy = self.policy;
                let Comparison::Mismatch(severity, observability) = compare_fonts_to_policy(
                    [
                        (policy.run_font_latin.as_str(), latin),
                        (policy.run_font_east_asia.as_str(), east_asia),
                    ],
                    policy.treat_inherited_as_error,
                ) else {
                    return None;
                };
                Some(
                    FormatIssue::new(
                        IssueCode::RunFontMismatch,
                        format!(
                            "Touched run font mismatch against policy: \
                             expected latin={:?}, eastAsia={:?}; got latin={latin:?}, eastAsia={east_asia:?}.",
                            policy.run_font_latin, policy.run_font_east_asia
                        ),
                        path,
                    )
                    .with_run(run_id)
                    .fixable()
                    .with_expected(json!({
                        "latin": policy.run_font_latin,
                        "east_asia": policy.run_font_east_asia,
                    }))
                    .with_actual(actual.clone())
                    .with_rendered_value(actual)
                    .with_context("baseline", "policy")
                    .with_grade(severity, observability),
                )
            }
        }
    }

    fn size_issue(
        &self,
        path: &str,
        run_id: &str,
        run: &Run,
        snapshot: Option<&RunStyleSnapshot>,
    ) -> Option<FormatIssue> {
        let actual = run.size_pt();

        match self.baseline {
            FormatBaseline::Template => {
                let expected = snapshot.and_then(|s| s.size_pt);
                let Comparison::Mismatch(severity, observability) =
                    compare_to_template(expected, actual)
                else {
                    return None;
                };
                Some(
                    FormatIssue::new(
                        IssueCode::RunSizeMismatch,
                        format!(
                            "Touched run size mismatch against template snapshot: \
                             expected {}pt, got {}pt.",
                            display_size(expected),
                            display_size(actual)
                        ),
                        path,
                    )
                    .with_run(run_id)
                    .fixable()
                    .with_expected(expected)
                    .with_actual(actual)
                    .with_template_value(expected)
                    .with_rendered_value(actual)
                    .with_context("baseline", "template")
                    .with_grade(severity, observability),
                )
            }
            FormatBaseline::Policy => {
                let expected = self.policy.run_size_pt as i32;
                let Comparison::Mismatch(severity, observability) = compare_to_policy(
                    expected,
                    actual,
                    self.policy.treat_inherited_as_error,
                ) else {
                    return None;
                };
                Some(
                    FormatIssue::new(
                        IssueCode::RunSizeMismatch,
                        format!(
                            "Touched run size mismatch against policy: expected {expected}pt, got {}pt.",
                            display_size(actual)
                        ),
                        path,
                    )
                    .with_run(run_id)
                    .fixable()
                    .with_expected(expected)
                    .with_actual(actual)
                    .with_rendered_value(actual)
                    .with_context("baseline", "policy")
                    .with_grade(severity, observability),
                )
            }
        }
    }
}

/// Single document-level issue; table paragraphs are not checked further
pub(crate) fn table_forbidden_issue(table_count: usize) -> FormatIssue {
    FormatIssue::new(IssueCode::TableForbidden, "Tables are forbidden by policy.", "t0")
        .with_context("table_count", table_count)
}

pub(crate) fn numbering_issue(path: &str) -> FormatIssue {
    FormatIssue::new(
        IssueCode::NumprPresent,
        "Direct paragraph numbering (pPr.numPr) is present.",
        path,
    )
}

fn display_size(size: Option<i32>) -> String {
    size.map(|s| s.to_string()).unwrap_or_else(|| "none".to_string())
}

/// First non-empty run text starts with a trim character
fn has_leading_trim_char(paragraph: &Paragraph, policy: &FormatPolicy) -> bool {
    paragraph
        .runs
        .iter()
        .find(|run| !run.text.is_empty())
        .and_then(|run| run.text.chars().next())
        .is_some_and(|c| policy.is_trim_char(c))
}

/// Template snapshot comparison for one scalar value
pub fn compare_to_template<T: PartialEq>(expected: Option<T>, actual: Option<T>) -> Comparison {
    match (expected, actual) {
        (None, None) => Comparison::Match,
        (None, Some(_)) => Comparison::Mismatch(Severity::Error, Observability::Observed),
        (Some(_), None) => Comparison::Mismatch(Severity::Warn, Observability::Unknown),
        (Some(e), Some(a)) if e != a => {
            Comparison::Mismatch(Severity::Error, Observability::Observed)
        }
        (Some(_), Some(_)) => Comparison::Match,
    }
}

/// Template snapshot comparison over (latin, east-asian) pairs; any error outranks a warning
pub fn compare_fonts_to_template(pairs: [(Option<&str>, Option<&str>); 2]) -> Comparison {
    let results = pairs.map(|(expected, actual)| compare_to_template(expected, actual));
    let is = |severity: Severity| {
        results
            .iter()
            .any(|r| matches!(r, Comparison::Mismatch(s, _) if *s == severity))
    };
    if is(Severity::Error) {
        Comparison::Mismatch(Severity::Error, Observability::Observed)
    } else if is(Severity::Warn) {
        Comparison::Mismatch(Severity::Warn, Observability::Unknown)
    } else {
        Comparison::Match
    }
}

/// Policy comparison for one scalar value; absent values are inherited and unknown
pub fn compare_to_policy<T: PartialEq>(
    expected: T,
    actual: Option<T>,
    treat_inherited_as_error: bool,
) -> Comparison {
    match actual {
        None if treat_inherited_as_error => {
            Comparison::Mismatch(Severity::Error, Observability::Unknown)
        }
        None => Comparison::Mismatch(Severity::Warn, Observability::Unknown),
        Some(a) if a != expected => Comparison::Mismatch(Severity::Error, Observability::Observed),
        Some(_) => Comparison::Match,
    }
}

/// Policy comparison over (latin, east-asian) pairs.
///
/// A real mismatch is an observed error. Inherited values alone yield an
/// unknown error (when treated as errors) or an unknown warning.
pub fn compare_fonts_to_policy(
    pairs: [(&str, Option<&str>); 2],
    treat_inherited_as_error: bool,
) -> Comparison {
    let mut has_error = false;
    let mut has_warn = false;
    let mut unknown = false;

    for (expected, actual) in pairs {
        match actual {
            None => {
                unknown = true;
                if treat_inherited_as_error {
                    has_error = true;
                } else {
                    has_warn = true;
                }
            }
            Some(actual) if actual != expected => has_error = true,
            Some(_) => {}
        }
    }

    if has_error {
        if unknown && !has_warn {
            return Comparison::Mismatch(Severity::Error, Observability::Unknown);
        }
        return Comparison::Mismatch(Severity::Error, Observability::Observed);
    }
    if has_warn {
        return Comparison::Mismatch(Severity::Warn, Observability::Unknown);
    }
    Comparison::Match
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{LineRule, Table};

    fn policy() -> FormatPolicy {
        let mut policy = FormatPolicy::builtin().unwrap();
        policy.forbid_tables = false;
        policy.first_line_indent_twips = Some(420);
        policy.twips_tolerance = 20;
        policy
    }

    fn touched(ids: &[&str]) -> BTreeSet<String> {
        ids.iter().map(|s| s.to_string()).collect()
    }

    fn doc_with(paragraph: Paragraph) -> Document {
        let mut doc = Document::new();
        doc.add_paragraph(paragraph);
        doc
    }

    #[test]
    fn test_indent_mismatch_carries_expected_actual_tolerance() {
        let doc = doc_with(Paragraph::new("text").with_first_line_indent(480));
        let none = touched(&[]);
        let report = FormatValidator::new(&policy(), &none).validate(&doc);

        assert!(!report.passed);
        let issue = report
            .issues_with_code(IssueCode::FirstLineIndentMismatch)
            .next()
            .unwrap();
        assert_eq!(issue.expected, Some(json!(420)));
        assert_eq!(issue.actual, Some(json!(480)));
        assert_eq!(issue.tolerance, Some(20));
        assert!(!issue.fixable);
    }

    #[test]
    fn test_indent_check_disabled_without_target() {
        let mut policy = policy();
        policy.first_line_indent_twips = None;
        let doc = doc_with(Paragraph::new("text").with_first_line_indent(999));
        let none = touched(&[]);
        assert!(FormatValidator::new(&policy, &none).validate(&doc).passed);
    }

    #[test]
    fn test_auto_spacing_is_not_checked() {
        let doc = doc_with(Paragraph::new("text").with_line_spacing(100, LineRule::Auto));
        let none = touched(&[]);
        assert!(FormatValidator::new(&policy(), &none).validate(&doc).passed);

        let doc = doc_with(Paragraph::new("text").with_line_spacing(100, LineRule::Exact));
        let report = FormatValidator::new(&policy(), &none).validate(&doc);
        assert!(report.has_code(IssueCode::LineSpacingMismatch));
    }

    #[test]
    fn test_forbidden_tables_emit_one_issue_and_skip_cells() {
        let mut policy = policy();
        policy.forbid_tables = true;
        let mut doc = Document::new();
        doc.add_table(Table::with_shape(1, 1));
        doc.add_table(Table::with_shape(1, 1))
            .cell_mut(0, 0)
            .unwrap()
            .paragraphs[0] = Paragraph::new(" x").with_numbering(1, 0);

        let none = touched(&[]);
        let report = FormatValidator::new(&policy, &none).validate(&doc);
        assert_eq!(report.issues.len(), 1);
        let issue = &report.issues[0];
        assert_eq!(issue.code, IssueCode::TableForbidden);
        assert!(!issue.fixable);
        assert_eq!(issue.context.get("table_count"), Some(&json!(2)));
    }

    #[test]
    fn test_numbering_and_leading_whitespace_are_fixable() {
        let doc = doc_with(
            Paragraph::from_runs([Run::new(""), Run::new("\u{3000}Hello")]).with_numbering(3, 0),
        );
        let none = touched(&[]);
        let report = FormatValidator::new(&policy(), &none).validate(&doc);
        assert!(report.has_code(IssueCode::NumprPresent));
        assert!(report.has_code(IssueCode::LeadingWhitespace));
        assert!(report.issues.iter().all(|i| i.fixable));
        assert_eq!(report.error_count, 2);
    }

    #[test]
    fn test_run_checks_only_for_touched_runs() {
        let doc = doc_with(Paragraph::from_runs([
            Run::new("a").with_fonts("Wrong", "Wrong").with_size_pt(9),
            Run::new("b").with_fonts("Wrong", "Wrong").with_size_pt(9),
        ]));
        let ids = touched(&["p0:r1"]);
        let report = FormatValidator::new(&policy(), &ids).validate(&doc);
        assert_eq!(report.issues.len(), 2);
        assert!(report
            .issues
            .iter()
            .all(|i| i.run_id.as_deref() == Some("p0:r1")));
    }

    #[test]
    fn test_policy_baseline_inherited_values_warn() {
        let doc = doc_with(Paragraph::new("plain"));
        let ids = touched(&["p0:r0"]);
        let report = FormatValidator::new(&policy(), &ids).validate(&doc);

        assert!(report.passed);
        assert_eq!(report.issues.len(), 2);
        for issue in &report.issues {
            assert_eq!(issue.severity, Severity::Warn);
            assert_eq!(issue.observability, Observability::Unknown);
        }
    }

    #[test]
    fn test_policy_baseline_inherited_as_error() {
        let mut policy = policy();
        policy.treat_inherited_as_error = true;
        let doc = doc_with(Paragraph::new("plain"));
        let ids = touched(&["p0:r0"]);
        let report = FormatValidator::new(&policy, &ids).validate(&doc);

        assert_eq!(report.error_count, 2);
        assert!(report
            .issues
            .iter()
            .all(|i| i.observability == Observability::Unknown));
    }

    #[test]
    fn test_template_baseline_compares_to_snapshot() {
        let doc = doc_with(Paragraph::from_runs([
            Run::new("a").with_fonts("SimSun", "SimSun").with_size_pt(12),
        ]));
        let ids = touched(&["p0:r0"]);
        let mut styles = BTreeMap::new();
        styles.insert(
            "p0:r0".to_string(),
            RunStyleSnapshot {
                latin_font: Some("SimSun".into()),
                east_asia_font: Some("SimSun".into()),
                size_pt: Some(12),
            },
        );

        let report = FormatValidator::new(&policy(), &ids)
            .with_baseline(FormatBaseline::Template)
            .with_template_run_styles(&styles)
            .validate(&doc);
        assert!(report.issues.is_empty());

        styles.get_mut("p0:r0").unwrap().size_pt = Some(14);
        let report = FormatValidator::new(&policy(), &ids)
            .with_baseline(FormatBaseline::Template)
            .with_template_run_styles(&styles)
            .validate(&doc);
        let issue = report.issues_with_code(IssueCode::RunSizeMismatch).next().unwrap();
        assert_eq!(issue.severity, Severity::Error);
        assert_eq!(issue.template_value, Some(json!(14)));
        assert_eq!(issue.rendered_value, Some(json!(12)));
        assert_eq!(issue.context.get("baseline"), Some(&json!("template")));
    }

    #[test]
    fn test_template_baseline_without_snapshot_values() {
        let doc = doc_with(Paragraph::new("inherited"));
        let ids = touched(&["p0:r0"]);
        let report = FormatValidator::new(&policy(), &ids)
            .with_baseline(FormatBaseline::Template)
            .validate(&doc);
        assert!(report.issues.is_empty());
    }

    #[test]
    fn test_compare_to_template_matrix() {
        assert_eq!(compare_to_template::<i32>(None, None), Comparison::Match);
        assert_eq!(
            compare_to_template(None, Some(12)),
            Comparison::Mismatch(Severity::Error, Observability::Observed)
        );
        assert_eq!(
            compare_to_template(Some(12), None),
            Comparison::Mismatch(Severity::Warn, Observability::Unknown)
        );
        assert_eq!(
            compare_to_template(Some(12), Some(14)),
            Comparison::Mismatch(Severity::Error, Observability::Observed)
        );
    }

    #[test]
    fn test_compare_fonts_to_policy_grades() {
        assert_eq!(
            compare_fonts_to_policy([("A", Some("A")), ("B", Some("B"))], false),
            Comparison::Match
        );
        assert_eq!(
            compare_fonts_to_policy([("A", Some("X")), ("B", None)], false),
            Comparison::Mismatch(Severity::Error, Observability::Observed)
        );
        assert_eq!(
            compare_fonts_to_policy([("A", None), ("B", None)], true),
            Comparison::Mismatch(Severity::Error, Observability::Unknown)
        );
        assert_eq!(
            compare_fonts_to_policy([("A", Some("A")), ("B", None)], false),
            Comparison::Mismatch(Severity::Warn, Observability::Unknown)
        );
    }

    // ============================================================
    // Property tests
    // ============================================================

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn indent_within_tolerance_never_flags(
                expected in 200i32..2000,
                tolerance in 0i32..200,
                offset in -200i32..=200,
            ) {
                prop_assume!(offset.abs() <= tolerance);
                let mut policy = policy();
                policy.first_line_indent_twips = Some(expected);
                policy.twips_tolerance = tolerance;
                let doc = doc_with(
                    Paragraph::new("x").with_first_line_indent(expected + offset),
                );
                let none = touched(&[]);
                let report = FormatValidator::new(&policy, &none).validate(&doc);
                prop_assert!(!report.has_code(IssueCode::FirstLineIndentMismatch));
            }

            #[test]
            fn indent_one_past_tolerance_always_flags(
                expected in 200i32..2000,
                tolerance in 0i32..200,
                above in any::<bool>(),
            ) {
                let mut policy = policy();
                policy.first_line_indent_twips = Some(expected);
                policy.twips_tolerance = tolerance;
                let actual = if above { expected + tolerance + 1 } else { expected - tolerance - 1 };
                let doc = doc_with(Paragraph::new("x").with_first_line_indent(actual));
                let none = touched(&[]);
                let report = FormatValidator::new(&policy, &none).validate(&doc);
                prop_assert!(report.has_code(IssueCode::FirstLineIndentMismatch));
            }

            #[test]
            fn spacing_tolerance_boundary(
                expected in 100i32..1000,
                tolerance in 0i32..100,
            ) {
                let mut policy = policy();
                policy.line_spacing_twips = expected;
                policy.twips_tolerance = tolerance;
                let none = touched(&[]);

                let at_edge = doc_with(
                    Paragraph::new("x").with_line_spacing(expected + tolerance, LineRule::Exact),
                );
                prop_assert!(FormatValidator::new(&policy, &none).validate(&at_edge).passed);

                let past_edge = doc_with(
                    Paragraph::new("x").with_line_spacing(expected + tolerance + 1, LineRule::Exact),
                );
                let report = FormatValidator::new(&policy, &none).validate(&past_edge);
                prop_assert!(report.has_code(IssueCode::LineSpacingMismatch));
            }
        }
    }
}
