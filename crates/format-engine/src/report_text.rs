//! One-screen human-readable rendering of a format report

use std::collections::BTreeMap;

use crate::models::{FormatBaseline, FormatIssue, FormatMode, FormatReport, Severity};
use crate::observed::dominant_key;

const TOP_CODES: usize = 5;
const SHOWN_CHANGES: usize = 3;

fn count_codes<'a>(issues: impl Iterator<Item = &'a FormatIssue>) -> Vec<(&'static str, usize)> {
    let mut counts: BTreeMap<&'static str, usize> = BTreeMap::new();
    for issue in issues {
        *counts.entry(issue.code.as_str()).or_insert(0) += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|(a_code, a_count), (b_code, b_count)| {
        b_count.cmp(a_count).then(a_code.cmp(b_code))
    });
    counts.truncate(TOP_CODES);
    counts
}

fn counts_line(label: &str, counts: &[(&str, usize)]) -> String {
    if counts.is_empty() {
        return format!("{label}: none");
    }
    let joined = counts
        .iter()
        .map(|(code, count)| format!("{code}={count}"))
        .collect::<Vec<_>>()
        .join(", ");
    format!("{label}: {joined}")
}

fn suggestion(
    has_errors: bool,
    has_warnings: bool,
    mode: FormatMode,
    baseline: FormatBaseline,
) -> &'static str {
    match (has_errors, has_warnings) {
        (false, false) => "none",
        (true, _) if mode != FormatMode::Strict => {
            "error-level issues detected; use the strict preset to gate on them"
        }
        (true, _) => {
            "strict mode failed on error-level issues; try the template preset or adjust the policy"
        }
        (false, true) if baseline != FormatBaseline::Template => {
            "warn-only issues detected; output is usable. Try the template baseline"
        }
        (false, true) => "warn-only issues detected; output is usable. Try the template preset",
    }
}

impl FormatReport {
    /// Generate a text summary
    pub fn to_text(&self) -> String {
        let Some(summary) = &self.summary else {
            return "format summary unavailable".to_string();
        };

        let mut lines = vec![
            "format_summary:".to_string(),
            format!(
                "format_mode={} format_fix_mode={} format_baseline={}",
                summary.mode, summary.fix_mode, summary.baseline
            ),
            format!("result={}", if self.passed { "PASSED" } else { "FAILED" }),
        ];

        if summary.skipped || summary.mode == FormatMode::Off {
            lines.push("format skipped: only replacement performed".to_string());
            lines.push("suggestion: none".to_string());
            return lines.join("\n");
        }

        lines.push(format!(
            "observed: has_tables {}->{}",
            summary.template_observed.has_tables, summary.rendered_observed.has_tables
        ));
        lines.push(format!(
            "dominant_indent: {}->{}",
            dominant_key(&summary.template_observed.first_line_indent_twips_hist).unwrap_or("none"),
            dominant_key(&summary.rendered_observed.first_line_indent_twips_hist).unwrap_or("none"),
        ));

        let errors = count_codes(self.issues.iter().filter(|i| i.is_blocking()));
        let warnings = count_codes(
            self.issues
                .iter()
                .filter(|i| !i.fixed && i.severity == Severity::Warn),
        );
        lines.push(counts_line("issues", &count_codes(self.issues.iter())));
        lines.push(counts_line("errors", &errors));
        lines.push(counts_line("warnings", &warnings));

        if summary.fix_applied && !summary.fix_changes.is_empty() {
            lines.push(format!("fix: applied {} changes", summary.fix_changes.len()));
            for change in summary.fix_changes.iter().take(SHOWN_CHANGES) {
                lines.push(format!(
                    "fix_change: {} {} {}->{}",
                    change.paragraph_path,
                    change.field,
                    change
                        .before
                        .map(|v| v.to_string())
                        .unwrap_or_else(|| "none".to_string()),
                    change.after
                ));
            }
        } else {
            lines.push("fix: none".to_string());
        }

        lines.push(format!(
            "suggestion: {}",
            suggestion(
                !errors.is_empty(),
                !warnings.is_empty(),
                summary.mode,
                summary.baseline
            )
        ));
        lines.join("\n")
    }
}
