//! Direct fixer: policy-bounded corrections on numbering, leading whitespace
//! and touched runs. Tables are never entered while they are forbidden.

use std::collections::BTreeSet;

use shared_types::{Document, Paragraph, ParagraphRunContextMut};
use tracing::debug;

use crate::models::{FormatBaseline, FormatIssue, FormatReport, IssueCode};
use crate::policy::FormatPolicy;
use crate::validator::{numbering_issue, table_forbidden_issue};

/// Apply fixable corrections in place and report what was done.
///
/// Touched-run fonts and sizes are forced to policy values only under the
/// policy baseline; under the template baseline the renderer already kept
/// each run's original formatting.
pub fn fix_document(
    document: &mut Document,
    policy: &FormatPolicy,
    touched_runs: &BTreeSet<String>,
    baseline: FormatBaseline,
) -> FormatReport {
    let mut issues = Vec::new();

    if policy.forbid_tables && document.has_tables() {
        issues.push(table_forbidden_issue(document.tables.len()));
    }

    for mut ctx in document.paragraph_contexts_mut(!policy.forbid_tables) {
        fix_paragraph(&mut ctx, policy, touched_runs, baseline, &mut issues);
    }

    let report = FormatReport::from_issues(issues);
    debug!(fixed = report.fixed_count, baseline = %baseline, "Applied direct format fixes");
    report
}

fn fix_paragraph(
    ctx: &mut ParagraphRunContextMut<'_>,
    policy: &FormatPolicy,
    touched_runs: &BTreeSet<String>,
    baseline: FormatBaseline,
    issues: &mut Vec<FormatIssue>,
) {
    let path = ctx.paragraph_path.as_str();

    if policy.forbid_numpr && ctx.paragraph.has_direct_numbering() {
        let mut issue = numbering_issue(path).fixable();
        issue.fixed = ctx.paragraph.remove_direct_numbering();
        issues.push(issue);
    }

    if policy.trim_leading_spaces && trim_leading(ctx.paragraph, policy) {
        issues.push(
            FormatIssue::new(
                IssueCode::LeadingWhitespace,
                "Paragraph leading whitespace trimmed.",
                path,
            )
            .resolved(),
        );
    }

    if baseline != FormatBaseline::Policy {
        return;
    }

    let expected_size = policy.run_size_pt as i32;
    for (run_id, run) in ctx.run_ids.iter().zip(ctx.paragraph.runs.iter_mut()) {
        if !touched_runs.contains(run_id) {
            continue;
        }

        let needs_font_fix = run.props.font_latin.as_deref() != Some(policy.run_font_latin.as_str())
            || run.props.font_east_asia.as_deref() != Some(policy.run_font_east_asia.as_str());
        let needs_size_fix = run.size_pt() != Some(expected_size);

        if needs_font_fix || needs_size_fix {
            run.set_fonts_and_size(
                &policy.run_font_latin,
                &policy.run_font_east_asia,
                policy.run_size_pt,
            );
        }
        if needs_font_fix {
            issues.push(
                FormatIssue::new(IssueCode::RunFontMismatch, "Touched run font was corrected.", path)
                    .with_run(run_id)
                    .resolved(),
            );
        }
        if needs_size_fix {
            issues.push(
                FormatIssue::new(IssueCode::RunSizeMismatch, "Touched run size was corrected.", path)
                    .with_run(run_id)
                    .resolved(),
            );
        }
    }
}

/// Strip contiguous trim characters from the start of the paragraph, across runs
fn trim_leading(paragraph: &mut Paragraph, policy: &FormatPolicy) -> bool {
    let mut changed = false;

    for run in paragraph.runs.iter_mut().filter(|run| !run.text.is_empty()) {
        let trimmed = run.text.trim_start_matches(|c| policy.is_trim_char(c));
        if trimmed.len() == run.text.len() {
            break;
        }

        let done = !trimmed.is_empty();
        run.text = trimmed.to_string();
        changed = true;
        if done {
            break;
        }
    }

    changed
}
