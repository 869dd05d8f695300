//! Paragraph-scoped safe fixer
//!
//! Aligns first-line indent and line spacing of touched body paragraphs with
//! the effective policy. Run text, run fonts and table content are left alone.

use std::collections::BTreeSet;

use shared_types::{run_id, Document};
use tracing::debug;

use crate::models::FixChange;
use crate::policy::FormatPolicy;

pub const SAFE_FIX_REASON: &str = "safe_fix_to_effective_policy";

/// Body paragraph paths that own at least one touched run
pub fn touched_body_paragraphs(touched_runs: &BTreeSet<String>) -> BTreeSet<&str> {
    touched_runs
        .iter()
        .map(|id| run_id::paragraph_path(id))
        .filter(|path| run_id::is_body_path(path))
        .collect()
}

pub fn safe_fix_document(
    document: &mut Document,
    policy: &FormatPolicy,
    touched_runs: &BTreeSet<String>,
) -> Vec<FixChange> {
    let mut changes = Vec::new();
    let targets = touched_body_paragraphs(touched_runs);
    if targets.is_empty() {
        return changes;
    }

    for ctx in document.paragraph_contexts_mut(false) {
        if !targets.contains(ctx.paragraph_path.as_str()) {
            continue;
        }
        let paragraph = ctx.paragraph;

        if let Some(after) = policy.first_line_indent_twips {
            let before = paragraph.first_line_indent_twips();
            if before != Some(after) {
                paragraph.set_first_line_indent_twips(after);
                changes.push(FixChange {
                    paragraph_path: ctx.paragraph_path.clone(),
                    field: "first_line_indent_twips".to_string(),
                    before,
                    after,
                    reason: SAFE_FIX_REASON.to_string(),
                });
            }
        }

        let before = paragraph.line_spacing_twips();
        let after = policy.line_spacing_twips;
        if before != Some(after) {
            paragraph.set_line_spacing_twips(after);
            changes.push(FixChange {
                paragraph_path: ctx.paragraph_path.clone(),
                field: "line_spacing_twips".to_string(),
                before,
                after,
                reason: SAFE_FIX_REASON.to_string(),
            });
        }
    }

    debug!(changes = changes.len(), "Applied safe paragraph fixes");
    changes
}
