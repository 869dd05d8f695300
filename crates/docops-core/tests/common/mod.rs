//! Shared document builders for pipeline tests

#![allow(dead_code)]

use docops_core::{Document, FormatPolicy};
use shared_types::{Paragraph, Run};

pub const POLICY_LATIN: &str = "BUSINESS_DEFAULT_LATIN";
pub const POLICY_EAST_ASIA: &str = "BUSINESS_DEFAULT_EAST_ASIA";

pub fn policy() -> FormatPolicy {
    FormatPolicy::builtin().expect("built-in policy parses")
}

/// Single-paragraph document from run texts
pub fn doc_of(runs: &[&str]) -> Document {
    let mut doc = Document::new();
    doc.add_paragraph(Paragraph::from_runs(runs.iter().map(|t| Run::new(*t))));
    doc
}

/// A run already styled the way the built-in policy wants
pub fn policy_run(text: &str) -> Run {
    Run::new(text)
        .with_fonts(POLICY_LATIN, POLICY_EAST_ASIA)
        .with_size_pt(12)
}
