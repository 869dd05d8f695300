//! Template fingerprint
//!
//! A SHA-256 over a canonical JSON payload of the template's visible body and
//! table text plus its placeholder layout. Run indices never enter the
//! payload, so re-segmenting unchanged text keeps the fingerprint stable.

use std::collections::BTreeMap;

use lazy_static::lazy_static;
use regex::Regex;
use serde::Serialize;
use sha2::{Digest, Sha256};
use shared_types::{run_id, Document};

use crate::parser::{self, RunSpans};

lazy_static! {
    static ref HORIZONTAL_SPACE: Regex = Regex::new(r"[ \t]+").unwrap();
}

#[derive(Serialize)]
struct CanonicalParagraph {
    paragraph_path: String,
    text: String,
}

#[derive(Serialize, PartialEq, Eq, PartialOrd, Ord)]
struct CanonicalOccurrence {
    paragraph_path: String,
    start: usize,
    end: usize,
    field_name: String,
}

#[derive(Serialize, PartialEq, Eq, PartialOrd, Ord)]
struct CanonicalUnsupported {
    paragraph_path: String,
    start: Option<usize>,
    end: Option<usize>,
    kind: String,
    text: String,
}

#[derive(Serialize)]
struct CanonicalTemplate {
    paragraphs: Vec<CanonicalParagraph>,
    occurrences: Vec<CanonicalOccurrence>,
    unsupported: Vec<CanonicalUnsupported>,
}

/// Newlines unified, horizontal whitespace collapsed, ends trimmed
fn normalize_text(text: &str) -> String {
    let unified = text.replace("\r\n", "\n").replace('\r', "\n");
    HORIZONTAL_SPACE
        .replace_all(&unified, " ")
        .trim()
        .to_string()
}

/// Deterministic 64-character hex fingerprint of `document`'s template layout
pub fn compute_template_fingerprint(document: &Document) -> String {
    let mut paragraphs = Vec::new();
    let mut spans: BTreeMap<String, RunSpans> = BTreeMap::new();
    for ctx in document.paragraph_contexts(true) {
        let run_spans = RunSpans::of(ctx.paragraph);
        paragraphs.push(CanonicalParagraph {
            paragraph_path: ctx.paragraph_path.clone(),
            text: normalize_text(run_spans.text()),
        });
        spans.insert(ctx.paragraph_path, run_spans);
    }
    paragraphs.sort_by(|a, b| a.paragraph_path.cmp(&b.paragraph_path));

    let result = parser::scan(document);

    let mut occurrences: Vec<CanonicalOccurrence> = result
        .occurrences
        .into_iter()
        .filter_map(|occurrence| {
            let (path, index) = run_id::split(&occurrence.run_id)?;
            let offset = spans.get(path)?.run_start(index)?;
            Some(CanonicalOccurrence {
                paragraph_path: path.to_string(),
                start: occurrence.start + offset,
                end: occurrence.end + offset,
                field_name: occurrence.field_name,
            })
        })
        .collect();
    occurrences.sort();

    let mut unsupported: Vec<CanonicalUnsupported> = result
        .unsupported
        .into_iter()
        .map(|item| CanonicalUnsupported {
            paragraph_path: item
                .run_id
                .as_deref()
                .map(|id| run_id::paragraph_path(id).to_string())
                .unwrap_or_default(),
            start: item.start,
            end: item.end,
            kind: item.kind.as_str().to_string(),
            text: normalize_text(&item.text),
        })
        .collect();
    unsupported.sort();

    let payload = CanonicalTemplate {
        paragraphs,
        occurrences,
        unsupported,
    };
    // Going through Value sorts object keys.
    let canonical = serde_json::to_value(&payload)
        .expect("canonical payload has only string keys and integer or string values")
        .to_string();

    hex::encode(Sha256::digest(canonical.as_bytes()))
}
