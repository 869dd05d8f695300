//! Placeholder parser
//!
//! Each visited paragraph's runs are concatenated; tokens are matched on the
//! paragraph text and mapped back to runs. Only `【FIELD_NAME】` tokens held by
//! a single run are supported. Header and footer paragraphs are never visited.

use lazy_static::lazy_static;
use regex::Regex;
use shared_types::{run_id, Document, Paragraph};
use tracing::debug;

use crate::errors::TemplateError;
use crate::models::{Occurrence, ParseResult, UnsupportedKind, UnsupportedOccurrence};

pub const OPEN_BRACKET: char = '【';
pub const CLOSE_BRACKET: char = '】';

lazy_static! {
    static ref VALID_PLACEHOLDER: Regex = Regex::new(r"【([A-Z0-9_]+)】").unwrap();
    static ref BRACKETED: Regex = Regex::new(r"【([^】]*)】").unwrap();
    static ref FIELD_NAME: Regex = Regex::new(r"^[A-Z0-9_]+$").unwrap();
}

/// True when `name` is a valid placeholder field name
pub fn is_valid_field_name(name: &str) -> bool {
    FIELD_NAME.is_match(name)
}

/// Parse placeholders from body paragraphs and table cells.
///
/// With `strict`, any unsupported item is an error; the error still carries
/// the full result.
pub fn parse_placeholders(document: &Document, strict: bool) -> Result<ParseResult, TemplateError> {
    let result = scan(document);
    debug!(
        fields = result.fields.len(),
        occurrences = result.occurrences.len(),
        unsupported = result.unsupported.len(),
        "Parsed template placeholders"
    );

    if strict && result.has_unsupported() {
        return Err(TemplateError::Unsupported {
            result: Box::new(result),
        });
    }
    Ok(result)
}

/// Non-failing scan used by the renderer and fingerprint
pub(crate) fn scan(document: &Document) -> ParseResult {
    let mut result = ParseResult::default();
    for ctx in document.paragraph_contexts(true) {
        scan_paragraph(ctx.paragraph, &ctx.paragraph_path, &mut result);
    }
    result
}

/// Byte spans of each run within the paragraph text
pub(crate) struct RunSpans {
    text: String,
    spans: Vec<(usize, usize)>,
}

impl RunSpans {
    pub(crate) fn of(paragraph: &Paragraph) -> Self {
        let mut text = String::new();
        let mut spans = Vec::with_capacity(paragraph.runs.len());
        for run in &paragraph.runs {
            let start = text.len();
            text.push_str(&run.text);
            spans.push((start, text.len()));
        }
        Self { text, spans }
    }

    pub(crate) fn text(&self) -> &str {
        &self.text
    }

    /// Paragraph offset where run `index` begins
    pub(crate) fn run_start(&self, index: usize) -> Option<usize> {
        self.spans.get(index).map(|(start, _)| *start)
    }

    /// Index of the run holding byte `position`
    fn run_at(&self, position: usize) -> Option<usize> {
        self.spans
            .iter()
            .position(|(start, end)| *start <= position && position < *end)
    }
}

fn scan_paragraph(paragraph: &Paragraph, path: &str, result: &mut ParseResult) {
    let spans = RunSpans::of(paragraph);
    let text = spans.text();
    if text.is_empty() {
        return;
    }
    let run_id_at = |position: usize| spans.run_at(position).map(|index| run_id::run_id(path, index));

    for caps in VALID_PLACEHOLDER.captures_iter(text) {
        let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let start_run = spans.run_at(token.start());
        let end_run = spans.run_at(token.end() - 1);

        match (start_run, end_run) {
            (Some(first), Some(last)) if first == last => {
                let run_start = spans.run_start(first).unwrap_or(0);
                let field_name = name.as_str().to_string();
                if !result.fields.contains(&field_name) {
                    result.fields.push(field_name.clone());
                }
                result.occurrences.push(Occurrence {
                    field_name,
                    run_id: run_id::run_id(path, first),
                    start: token.start() - run_start,
                    end: token.end() - run_start,
                });
            }
            _ => result.unsupported.push(UnsupportedOccurrence {
                kind: UnsupportedKind::CrossRun,
                text: token.as_str().to_string(),
                run_id: run_id_at(token.start()),
                start: Some(token.start()),
                end: Some(token.end()),
            }),
        }
    }

    for caps in BRACKETED.captures_iter(text) {
        let (Some(token), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        if is_valid_field_name(inner.as_str()) {
            continue;
        }
        result.unsupported.push(UnsupportedOccurrence {
            kind: UnsupportedKind::InvalidFormat,
            text: token.as_str().to_string(),
            run_id: run_id_at(token.start()),
            start: Some(token.start()),
            end: Some(token.end()),
        });
    }

    for (kind, start, end) in unbalanced_brackets(text) {
        result.unsupported.push(UnsupportedOccurrence {
            kind,
            text: text[start..end].to_string(),
            run_id: run_id_at(start),
            start: Some(start),
            end: Some(end),
        });
    }
}

/// Single left-to-right bracket-stack pass.
///
/// Stray closes are reported in order, then every still-open bracket as a
/// span running to the end of the text.
fn unbalanced_brackets(text: &str) -> Vec<(UnsupportedKind, usize, usize)> {
    let mut found = Vec::new();
    let mut open = Vec::new();

    for (index, c) in text.char_indices() {
        if c == OPEN_BRACKET {
            open.push(index);
        } else if c == CLOSE_BRACKET && open.pop().is_none() {
            found.push((UnsupportedKind::StrayClose, index, index + c.len_utf8()));
        }
    }

    found.extend(
        open.into_iter()
            .map(|start| (UnsupportedKind::UnclosedBracket, start, text.len())),
    );
    found
}
