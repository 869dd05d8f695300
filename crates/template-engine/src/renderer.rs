//! Placeholder renderer
//!
//! Replaces supported occurrences in place, run by run. Within a run,
//! replacements go from the highest start offset down so earlier offsets stay
//! valid. A run's formatting is never changed here; its pre-render style is
//! recorded so the validator can compare against it later.

use std::collections::{BTreeMap, BTreeSet};

use format_engine::{FormatMode, FormatReport, RunStyleSnapshot};
use serde::{Deserialize, Serialize};
use shared_types::{run_id, Document, FieldSet};
use tracing::{info, warn};

use crate::errors::RenderError;
use crate::models::{Occurrence, ParseResult, UnsupportedOccurrence};
use crate::parser;

/// What to do when the template contains unsupported placeholder items
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedMode {
    /// Render nothing and fail
    #[default]
    Error,
    /// Log them and render the supported occurrences
    Warn,
}

impl std::fmt::Display for UnsupportedMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnsupportedMode::Error => write!(f, "error"),
            UnsupportedMode::Warn => write!(f, "warn"),
        }
    }
}

impl std::str::FromStr for UnsupportedMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(UnsupportedMode::Error),
            "warn" => Ok(UnsupportedMode::Warn),
            other => Err(format!("Unknown unsupported mode: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplaceStatus {
    Replaced,
    Missing,
    Unsupported,
}

/// One replaced, missing or unsupported item
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceLogEntry {
    pub status: ReplaceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ReplaceLogEntry {
    fn unsupported(item: &UnsupportedOccurrence) -> Self {
        Self {
            status: ReplaceStatus::Unsupported,
            field_name: None,
            run_id: item.run_id.clone(),
            paragraph_path: item
                .run_id
                .as_deref()
                .map(|id| run_id::paragraph_path(id).to_string()),
            start: item.start,
            end: item.end,
            original_text: Some(item.text.clone()),
            new_text: None,
            reason: Some(item.kind.as_str().to_string()),
        }
    }

    fn for_occurrence(status: ReplaceStatus, occurrence: &Occurrence, original_text: &str) -> Self {
        Self {
            status,
            field_name: Some(occurrence.field_name.clone()),
            run_id: Some(occurrence.run_id.clone()),
            paragraph_path: Some(run_id::paragraph_path(&occurrence.run_id).to_string()),
            start: Some(occurrence.start),
            end: Some(occurrence.end),
            original_text: Some(original_text.to_string()),
            new_text: None,
            reason: None,
        }
    }

    fn missing(occurrence: &Occurrence, original_text: &str) -> Self {
        Self {
            reason: Some("missing_field".to_string()),
            ..Self::for_occurrence(ReplaceStatus::Missing, occurrence, original_text)
        }
    }

    fn replaced(occurrence: &Occurrence, original_text: &str, new_text: &str) -> Self {
        Self {
            new_text: Some(new_text.to_string()),
            ..Self::for_occurrence(ReplaceStatus::Replaced, occurrence, original_text)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceSummary {
    /// Supported occurrences plus unsupported items
    pub total_placeholders: usize,
    pub replaced_count: usize,
    pub missing_count: usize,
    pub had_unsupported: bool,
    pub unsupported_count: usize,
    pub unsupported_mode: UnsupportedMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplaceReport {
    pub entries: Vec<ReplaceLogEntry>,
    pub summary: ReplaceSummary,
    /// Runs that received at least one replacement
    pub touched_runs: BTreeSet<String>,
    /// Pre-render style of every touched run
    #[serde(default)]
    pub template_run_styles: BTreeMap<String, RunStyleSnapshot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingFieldsReport {
    pub missing_required: Vec<String>,
    pub missing_optional: Vec<String>,
}

/// Everything a render produced, including on failure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderOutput {
    pub document: Document,
    pub parse_result: ParseResult,
    pub template_fields: Vec<String>,
    pub replace_report: ReplaceReport,
    pub missing_fields: MissingFieldsReport,
    pub format_report: FormatReport,
    /// Required fields the template never mentions; not counted as missing
    #[serde(default)]
    pub required_not_in_template: Vec<String>,
}

impl RenderOutput {
    /// Strict format mode ran and the report did not pass
    pub fn format_gate_failed(&self) -> bool {
        let strict = self
            .format_report
            .summary
            .as_ref()
            .is_some_and(|summary| summary.mode == FormatMode::Strict);
        strict && !self.format_report.passed
    }

    pub fn rendered_texts(&self) -> Vec<String> {
        self.document.body_texts()
    }
}

/// Missing fields among those the template actually uses
pub fn compute_missing_fields(template_fields: &[String], fields: &FieldSet) -> MissingFieldsReport {
    let mut missing_required = Vec::new();
    let mut missing_optional = Vec::new();

    let unique: BTreeSet<&String> = template_fields.iter().collect();
    for field in unique {
        if fields.field_values.contains_key(field) {
            continue;
        }
        if fields.required_fields.contains(field) {
            missing_required.push(field.clone());
        } else {
            missing_optional.push(field.clone());
        }
    }

    MissingFieldsReport {
        missing_required,
        missing_optional,
    }
}

fn build_report(
    parse_result: &ParseResult,
    entries: Vec<ReplaceLogEntry>,
    touched_runs: BTreeSet<String>,
    template_run_styles: BTreeMap<String, RunStyleSnapshot>,
    unsupported_mode: UnsupportedMode,
) -> ReplaceReport {
    let count = |status: ReplaceStatus| entries.iter().filter(|e| e.status == status).count();
    let unsupported_count = count(ReplaceStatus::Unsupported);
    let summary = ReplaceSummary {
        total_placeholders: parse_result.occurrences.len() + parse_result.unsupported.len(),
        replaced_count: count(ReplaceStatus::Replaced),
        missing_count: count(ReplaceStatus::Missing),
        had_unsupported: unsupported_count > 0,
        unsupported_count,
        unsupported_mode,
    };

    ReplaceReport {
        entries,
        summary,
        touched_runs,
        template_run_styles,
    }
}

/// Replace supported placeholders in `document`.
///
/// In `UnsupportedMode::Error`, any unsupported item aborts before mutation;
/// the error carries the untouched document and the full log.
pub fn render(
    mut document: Document,
    fields: &FieldSet,
    unsupported_mode: UnsupportedMode,
) -> Result<RenderOutput, RenderError> {
    let parse_result = parser::scan(&document);
    let template_fields = parse_result.fields.clone();
    let missing_fields = compute_missing_fields(&template_fields, fields);

    let required_not_in_template: Vec<String> = fields
        .required_fields
        .iter()
        .filter(|field| !template_fields.contains(field))
        .cloned()
        .collect();
    if !required_not_in_template.is_empty() {
        warn!(
            fields = ?required_not_in_template,
            "Required fields do not appear in the template"
        );
    }

    let mut entries: Vec<ReplaceLogEntry> = parse_result
        .unsupported
        .iter()
        .map(ReplaceLogEntry::unsupported)
        .collect();

    let mut grouped: BTreeMap<&str, Vec<&Occurrence>> = BTreeMap::new();
    for occurrence in &parse_result.occurrences {
        grouped.entry(&occurrence.run_id).or_default().push(occurrence);
    }
    for occurrences in grouped.values_mut() {
        occurrences.sort_by(|a, b| b.start.cmp(&a.start));
    }

    let mut touched_runs = BTreeSet::new();
    let mut template_run_styles = BTreeMap::new();

    if parse_result.has_unsupported() && unsupported_mode == UnsupportedMode::Error {
        for ctx in document.paragraph_contexts(true) {
            for (id, run) in ctx.run_ids.iter().zip(&ctx.paragraph.runs) {
                for occurrence in grouped.get(id.as_str()).into_iter().flatten() {
                    if fields.value(&occurrence.field_name).is_none() {
                        let token = token_text(&run.text, occurrence)?;
                        entries.push(ReplaceLogEntry::missing(occurrence, token));
                    }
                }
            }
        }

        let replace_report = build_report(
            &parse_result,
            entries,
            touched_runs,
            template_run_styles,
            unsupported_mode,
        );
        info!(
            unsupported = replace_report.summary.unsupported_count,
            "Render refused: unsupported placeholders"
        );
        return Err(RenderError::Unsupported {
            output: Box::new(RenderOutput {
                document,
                parse_result,
                template_fields,
                replace_report,
                missing_fields,
                format_report: FormatReport::passing(),
                required_not_in_template,
            }),
        });
    }

    let mut pending: BTreeSet<&str> = grouped.keys().copied().collect();
    for ctx in document.paragraph_contexts_mut(true) {
        for (id, run) in ctx.run_ids.iter().zip(ctx.paragraph.runs.iter_mut()) {
            let Some(occurrences) = grouped.get(id.as_str()) else {
                continue;
            };
            pending.remove(id.as_str());

            for occurrence in occurrences {
                let original = token_text(&run.text, occurrence)?.to_string();
                let Some(value) = fields.value(&occurrence.field_name) else {
                    entries.push(ReplaceLogEntry::missing(occurrence, &original));
                    continue;
                };

                template_run_styles
                    .entry(id.clone())
                    .or_insert_with(|| RunStyleSnapshot::of(run));
                run.text.replace_range(occurrence.start..occurrence.end, value);
                touched_runs.insert(id.clone());
                entries.push(ReplaceLogEntry::replaced(occurrence, &original, value));
            }
        }
    }

    if let Some(unknown) = pending.into_iter().next() {
        return Err(RenderError::UnknownRun {
            run_id: unknown.to_string(),
        });
    }

    let replace_report = build_report(
        &parse_result,
        entries,
        touched_runs,
        template_run_styles,
        unsupported_mode,
    );
    info!(
        replaced = replace_report.summary.replaced_count,
        missing = replace_report.summary.missing_count,
        unsupported = replace_report.summary.unsupported_count,
        touched_runs = replace_report.touched_runs.len(),
        "Rendered template"
    );

    Ok(RenderOutput {
        document,
        parse_result,
        template_fields,
        replace_report,
        missing_fields,
        format_report: FormatReport::passing(),
        required_not_in_template,
    })
}

fn token_text<'t>(text: &'t str, occurrence: &Occurrence) -> Result<&'t str, RenderError> {
    text.get(occurrence.start..occurrence.end)
        .ok_or_else(|| RenderError::OffsetOutOfRange {
            run_id: occurrence.run_id.clone(),
            start: occurrence.start,
            end: occurrence.end,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use shared_types::{Paragraph, Run, Table};

    fn doc_of(runs: &[&str]) -> Document {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::from_runs(runs.iter().map(|t| Run::new(*t))));
        doc
    }

    #[test]
    fn test_meeting_title_scenario() {
        let fields = FieldSet::new()
            .with_value("MEETING_TITLE", "Kickoff")
            .require("MEETING_TITLE");
        let output = render(
            doc_of(&["Title: 【MEETING_TITLE】"]),
            &fields,
            UnsupportedMode::Error,
        )
        .unwrap();

        assert_eq!(output.rendered_texts(), vec!["Title: Kickoff"]);
        assert_eq!(
            output.replace_report.touched_runs,
            BTreeSet::from(["p0:r0".to_string()])
        );
        assert!(output.missing_fields.missing_required.is_empty());
        assert_eq!(output.template_fields, vec!["MEETING_TITLE"]);
        assert_eq!(output.replace_report.summary.replaced_count, 1);
    }

    #[test]
    fn test_multiple_replacements_in_one_run() {
        let fields = FieldSet::new()
            .with_value("A", "alpha-long-value")
            .with_value("B", "b");
        let output = render(doc_of(&["【A】 and 【B】 then 【A】"]), &fields, UnsupportedMode::Error)
            .unwrap();
        assert_eq!(
            output.rendered_texts(),
            vec!["alpha-long-value and b then alpha-long-value"]
        );
        assert_eq!(output.replace_report.summary.replaced_count, 3);
    }

    #[test]
    fn test_run_formatting_is_preserved_and_snapshotted() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::from_runs([
            Run::new("Name: "),
            Run::new("【NAME】").with_fonts("SimSun", "SimSun").with_size_pt(14),
        ]));
        let fields = FieldSet::new().with_value("NAME", "Li");
        let output = render(doc, &fields, UnsupportedMode::Error).unwrap();

        let run = &output.document.body[0].runs[1];
        assert_eq!(run.text, "Li");
        assert_eq!(run.size_pt(), Some(14));
        let snapshot = &output.replace_report.template_run_styles["p0:r1"];
        assert_eq!(snapshot.latin_font.as_deref(), Some("SimSun"));
        assert_eq!(snapshot.size_pt, Some(14));
        assert!(!output.replace_report.template_run_styles.contains_key("p0:r0"));
    }

    #[test]
    fn test_missing_fields_split_required_and_optional() {
        let fields = FieldSet::new()
            .with_value("PRESENT", "x")
            .require("REQ")
            .require("NOT_IN_TEMPLATE")
            .allow("OPT");
        let output = render(
            doc_of(&["【PRESENT】【REQ】【OPT】【EXTRA】"]),
            &fields,
            UnsupportedMode::Error,
        )
        .unwrap();

        assert_eq!(output.missing_fields.missing_required, vec!["REQ"]);
        assert_eq!(output.missing_fields.missing_optional, vec!["EXTRA", "OPT"]);
        assert_eq!(output.required_not_in_template, vec!["NOT_IN_TEMPLATE"]);
        assert_eq!(output.rendered_texts(), vec!["x【REQ】【OPT】【EXTRA】"]);
        assert_eq!(output.replace_report.summary.missing_count, 3);
        let missing = output
            .replace_report
            .entries
            .iter()
            .find(|e| e.status == ReplaceStatus::Missing)
            .unwrap();
        assert_eq!(missing.reason.as_deref(), Some("missing_field"));
    }

    #[test]
    fn test_error_mode_refuses_and_keeps_log() {
        let fields = FieldSet::new().with_value("GOOD", "ok");
        let err = render(
            doc_of(&["【GOOD】 【MISSING】 【bad】"]),
            &fields,
            UnsupportedMode::Error,
        )
        .unwrap_err();

        let output = err.output().unwrap();
        assert_eq!(output.rendered_texts(), vec!["【GOOD】 【MISSING】 【bad】"]);
        assert!(output.replace_report.touched_runs.is_empty());
        assert!(output.format_report.passed);

        let statuses: Vec<_> = output
            .replace_report
            .entries
            .iter()
            .map(|e| e.status)
            .collect();
        assert_eq!(statuses, vec![ReplaceStatus::Unsupported, ReplaceStatus::Missing]);
        assert_eq!(
            output.replace_report.entries[0].reason.as_deref(),
            Some("invalid_format")
        );
        assert_eq!(output.replace_report.summary.total_placeholders, 3);
    }

    #[test]
    fn test_warn_mode_renders_supported() {
        let fields = FieldSet::new().with_value("GOOD", "ok");
        let output = render(doc_of(&["【GOOD】 【bad】"]), &fields, UnsupportedMode::Warn).unwrap();
        assert_eq!(output.rendered_texts(), vec!["ok 【bad】"]);
        assert!(output.replace_report.summary.had_unsupported);
        assert_eq!(output.replace_report.summary.unsupported_mode, UnsupportedMode::Warn);
    }

    #[test]
    fn test_table_cells_render() {
        let mut doc = doc_of(&["body"]);
        doc.add_table(Table::with_shape(1, 2)).cell_mut(0, 1).unwrap().paragraphs[0] =
            Paragraph::new("【CELL】");
        let fields = FieldSet::new().with_value("CELL", "value");
        let output = render(doc, &fields, UnsupportedMode::Error).unwrap();
        assert_eq!(
            output.document.tables[0].rows[0].cells[1].paragraphs[0].text(),
            "value"
        );
        assert!(output.replace_report.touched_runs.contains("t0.r0.c1.p0:r0"));
    }

    #[test]
    fn test_format_gate_requires_summary() {
        let output = render(doc_of(&["plain"]), &FieldSet::new(), UnsupportedMode::Error).unwrap();
        assert!(!output.format_gate_failed());
    }

    #[test]
    fn test_unsupported_mode_from_str() {
        assert_eq!("WARN".parse::<UnsupportedMode>(), Ok(UnsupportedMode::Warn));
        assert!("loud".parse::<UnsupportedMode>().is_err());
    }
}
