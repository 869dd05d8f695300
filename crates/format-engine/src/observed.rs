//! Observed formatting snapshots
//!
//! Pure read passes over a document. The pipeline observes the pristine
//! template and the rendered result and attaches both, plus their diff, to
//! every format report.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use shared_types::{Document, Paragraph};

/// Indents below this many twips are treated as noise when picking a dominant value
pub const MIN_DOMINANT_INDENT_TWIPS: i32 = 200;

const NONE_KEY: &str = "none";
const UNKNOWN_KEY: &str = "unknown";

pub type Histogram = BTreeMap<String, usize>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatObserved {
    pub has_tables: bool,
    pub has_numpr: bool,
    /// Twips as string, or `"none"`
    pub first_line_indent_twips_hist: Histogram,
    /// Font name, or `"none"`
    pub run_font_latin_hist: Histogram,
    /// Font name, or `"unknown"`
    pub run_font_east_asia_hist: Histogram,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatObservedDiff {
    pub has_tables_changed: bool,
    pub has_numpr_changed: bool,
    /// rendered minus template, for every key present in either
    pub first_line_indent_twips_hist_delta: BTreeMap<String, i64>,
}

/// What the pristine template says about its own formatting
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateBaseline {
    pub observed: FormatObserved,
    pub dominant_first_line_indent_twips: Option<i32>,
}

impl TemplateBaseline {
    pub fn collect(template: &Document) -> Self {
        Self {
            observed: observe(template),
            dominant_first_line_indent_twips: dominant_first_line_indent_twips(template),
        }
    }
}

fn bump(hist: &mut Histogram, key: &str) {
    *hist.entry(key.to_string()).or_insert(0) += 1;
}

fn indent_key(paragraph: &Paragraph) -> String {
    paragraph
        .first_line_indent_twips()
        .map(|twips| twips.to_string())
        .unwrap_or_else(|| NONE_KEY.to_string())
}

/// Collect table/numbering presence and indent/font histograms
pub fn observe(document: &Document) -> FormatObserved {
    let mut observed = FormatObserved {
        has_tables: document.has_tables(),
        ..FormatObserved::default()
    };

    for ctx in document.paragraph_contexts(true) {
        let paragraph = ctx.paragraph;
        observed.has_numpr |= paragraph.has_direct_numbering();
        bump(&mut observed.first_line_indent_twips_hist, &indent_key(paragraph));

        for run in &paragraph.runs {
            bump(
                &mut observed.run_font_latin_hist,
                run.props.font_latin.as_deref().unwrap_or(NONE_KEY),
            );
            bump(
                &mut observed.run_font_east_asia_hist,
                run.props.font_east_asia.as_deref().unwrap_or(UNKNOWN_KEY),
            );
        }
    }

    observed
}

fn indent_hist<'a>(paragraphs: impl Iterator<Item = &'a Paragraph>) -> Histogram {
    let mut hist = Histogram::new();
    for paragraph in paragraphs {
        bump(&mut hist, &indent_key(paragraph));
    }
    hist
}

/// Most frequent body indent, falling back to table paragraphs when the body has none
pub fn dominant_first_line_indent_twips(document: &Document) -> Option<i32> {
    pick_dominant_indent_from_hist(&indent_hist(document.body.iter()), MIN_DOMINANT_INDENT_TWIPS)
        .or_else(|| {
            pick_dominant_indent_from_hist(
                &indent_hist(document.table_paragraphs()),
                MIN_DOMINANT_INDENT_TWIPS,
            )
        })
}

/// Pick the most frequent numeric key `>= min_twips`; ties go to the smaller value
pub fn pick_dominant_indent_from_hist(hist: &Histogram, min_twips: i32) -> Option<i32> {
    hist.iter()
        .filter(|(key, _)| key.as_str() != NONE_KEY)
        .filter_map(|(key, count)| key.parse::<i32>().ok().map(|twips| (twips, *count)))
        .filter(|(twips, _)| *twips >= min_twips)
        .min_by(|(a_twips, a_count), (b_twips, b_count)| {
            b_count.cmp(a_count).then(a_twips.cmp(b_twips))
        })
        .map(|(twips, _)| twips)
}

pub fn diff_observed(template: &FormatObserved, rendered: &FormatObserved) -> FormatObservedDiff {
    let keys = template
        .first_line_indent_twips_hist
        .keys()
        .chain(rendered.first_line_indent_twips_hist.keys());

    let mut delta = BTreeMap::new();
    for key in keys {
        let count = |hist: &Histogram| hist.get(key).copied().unwrap_or(0) as i64;
        delta.insert(
            key.clone(),
            count(&rendered.first_line_indent_twips_hist)
                - count(&template.first_line_indent_twips_hist),
        );
    }

    FormatObservedDiff {
        has_tables_changed: template.has_tables != rendered.has_tables,
        has_numpr_changed: template.has_numpr != rendered.has_numpr,
        first_line_indent_twips_hist_delta: delta,
    }
}

/// Dominant histogram key for display: highest count, then lexical key
pub fn dominant_key(hist: &Histogram) -> Option<&str> {
    hist.iter()
        .min_by(|(a_key, a_count), (b_key, b_count)| b_count.cmp(a_count).then(a_key.cmp(b_key)))
        .map(|(key, _)| key.as_str())
}
