//! In-memory word-processing document model
//!
//! Only *direct* paragraph and run properties are represented. Values that a
//! real document would inherit from styles are simply absent (`None`), which
//! downstream checks treat as "unknown".

use serde::{Deserialize, Serialize};

/// A structured document: body paragraphs, tables, and header/footer content.
///
/// Headers and footers are carried so a document can round-trip through the
/// core, but nothing in the placeholder or format tooling visits them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default)]
    pub body: Vec<Paragraph>,
    #[serde(default)]
    pub tables: Vec<Table>,
    #[serde(default)]
    pub headers: Vec<Paragraph>,
    #[serde(default)]
    pub footers: Vec<Paragraph>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a body paragraph and return a mutable handle to it
    pub fn add_paragraph(&mut self, paragraph: Paragraph) -> &mut Paragraph {
        self.body.push(paragraph);
        let index = self.body.len() - 1;
        &mut self.body[index]
    }

    /// Append a table and return a mutable handle to it
    pub fn add_table(&mut self, table: Table) -> &mut Table {
        self.tables.push(table);
        let index = self.tables.len() - 1;
        &mut self.tables[index]
    }

    pub fn has_tables(&self) -> bool {
        !self.tables.is_empty()
    }

    /// Paragraph text of every body paragraph, in order
    pub fn body_texts(&self) -> Vec<String> {
        self.body.iter().map(Paragraph::text).collect()
    }
}

/// A table, addressed as table → row → cell → paragraph
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    #[serde(default)]
    pub rows: Vec<TableRow>,
}

impl Table {
    /// Build a `rows` x `cols` table where every cell holds one empty paragraph
    pub fn with_shape(rows: usize, cols: usize) -> Self {
        Self {
            rows: (0..rows)
                .map(|_| TableRow {
                    cells: (0..cols)
                        .map(|_| TableCell {
                            paragraphs: vec![Paragraph::default()],
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    /// Mutable access to one cell, if it exists
    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut TableCell> {
        self.rows.get_mut(row).and_then(|r| r.cells.get_mut(col))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    #[serde(default)]
    pub cells: Vec<TableCell>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TableCell {
    #[serde(default)]
    pub paragraphs: Vec<Paragraph>,
}

/// A paragraph: ordered runs plus its direct paragraph properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Paragraph {
    #[serde(default)]
    pub runs: Vec<Run>,
    #[serde(default)]
    pub props: ParagraphProps,
}

impl Paragraph {
    /// Single-run paragraph with no direct formatting
    pub fn new(text: impl Into<String>) -> Self {
        Self::from_runs([Run::new(text)])
    }

    pub fn from_runs(runs: impl IntoIterator<Item = Run>) -> Self {
        Self {
            runs: runs.into_iter().collect(),
            props: ParagraphProps::default(),
        }
    }

    /// Concatenated run text
    pub fn text(&self) -> String {
        self.runs.iter().map(|r| r.text.as_str()).collect()
    }

    pub fn with_first_line_indent(mut self, twips: i32) -> Self {
        self.props.first_line_indent_twips = Some(twips);
        self
    }

    pub fn with_line_spacing(mut self, twips: i32, rule: LineRule) -> Self {
        self.props.spacing = Some(LineSpacing {
            line_twips: Some(twips),
            rule,
        });
        self
    }

    pub fn with_numbering(mut self, num_id: i32, level: i32) -> Self {
        self.props.numbering = Some(Numbering { num_id, level });
        self
    }

    /// Direct numbering (`numPr`) present on this paragraph
    pub fn has_direct_numbering(&self) -> bool {
        self.props.numbering.is_some()
    }

    /// Remove direct numbering; returns whether anything was removed
    pub fn remove_direct_numbering(&mut self) -> bool {
        self.props.numbering.take().is_some()
    }

    /// Direct first-line indent in twips, if set on the paragraph itself
    pub fn first_line_indent_twips(&self) -> Option<i32> {
        self.props.first_line_indent_twips
    }

    pub fn set_first_line_indent_twips(&mut self, twips: i32) {
        self.props.first_line_indent_twips = Some(twips);
    }

    /// Direct line spacing in twips.
    ///
    /// `None` when spacing is absent, auto, or carries no line value.
    pub fn line_spacing_twips(&self) -> Option<i32> {
        let spacing = self.props.spacing.as_ref()?;
        match spacing.rule {
            LineRule::Auto => None,
            LineRule::Exact | LineRule::AtLeast => spacing.line_twips,
        }
    }

    /// Set an exact line spacing in twips
    pub fn set_line_spacing_twips(&mut self, twips: i32) {
        self.props.spacing = Some(LineSpacing {
            line_twips: Some(twips),
            rule: LineRule::Exact,
        });
    }
}

/// Direct paragraph properties (`w:pPr`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphProps {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numbering: Option<Numbering>,
    /// Negative values are hanging indents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line_indent_twips: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spacing: Option<LineSpacing>,
}

/// Direct list numbering reference (`w:numPr`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Numbering {
    pub num_id: i32,
    pub level: i32,
}

/// Paragraph line spacing (`w:spacing`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineSpacing {
    #[serde(default)]
    pub line_twips: Option<i32>,
    #[serde(default)]
    pub rule: LineRule,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineRule {
    #[default]
    Auto,
    Exact,
    AtLeast,
}

/// A run of uniformly formatted text
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Run {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub props: RunProps,
}

impl Run {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            props: RunProps::default(),
        }
    }

    pub fn with_fonts(mut self, latin: &str, east_asia: &str) -> Self {
        self.props.font_latin = Some(latin.to_string());
        self.props.font_east_asia = Some(east_asia.to_string());
        self
    }

    pub fn with_size_pt(mut self, size_pt: u32) -> Self {
        self.props.size_half_points = Some(size_pt.saturating_mul(2));
        self
    }

    /// Font size rounded to whole points, if set directly on the run
    pub fn size_pt(&self) -> Option<i32> {
        self.props
            .size_half_points
            .map(|half| (f64::from(half) / 2.0).round() as i32)
    }

    /// Force latin/east-asian fonts and size as direct run properties
    pub fn set_fonts_and_size(&mut self, latin: &str, east_asia: &str, size_pt: u32) {
        self.props.font_latin = Some(latin.to_string());
        self.props.font_east_asia = Some(east_asia.to_string());
        self.props.size_half_points = Some(size_pt.saturating_mul(2));
    }
}

/// Direct run properties (`w:rPr`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunProps {
    /// `w:rFonts/@w:ascii`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_latin: Option<String>,
    /// `w:rFonts/@w:eastAsia`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_east_asia: Option<String>,
    /// `w:sz`, in half-points
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size_half_points: Option<u32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_line_spacing_is_not_direct() {
        let paragraph = Paragraph::new("x").with_line_spacing(240, LineRule::Auto);
        assert_eq!(paragraph.line_spacing_twips(), None);

        let paragraph = Paragraph::new("x").with_line_spacing(360, LineRule::Exact);
        assert_eq!(paragraph.line_spacing_twips(), Some(360));
    }

    #[test]
    fn test_size_rounds_half_points() {
        let mut run = Run::new("x");
        run.props.size_half_points = Some(21);
        assert_eq!(run.size_pt(), Some(11));
        run.props.size_half_points = Some(24);
        assert_eq!(run.size_pt(), Some(12));
        assert_eq!(Run::new("y").size_pt(), None);
    }

    #[test]
    fn test_huge_size_saturates() {
        let mut run = Run::new("x").with_size_pt(u32::MAX);
        assert_eq!(run.props.size_half_points, Some(u32::MAX));
        run.set_fonts_and_size("A", "B", u32::MAX / 2 + 1);
        assert_eq!(run.props.size_half_points, Some(u32::MAX));
    }

    #[test]
    fn test_remove_numbering_reports_change() {
        let mut paragraph = Paragraph::new("item").with_numbering(1, 0);
        assert!(paragraph.has_direct_numbering());
        assert!(paragraph.remove_direct_numbering());
        assert!(!paragraph.remove_direct_numbering());
    }

    #[test]
    fn test_minimal_json_uses_defaults() {
        let doc: Document = serde_json::from_str(
            r#"{"body":[{"runs":[{"text":"Hello"}],"props":{"first_line_indent_twips":420}}]}"#,
        )
        .unwrap();
        assert_eq!(doc.body[0].text(), "Hello");
        assert_eq!(doc.body[0].first_line_indent_twips(), Some(420));
        assert!(doc.tables.is_empty());
        assert_eq!(doc.body[0].runs[0].props, RunProps::default());
    }

    #[test]
    fn test_table_shape_has_one_paragraph_per_cell() {
        let table = Table::with_shape(2, 3);
        assert_eq!(table.rows.len(), 2);
        assert!(table
            .rows
            .iter()
            .all(|r| r.cells.len() == 3 && r.cells.iter().all(|c| c.paragraphs.len() == 1)));
    }
}
