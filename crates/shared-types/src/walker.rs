//! Fixed-order paragraph traversal
//!
//! Body paragraphs come first, then table → row → cell → paragraph. Header and
//! footer paragraphs are never visited.

use crate::document::{Document, Paragraph};
use crate::run_id;

/// A visited paragraph with its stable path and run IDs
#[derive(Debug, Clone)]
pub struct ParagraphRunContext<'a> {
    pub paragraph: &'a Paragraph,
    pub paragraph_path: String,
    pub run_ids: Vec<String>,
    pub in_table: bool,
}

/// Same as [`ParagraphRunContext`], with a mutable paragraph
#[derive(Debug)]
pub struct ParagraphRunContextMut<'a> {
    pub paragraph: &'a mut Paragraph,
    pub paragraph_path: String,
    pub run_ids: Vec<String>,
    pub in_table: bool,
}

fn run_ids_for(paragraph_path: &str, run_count: usize) -> Vec<String> {
    (0..run_count)
        .map(|index| run_id::run_id(paragraph_path, index))
        .collect()
}

impl<'a> ParagraphRunContext<'a> {
    fn new(paragraph: &'a Paragraph, paragraph_path: String, in_table: bool) -> Self {
        let run_ids = run_ids_for(&paragraph_path, paragraph.runs.len());
        Self {
            paragraph,
            paragraph_path,
            run_ids,
            in_table,
        }
    }
}

impl<'a> ParagraphRunContextMut<'a> {
    fn new(paragraph: &'a mut Paragraph, paragraph_path: String, in_table: bool) -> Self {
        let run_ids = run_ids_for(&paragraph_path, paragraph.runs.len());
        Self {
            paragraph,
            paragraph_path,
            run_ids,
            in_table,
        }
    }
}

impl Document {
    /// Visit body paragraphs, then (optionally) table cell paragraphs
    pub fn paragraph_contexts(
        &self,
        include_tables: bool,
    ) -> impl Iterator<Item = ParagraphRunContext<'_>> {
        let body = self
            .body
            .iter()
            .enumerate()
            .map(|(index, paragraph)| {
                ParagraphRunContext::new(paragraph, run_id::body_path(index), false)
            });

        let table_limit = if include_tables { self.tables.len() } else { 0 };
        let tables = self
            .tables
            .iter()
            .take(table_limit)
            .enumerate()
            .flat_map(|(t, table)| {
                table.rows.iter().enumerate().flat_map(move |(r, row)| {
                    row.cells.iter().enumerate().flat_map(move |(c, cell)| {
                        cell.paragraphs.iter().enumerate().map(move |(p, paragraph)| {
                            ParagraphRunContext::new(paragraph, run_id::table_path(t, r, c, p), true)
                        })
                    })
                })
            });

        body.chain(tables)
    }

    /// Mutable variant of [`Document::paragraph_contexts`], same order and paths
    pub fn paragraph_contexts_mut(
        &mut self,
        include_tables: bool,
    ) -> impl Iterator<Item = ParagraphRunContextMut<'_>> {
        let table_limit = if include_tables { self.tables.len() } else { 0 };

        let body = self
            .body
            .iter_mut()
            .enumerate()
            .map(|(index, paragraph)| {
                ParagraphRunContextMut::new(paragraph, run_id::body_path(index), false)
            });

        let tables = self
            .tables
            .iter_mut()
            .take(table_limit)
            .enumerate()
            .flat_map(|(t, table)| {
                table.rows.iter_mut().enumerate().flat_map(move |(r, row)| {
                    row.cells.iter_mut().enumerate().flat_map(move |(c, cell)| {
                        cell.paragraphs
                            .iter_mut()
                            .enumerate()
                            .map(move |(p, paragraph)| {
                                ParagraphRunContextMut::new(
                                    paragraph,
                                    run_id::table_path(t, r, c, p),
                                    true,
                                )
                            })
                    })
                })
            });

        body.chain(tables)
    }

    /// Table-cell paragraphs only, in walker order
    pub fn table_paragraphs(&self) -> impl Iterator<Item = &Paragraph> {
        self.tables
            .iter()
            .flat_map(|t| t.rows.iter())
            .flat_map(|r| r.cells.iter())
            .flat_map(|c| c.paragraphs.iter())
    }
}
