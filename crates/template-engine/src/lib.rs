//! Placeholder templates over structured documents
//!
//! Templates mark fields as `【FIELD_NAME】`. This crate finds them, replaces
//! them without disturbing run formatting, and fingerprints a template so the
//! same layout can be recognised again.

pub mod errors;
pub mod fingerprint;
pub mod models;
pub mod parser;
pub mod renderer;

pub use errors::{RenderError, TemplateError};
pub use fingerprint::compute_template_fingerprint;
pub use models::{Occurrence, ParseResult, UnsupportedKind, UnsupportedOccurrence};
pub use parser::{is_valid_field_name, parse_placeholders};
pub use renderer::{
    compute_missing_fields, render, MissingFieldsReport, RenderOutput, ReplaceLogEntry,
    ReplaceReport, ReplaceStatus, ReplaceSummary, UnsupportedMode,
};
