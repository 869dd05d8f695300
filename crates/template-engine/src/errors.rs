//! Error types for parsing and rendering

use thiserror::Error;

use crate::models::ParseResult;
use crate::renderer::RenderOutput;

#[derive(Error, Debug)]
pub enum TemplateError {
    /// Strict parsing found unsupported items; the full result is attached
    #[error("Unsupported placeholders found in template ({} item(s))", .result.unsupported.len())]
    Unsupported { result: Box<ParseResult> },
}

#[derive(Error, Debug)]
pub enum RenderError {
    /// Nothing was replaced; the output carries the full replace log
    #[error(
        "Unsupported placeholders found in template ({} item(s))",
        .output.parse_result.unsupported.len()
    )]
    Unsupported { output: Box<RenderOutput> },

    #[error("Occurrence references unknown run: {run_id}")]
    UnknownRun { run_id: String },

    #[error("Occurrence {start}..{end} is outside run {run_id}")]
    OffsetOutOfRange {
        run_id: String,
        start: usize,
        end: usize,
    },
}

impl RenderError {
    /// Partial output, when the failure still produced one
    pub fn output(&self) -> Option<&RenderOutput> {
        match self {
            RenderError::Unsupported { output } => Some(output.as_ref()),
            RenderError::UnknownRun { .. } | RenderError::OffsetOutOfRange { .. } => None,
        }
    }

    pub fn into_output(self) -> Option<RenderOutput> {
        match self {
            RenderError::Unsupported { output } => Some(*output),
            RenderError::UnknownRun { .. } | RenderError::OffsetOutOfRange { .. } => None,
        }
    }
}
