//! Pipeline errors

use template_engine::{RenderError, RenderOutput};
use thiserror::Error;

use crate::skills::SkillError;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Rendering refused; the output carries the untouched document and log
    #[error(
        "Unsupported placeholders found in template ({} item(s))",
        .output.parse_result.unsupported.len()
    )]
    UnsupportedPlaceholders { output: Box<RenderOutput> },

    #[error("Missing required fields: {}", .missing_required.join(", "))]
    MissingRequiredFields {
        missing_required: Vec<String>,
        output: Box<RenderOutput>,
    },

    #[error(transparent)]
    Skill(#[from] SkillError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PipelineError {
    /// Partial output, when the failure still produced one
    pub fn output(&self) -> Option<&RenderOutput> {
        match self {
            PipelineError::UnsupportedPlaceholders { output }
            | PipelineError::MissingRequiredFields { output, .. } => Some(output.as_ref()),
            PipelineError::Skill(_) | PipelineError::Internal(_) => None,
        }
    }

    pub fn into_output(self) -> Option<RenderOutput> {
        match self {
            PipelineError::UnsupportedPlaceholders { output }
            | PipelineError::MissingRequiredFields { output, .. } => Some(*output),
            PipelineError::Skill(_) | PipelineError::Internal(_) => None,
        }
    }
}

impl From<RenderError> for PipelineError {
    fn from(err: RenderError) -> Self {
        match err {
            RenderError::Unsupported { output } => PipelineError::UnsupportedPlaceholders { output },
            other => PipelineError::Internal(other.to_string()),
        }
    }
}
