//! Placeholder parse results

use serde::{Deserialize, Serialize};

/// A supported `【FIELD_NAME】` token lying entirely inside one run.
///
/// `start`/`end` are byte offsets into that run's text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Occurrence {
    pub field_name: String,
    pub run_id: String,
    pub start: usize,
    pub end: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnsupportedKind {
    /// A valid-looking token whose characters span two or more runs
    CrossRun,
    /// Bracketed text whose inner name is not `[A-Z0-9_]+`
    InvalidFormat,
    /// Opening bracket never closed; covers the rest of the paragraph
    UnclosedBracket,
    /// Closing bracket with no opening bracket
    StrayClose,
}

impl UnsupportedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnsupportedKind::CrossRun => "cross_run",
            UnsupportedKind::InvalidFormat => "invalid_format",
            UnsupportedKind::UnclosedBracket => "unclosed_bracket",
            UnsupportedKind::StrayClose => "stray_close",
        }
    }
}

impl std::fmt::Display for UnsupportedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A placeholder-like span that cannot be replaced safely.
///
/// `start`/`end` are byte offsets into the paragraph's concatenated text;
/// `run_id` names the run holding `start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnsupportedOccurrence {
    pub kind: UnsupportedKind,
    pub text: String,
    pub run_id: Option<String>,
    pub start: Option<usize>,
    pub end: Option<usize>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseResult {
    /// Field names in first-seen order, without duplicates
    pub fields: Vec<String>,
    pub occurrences: Vec<Occurrence>,
    pub unsupported: Vec<UnsupportedOccurrence>,
}

impl ParseResult {
    pub fn has_unsupported(&self) -> bool {
        !self.unsupported.is_empty()
    }

    pub fn unsupported_of(&self, kind: UnsupportedKind) -> impl Iterator<Item = &UnsupportedOccurrence> {
        self.unsupported.iter().filter(move |u| u.kind == kind)
    }
}
