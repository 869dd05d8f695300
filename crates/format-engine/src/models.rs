//! Format issues, reports, and run-level observations

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::diagnostics::FormatDiagnostics;
use crate::observed::{FormatObserved, FormatObservedDiff};

/// Stable issue codes emitted by the validator and fixers
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IssueCode {
    TableForbidden,
    NumprPresent,
    LineSpacingMismatch,
    FirstLineIndentMismatch,
    LeadingWhitespace,
    RunFontMismatch,
    RunSizeMismatch,
}

impl IssueCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueCode::TableForbidden => "TABLE_FORBIDDEN",
            IssueCode::NumprPresent => "NUMPR_PRESENT",
            IssueCode::LineSpacingMismatch => "LINE_SPACING_MISMATCH",
            IssueCode::FirstLineIndentMismatch => "FIRST_LINE_INDENT_MISMATCH",
            IssueCode::LeadingWhitespace => "LEADING_WHITESPACE",
            IssueCode::RunFontMismatch => "RUN_FONT_MISMATCH",
            IssueCode::RunSizeMismatch => "RUN_SIZE_MISMATCH",
        }
    }

    /// Run-level (font/size) checks, as opposed to paragraph/document checks
    pub fn is_run_level(&self) -> bool {
        matches!(self, IssueCode::RunFontMismatch | IssueCode::RunSizeMismatch)
    }
}

impl std::fmt::Display for IssueCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blocking (error) vs informational (warn)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    #[default]
    Error,
    Warn,
}

/// Whether the compared value was actually read or had to be inferred
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Observability {
    #[default]
    Observed,
    Unknown,
}

/// A single formatting issue found by the validator or a fixer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatIssue {
    pub code: IssueCode,
    pub message: String,
    /// Paragraph path (`p3`, `t0.r1.c2.p0`) or table path (`t0`)
    pub paragraph_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    pub fixable: bool,
    #[serde(default)]
    pub fixed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actual: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rendered_value: Option<Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub context: BTreeMap<String, Value>,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub observability: Observability,
}

impl FormatIssue {
    /// A non-fixable, unresolved, observed error
    pub fn new(code: IssueCode, message: impl Into<String>, paragraph_path: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            paragraph_path: paragraph_path.into(),
            run_id: None,
            fixable: false,
            fixed: false,
            expected: None,
            actual: None,
            tolerance: None,
            template_value: None,
            rendered_value: None,
            context: BTreeMap::new(),
            severity: Severity::Error,
            observability: Observability::Observed,
        }
    }

    pub fn fixable(mut self) -> Self {
        self.fixable = true;
        self
    }

    /// Mark as fixable and already fixed
    pub fn resolved(mut self) -> Self {
        self.fixable = true;
        self.fixed = true;
        self
    }

    pub fn with_run(mut self, run_id: &str) -> Self {
        self.run_id = Some(run_id.to_string());
        self
    }

    pub fn with_expected(mut self, expected: impl Into<Value>) -> Self {
        self.expected = Some(expected.into());
        self
    }

    pub fn with_actual(mut self, actual: impl Into<Value>) -> Self {
        self.actual = Some(actual.into());
        self
    }

    pub fn with_tolerance(mut self, tolerance: i32) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    pub fn with_template_value(mut self, value: impl Into<Value>) -> Self {
        self.template_value = Some(value.into());
        self
    }

    pub fn with_rendered_value(mut self, value: impl Into<Value>) -> Self {
        self.rendered_value = Some(value.into());
        self
    }

    pub fn with_context(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.context.insert(key.to_string(), value.into());
        self
    }

    pub fn with_grade(mut self, severity: Severity, observability: Observability) -> Self {
        self.severity = severity;
        self.observability = observability;
        self
    }

    /// Unresolved and blocking
    pub fn is_blocking(&self) -> bool {
        !self.fixed && self.severity == Severity::Error
    }
}

/// Validation / fix outcome for one document
///
/// - `passed == (error_count == 0)`
/// - `error_count` counts unresolved error-severity issues (fixable or not)
/// - `fixed_count` counts issues resolved by a fixer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatReport {
    pub passed: bool,
    pub error_count: usize,
    pub fixed_count: usize,
    #[serde(default)]
    pub issues: Vec<FormatIssue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<FormatSummary>,
}

impl FormatReport {
    pub fn from_issues(issues: Vec<FormatIssue>) -> Self {
        let error_count = issues.iter().filter(|i| i.is_blocking()).count();
        let fixed_count = issues.iter().filter(|i| i.fixed).count();
        Self {
            passed: error_count == 0,
            error_count,
            fixed_count,
            issues,
            summary: None,
        }
    }

    /// Trivially passing report with no issues
    pub fn passing() -> Self {
        Self::from_issues(Vec::new())
    }

    pub fn issues_with_code(&self, code: IssueCode) -> impl Iterator<Item = &FormatIssue> {
        self.issues.iter().filter(move |i| i.code == code)
    }

    pub fn has_code(&self, code: IssueCode) -> bool {
        self.issues_with_code(code).next().is_some()
    }
}

/// How a run looked in the template before rendering touched it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunStyleSnapshot {
    pub latin_font: Option<String>,
    pub east_asia_font: Option<String>,
    pub size_pt: Option<i32>,
}

impl RunStyleSnapshot {
    pub fn of(run: &shared_types::Run) -> Self {
        Self {
            latin_font: run.props.font_latin.clone(),
            east_asia_font: run.props.font_east_asia.clone(),
            size_pt: run.size_pt(),
        }
    }
}

/// Format stage behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatMode {
    /// Skip reconciliation, fixing and validation
    Off,
    /// Fix and validate; failures are reported only
    Report,
    /// Fix and validate; a failed report blocks the task
    #[default]
    Strict,
}

/// Source of truth for "correct" formatting
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatBaseline {
    #[default]
    Template,
    Policy,
}

/// Whether the paragraph-scoped safe fixer runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatFixMode {
    None,
    #[default]
    Safe,
}

macro_rules! impl_as_str {
    ($ty:ty { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $name),+
                }
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

impl_as_str!(FormatMode { Off => "off", Report => "report", Strict => "strict" });
impl_as_str!(FormatBaseline { Template => "template", Policy => "policy" });
impl_as_str!(FormatFixMode { None => "none", Safe => "safe" });

/// One paragraph-level change applied by the safe fixer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixChange {
    pub paragraph_path: String,
    pub field: String,
    pub before: Option<i32>,
    pub after: i32,
    pub reason: String,
}

/// Observability summary the pipeline attaches to every format report
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatSummary {
    pub template_observed: FormatObserved,
    pub rendered_observed: FormatObserved,
    pub diff: FormatObservedDiff,
    pub mode: FormatMode,
    pub baseline: FormatBaseline,
    pub fix_mode: FormatFixMode,
    #[serde(default)]
    pub effective_policy_overrides: BTreeMap<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostics: Option<FormatDiagnostics>,
    pub skipped: bool,
    pub fix_applied: bool,
    #[serde(default)]
    pub fix_changes: Vec<FixChange>,
}
