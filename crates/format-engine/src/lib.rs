//! Format policy enforcement for rendered documents
//!
//! Policies are loaded once, reconciled against the template they apply to,
//! then used by the direct fixer, the safe paragraph fixer and the validator.
//! Diagnostics and observed snapshots explain the result.

pub mod diagnostics;
pub mod fixer;
pub mod models;
pub mod observed;
pub mod policy;
pub mod reconcile;
pub mod report_text;
pub mod safe_fixer;
pub mod suggested;
pub mod validator;

pub use diagnostics::{build_format_diagnostics, FormatDiagnostics};
pub use fixer::fix_document;
pub use models::{
    FixChange, FormatBaseline, FormatFixMode, FormatIssue, FormatMode, FormatReport,
    FormatSummary, IssueCode, Observability, RunStyleSnapshot, Severity,
};
pub use observed::{
    diff_observed, dominant_first_line_indent_twips, observe, FormatObserved, FormatObservedDiff,
    TemplateBaseline,
};
pub use policy::{FormatPolicy, PolicyError};
pub use reconcile::{effective_policy, reconcile, Reconciled};
pub use safe_fixer::safe_fix_document;
pub use suggested::{build_suggested_policy, SuggestedPolicy};
pub use validator::FormatValidator;
