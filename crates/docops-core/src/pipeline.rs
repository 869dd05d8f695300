//! Render-then-format pipeline
//!
//! RENDER, then fail on unsupported placeholders or missing required fields,
//! then FORMAT according to the format mode. Observed snapshots of the
//! pristine template and the rendered document are attached in every mode.

use format_engine::{
    build_format_diagnostics, diff_observed, effective_policy, fix_document, observe,
    safe_fix_document, FormatBaseline, FormatFixMode, FormatIssue, FormatMode, FormatPolicy,
    FormatReport, FormatSummary, FormatValidator, Reconciled, TemplateBaseline,
};
use serde::{Deserialize, Serialize};
use shared_types::{Document, FieldSet};
use template_engine::{render, RenderError, RenderOutput, ReplaceReport, UnsupportedMode};
use tracing::{info, instrument, warn};

use crate::errors::PipelineError;
use crate::skills::{Skill, TaskSpec};

/// Per-invocation switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunOptions {
    #[serde(default)]
    pub unsupported_mode: UnsupportedMode,
    #[serde(default)]
    pub format_mode: FormatMode,
    #[serde(default)]
    pub format_baseline: FormatBaseline,
    #[serde(default)]
    pub format_fix_mode: FormatFixMode,
}

impl RunOptions {
    pub fn with_unsupported_mode(mut self, mode: UnsupportedMode) -> Self {
        self.unsupported_mode = mode;
        self
    }

    pub fn with_format_mode(mut self, mode: FormatMode) -> Self {
        self.format_mode = mode;
        self
    }

    pub fn with_baseline(mut self, baseline: FormatBaseline) -> Self {
        self.format_baseline = baseline;
        self
    }

    pub fn with_fix_mode(mut self, fix_mode: FormatFixMode) -> Self {
        self.format_fix_mode = fix_mode;
        self
    }
}

/// Named option bundles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Preset {
    /// Report against the template, with safe fixes
    Quick,
    /// Report against the template, no paragraph fixes
    Template,
    /// Gate on the fixed policy, with safe fixes
    Strict,
}

impl Preset {
    pub fn options(&self) -> RunOptions {
        let (format_mode, format_baseline, format_fix_mode) = match self {
            Preset::Quick => (FormatMode::Report, FormatBaseline::Template, FormatFixMode::Safe),
            Preset::Template => (FormatMode::Report, FormatBaseline::Template, FormatFixMode::None),
            Preset::Strict => (FormatMode::Strict, FormatBaseline::Policy, FormatFixMode::Safe),
        };
        RunOptions {
            unsupported_mode: UnsupportedMode::default(),
            format_mode,
            format_baseline,
            format_fix_mode,
        }
    }
}

impl std::fmt::Display for Preset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Preset::Quick => write!(f, "quick"),
            Preset::Template => write!(f, "template"),
            Preset::Strict => write!(f, "strict"),
        }
    }
}

impl std::str::FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "quick" => Ok(Preset::Quick),
            "template" => Ok(Preset::Template),
            "strict" => Ok(Preset::Strict),
            other => Err(format!("Unknown preset: {}", other)),
        }
    }
}

fn base_summary(
    baseline: &TemplateBaseline,
    rendered: &Document,
    options: RunOptions,
    skipped: bool,
) -> FormatSummary {
    let rendered_observed = observe(rendered);
    FormatSummary {
        diff: diff_observed(&baseline.observed, &rendered_observed),
        template_observed: baseline.observed.clone(),
        rendered_observed,
        mode: options.format_mode,
        baseline: options.format_baseline,
        fix_mode: options.format_fix_mode,
        effective_policy_overrides: Default::default(),
        diagnostics: None,
        skipped,
        fix_applied: false,
        fix_changes: Vec::new(),
    }
}

fn skipped_report(baseline: &TemplateBaseline, rendered: &Document, options: RunOptions) -> FormatReport {
    let mut report = FormatReport::passing();
    report.summary = Some(base_summary(baseline, rendered, options, true));
    report
}

/// Reconcile, fix, validate and explain one rendered document
fn format_stage(
    template: &Document,
    baseline: &TemplateBaseline,
    document: &mut Document,
    replace_report: &ReplaceReport,
    policy: &FormatPolicy,
    options: RunOptions,
) -> FormatReport {
    let Reconciled {
        policy: effective,
        overrides,
    } = effective_policy(policy, baseline, options.format_baseline);
    let touched = &replace_report.touched_runs;

    let direct = fix_document(document, &effective, touched, options.format_baseline);
    let fix_changes = match options.format_fix_mode {
        FormatFixMode::Safe => safe_fix_document(document, &effective, touched),
        FormatFixMode::None => Vec::new(),
    };

    let validation = FormatValidator::new(&effective, touched)
        .with_baseline(options.format_baseline)
        .with_template_run_styles(&replace_report.template_run_styles)
        .validate(document);

    let mut issues: Vec<FormatIssue> = direct.issues.into_iter().filter(|i| i.fixed).collect();
    issues.extend(validation.issues);
    let mut report = FormatReport::from_issues(issues);

    let mut summary = base_summary(baseline, document, options, false);
    summary.effective_policy_overrides = overrides;
    summary.diagnostics = Some(build_format_diagnostics(template, document, &effective, &report));
    summary.fix_applied = options.format_fix_mode == FormatFixMode::Safe;
    summary.fix_changes = fix_changes;
    report.summary = Some(summary);

    info!(
        passed = report.passed,
        errors = report.error_count,
        fixed = report.fixed_count,
        "Format stage complete"
    );
    report
}

/// Render `document` with `fields`, then apply the format stage.
///
/// Fails when the template has unsupported placeholders (error mode) or
/// required template fields have no value; both failures carry the output.
/// A failed strict-mode report is not an error here; see
/// [`RenderOutput::format_gate_failed`].
#[instrument(skip_all, fields(
    format_mode = %options.format_mode,
    baseline = %options.format_baseline,
    fix_mode = %options.format_fix_mode,
))]
pub fn run_task(
    fields: &FieldSet,
    document: Document,
    policy: &FormatPolicy,
    options: RunOptions,
) -> Result<RenderOutput, PipelineError> {
    let template = document.clone();
    let baseline = TemplateBaseline::collect(&template);

    let mut output = match render(document, fields, options.unsupported_mode) {
        Ok(output) => output,
        Err(RenderError::Unsupported { mut output }) => {
            output.format_report = skipped_report(&baseline, &output.document, options);
            return Err(PipelineError::UnsupportedPlaceholders { output });
        }
        Err(other) => return Err(other.into()),
    };

    if !output.missing_fields.missing_required.is_empty() {
        warn!(
            missing = ?output.missing_fields.missing_required,
            "Required fields have no value"
        );
        output.format_report = skipped_report(&baseline, &output.document, options);
        return Err(PipelineError::MissingRequiredFields {
            missing_required: output.missing_fields.missing_required.clone(),
            output: Box::new(output),
        });
    }

    output.format_report = match options.format_mode {
        FormatMode::Off => {
            info!("Format stage skipped");
            skipped_report(&baseline, &output.document, options)
        }
        FormatMode::Report | FormatMode::Strict => format_stage(
            &template,
            &baseline,
            &mut output.document,
            &output.replace_report,
            policy,
            options,
        ),
    };

    if output.format_gate_failed() {
        warn!(
            errors = output.format_report.error_count,
            "Strict format gate failed"
        );
    }
    Ok(output)
}

/// Build fields with `skill`, then [`run_task`]
pub fn run_skill_task(
    task: &TaskSpec,
    skill: &dyn Skill,
    document: Document,
    policy: &FormatPolicy,
    options: RunOptions,
) -> Result<RenderOutput, PipelineError> {
    let fields = skill.build_fields(task)?;
    run_task(&fields, document, policy, options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use format_engine::IssueCode;
    use shared_types::{LineRule, Paragraph, Run};

    fn policy() -> FormatPolicy {
        FormatPolicy::builtin().unwrap()
    }

    #[test]
    fn test_presets() {
        assert_eq!(
            Preset::Strict.options(),
            RunOptions::default()
                .with_baseline(FormatBaseline::Policy)
                .with_format_mode(FormatMode::Strict)
        );
        assert_eq!(
            Preset::Template.options().format_fix_mode,
            FormatFixMode::None
        );
        assert_eq!("Quick".parse::<Preset>(), Ok(Preset::Quick));
        assert!("fast".parse::<Preset>().is_err());
    }

    #[test]
    fn test_default_options() {
        let options = RunOptions::default();
        assert_eq!(options.unsupported_mode, UnsupportedMode::Error);
        assert_eq!(options.format_mode, FormatMode::Strict);
        assert_eq!(options.format_baseline, FormatBaseline::Template);
        assert_eq!(options.format_fix_mode, FormatFixMode::Safe);
    }

    #[test]
    fn test_off_mode_skips_format() {
        let mut doc = Document::new();
        doc.add_paragraph(
            Paragraph::new("  【NAME】").with_line_spacing(200, LineRule::Exact),
        );
        let fields = FieldSet::new().with_value("NAME", "x");
        let output = run_task(
            &fields,
            doc,
            &policy(),
            RunOptions::default().with_format_mode(FormatMode::Off),
        )
        .unwrap();

        assert!(output.format_report.passed);
        assert!(output.format_report.issues.is_empty());
        let summary = output.format_report.summary.as_ref().unwrap();
        assert!(summary.skipped);
        assert_eq!(output.rendered_texts(), vec!["  x"]);
    }

    #[test]
    fn test_missing_required_fails_with_output() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::new("【NAME】 【DATE】"));
        let fields = FieldSet::new().with_value("NAME", "x").require("DATE");

        let err = run_task(&fields, doc, &policy(), RunOptions::default()).unwrap_err();
        match &err {
            PipelineError::MissingRequiredFields {
                missing_required, ..
            } => assert_eq!(missing_required, &vec!["DATE".to_string()]),
            other => panic!("unexpected error: {other}"),
        }
        let output = err.output().unwrap();
        assert_eq!(output.rendered_texts(), vec!["x 【DATE】"]);
        assert!(output.format_report.summary.as_ref().unwrap().skipped);
    }

    #[test]
    fn test_fixed_issues_precede_validation_issues() {
        let mut doc = Document::new();
        doc.add_paragraph(Paragraph::from_runs([Run::new("\u{3000}【NAME】")]));
        doc.add_paragraph(Paragraph::new("tail").with_line_spacing(400, LineRule::Exact));
        let fields = FieldSet::new().with_value("NAME", "x");

        let output = run_task(
            &fields,
            doc,
            &policy(),
            RunOptions::default().with_fix_mode(FormatFixMode::None),
        )
        .unwrap();

        let report = &output.format_report;
        assert_eq!(report.issues[0].code, IssueCode::LeadingWhitespace);
        assert!(report.issues[0].fixed);
        assert!(report.has_code(IssueCode::LineSpacingMismatch));
        assert!(!report.passed);
        assert!(output.format_gate_failed());
        assert_eq!(output.rendered_texts()[0], "x");
    }
}
