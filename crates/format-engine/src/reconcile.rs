//! Baseline reconciliation
//!
//! Derives the policy the validator actually enforces. Under the template
//! baseline, table presence and the first-line indent target come from the
//! template itself; everything else comes from the configured policy.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::models::FormatBaseline;
use crate::observed::TemplateBaseline;
use crate::policy::FormatPolicy;

/// Effective policy plus the fields that differ from the input policy
#[derive(Debug, Clone, PartialEq)]
pub struct Reconciled {
    pub policy: FormatPolicy,
    pub overrides: BTreeMap<String, Value>,
}

/// Template-baseline reconciliation; never mutates `policy`
pub fn reconcile(policy: &FormatPolicy, baseline: &TemplateBaseline) -> Reconciled {
    let mut effective = policy.clone();
    let mut overrides = BTreeMap::new();

    if baseline.observed.has_tables && effective.forbid_tables {
        effective.forbid_tables = false;
        overrides.insert("forbid_tables".to_string(), Value::Bool(false));
    }

    let target = baseline.dominant_first_line_indent_twips;
    if effective.first_line_indent_twips != target {
        effective.first_line_indent_twips = target;
        overrides.insert(
            "first_line_indent_twips".to_string(),
            target.map(Value::from).unwrap_or(Value::Null),
        );
    }

    Reconciled {
        policy: effective,
        overrides,
    }
}

/// Policy for the given baseline; the policy baseline uses `policy` as is
pub fn effective_policy(
    policy: &FormatPolicy,
    baseline: &TemplateBaseline,
    mode: FormatBaseline,
) -> Reconciled {
    match mode {
        FormatBaseline::Template => reconcile(policy, baseline),
        FormatBaseline::Policy => Reconciled {
            policy: policy.clone(),
            overrides: BTreeMap::new(),
        },
    }
}
