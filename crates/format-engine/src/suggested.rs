//! Minimal policy suggestion derived from a template's own formatting

use serde::{Deserialize, Serialize};
use shared_types::Document;

use crate::observed::dominant_first_line_indent_twips;
use crate::policy::FormatPolicy;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SuggestedPolicy {
    pub forbid_tables: bool,
    /// Absent when the template has no usable indent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_line_indent_twips: Option<i32>,
    pub twips_tolerance: i32,
}

impl SuggestedPolicy {
    /// TOML fragment suitable for merging into a policy file
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string(self)
    }
}

pub fn build_suggested_policy(template: &Document, policy: &FormatPolicy) -> SuggestedPolicy {
    SuggestedPolicy {
        forbid_tables: !template.has_tables() && policy.forbid_tables,
        first_line_indent_twips: dominant_first_line_indent_twips(template),
        twips_tolerance: policy.twips_tolerance,
    }
}
