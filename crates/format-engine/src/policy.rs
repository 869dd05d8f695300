//! Format policy model and loader
//!
//! A policy is an immutable rule set. It is parsed from TOML or JSON, checked
//! once with [`FormatPolicy::validate`], and never mutated afterwards; baseline
//! reconciliation produces a fresh copy instead.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

const BUILTIN_POLICY: &str = include_str!("../policy.toml");

/// Largest font size a word processor accepts
pub const MAX_RUN_SIZE_PT: u32 = 1638;

#[derive(Debug, Error)]
pub enum PolicyError {
    #[error("Policy file not found: {path}")]
    NotFound { path: PathBuf },

    #[error("Failed to read policy file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Unsupported policy file extension: {0}")]
    UnsupportedExtension(String),

    #[error("Invalid TOML policy: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid JSON policy: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid policy schema: {0}")]
    Invalid(String),
}

/// Declarative formatting rules
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FormatPolicy {
    pub forbid_tables: bool,
    pub forbid_numpr: bool,
    /// Only direct `numPr` is inspected; must stay `true`
    pub numpr_direct_only: bool,
    pub run_font_latin: String,
    pub run_font_east_asia: String,
    pub run_size_pt: u32,
    pub line_spacing_twips: i32,
    /// `None` disables the first-line indent check
    #[serde(default)]
    pub first_line_indent_twips: Option<i32>,
    pub twips_tolerance: i32,
    #[serde(default)]
    pub treat_inherited_as_error: bool,
    pub trim_leading_spaces: bool,
    pub trim_chars: Vec<char>,
}

impl FormatPolicy {
    /// The embedded default policy
    pub fn builtin() -> Result<Self, PolicyError> {
        Self::from_toml_str(BUILTIN_POLICY)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, PolicyError> {
        let policy: Self = toml::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    pub fn from_json_str(content: &str) -> Result<Self, PolicyError> {
        let policy: Self = serde_json::from_str(content)?;
        policy.validate()?;
        Ok(policy)
    }

    /// Load a `.toml` or `.json` policy file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::NotFound {
                PolicyError::NotFound {
                    path: path.to_path_buf(),
                }
            } else {
                PolicyError::Io {
                    path: path.to_path_buf(),
                    source,
                }
            }
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml_str(&content),
            Some("json") => Self::from_json_str(&content),
            other => Err(PolicyError::UnsupportedExtension(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }

    /// Reject values no check can act on sensibly
    pub fn validate(&self) -> Result<(), PolicyError> {
        if !self.numpr_direct_only {
            return Err(PolicyError::Invalid(
                "numpr_direct_only must be true; inherited numbering is not observable".into(),
            ));
        }
        if self.twips_tolerance < 0 {
            return Err(PolicyError::Invalid(format!(
                "twips_tolerance must be >= 0 (got {})",
                self.twips_tolerance
            )));
        }
        if self.run_size_pt == 0 || self.run_size_pt > MAX_RUN_SIZE_PT {
            return Err(PolicyError::Invalid(format!(
                "run_size_pt must be in 1..={MAX_RUN_SIZE_PT} (got {})",
                self.run_size_pt
            )));
        }
        if self.line_spacing_twips <= 0 {
            return Err(PolicyError::Invalid(format!(
                "line_spacing_twips must be positive (got {})",
                self.line_spacing_twips
            )));
        }
        if self.run_font_latin.trim().is_empty() || self.run_font_east_asia.trim().is_empty() {
            return Err(PolicyError::Invalid("run fonts must not be empty".into()));
        }
        Ok(())
    }

    pub fn is_trim_char(&self, c: char) -> bool {
        self.trim_chars.contains(&c)
    }

    /// `|actual - expected| <= twips_tolerance`
    pub fn within_tolerance(&self, actual: i32, expected: i32) -> bool {
        (i64::from(actual) - i64::from(expected)).abs() <= i64::from(self.twips_tolerance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = r#"
forbid_tables = true
forbid_numpr = true
numpr_direct_only = true
run_font_latin = "Latin"
run_font_east_asia = "EastAsia"
run_size_pt = 12
line_spacing_twips = 360
first_line_indent_twips = 420
twips_tolerance = 20
trim_leading_spaces = true
trim_chars = [" ", "\t", "　"]
"#;

    #[test]
    fn test_builtin_policy_loads() {
        let policy = FormatPolicy::builtin().unwrap();
        assert_eq!(policy.run_font_latin, "BUSINESS_DEFAULT_LATIN");
        assert_eq!(policy.run_font_east_asia, "BUSINESS_DEFAULT_EAST_ASIA");
        assert!(policy.forbid_tables);
        assert_eq!(policy.first_line_indent_twips, Some(420));
        assert!(policy.is_trim_char('\u{3000}'));
    }

    #[test]
    fn test_missing_indent_disables_check() {
        let content = VALID.replace("first_line_indent_twips = 420\n", "");
        let policy = FormatPolicy::from_toml_str(&content).unwrap();
        assert_eq!(policy.first_line_indent_twips, None);
        assert!(!policy.treat_inherited_as_error);
    }

    #[test]
    fn test_rejects_wrong_type() {
        let content = VALID.replace("run_size_pt = 12", "run_size_pt = \"bad\"");
        assert!(matches!(
            FormatPolicy::from_toml_str(&content),
            Err(PolicyError::Toml(_))
        ));
    }

    #[test]
    fn test_rejects_missing_field() {
        let content = VALID.replace("run_font_east_asia = \"EastAsia\"\n", "");
        assert!(FormatPolicy::from_toml_str(&content).is_err());
    }

    #[test]
    fn test_rejects_unknown_key() {
        let content = format!("{}\nmystery = 1\n", VALID);
        assert!(FormatPolicy::from_toml_str(&content).is_err());
    }

    #[test]
    fn test_rejects_negative_tolerance() {
        let content = VALID.replace("twips_tolerance = 20", "twips_tolerance = -1");
        let err = FormatPolicy::from_toml_str(&content).unwrap_err();
        assert!(matches!(err, PolicyError::Invalid(_)));
        assert!(err.to_string().contains("twips_tolerance"));
    }

    #[test]
    fn test_rejects_out_of_range_size() {
        for size in ["0", "1639", "4294967295"] {
            let content = VALID.replace("run_size_pt = 12", &format!("run_size_pt = {size}"));
            let err = FormatPolicy::from_toml_str(&content).unwrap_err();
            assert!(err.to_string().contains("run_size_pt"), "size {size}");
        }
        let content = VALID.replace("run_size_pt = 12", "run_size_pt = 1638");
        assert!(FormatPolicy::from_toml_str(&content).is_ok());
    }

    #[test]
    fn test_rejects_inherited_numbering_mode() {
        let content = VALID.replace("numpr_direct_only = true", "numpr_direct_only = false");
        assert!(matches!(
            FormatPolicy::from_toml_str(&content),
            Err(PolicyError::Invalid(_))
        ));
    }

    #[test]
    fn test_json_policy_with_null_indent() {
        let json = r#"{
            "forbid_tables": false, "forbid_numpr": true, "numpr_direct_only": true,
            "run_font_latin": "A", "run_font_east_asia": "B", "run_size_pt": 11,
            "line_spacing_twips": 300, "first_line_indent_twips": null,
            "twips_tolerance": 0, "trim_leading_spaces": false, "trim_chars": []
        }"#;
        let policy = FormatPolicy::from_json_str(json).unwrap();
        assert_eq!(policy.first_line_indent_twips, None);
        assert_eq!(policy.twips_tolerance, 0);
    }

    #[test]
    fn test_missing_file_is_reported() {
        let err = FormatPolicy::from_file("/nonexistent/policy.toml").unwrap_err();
        assert!(err.to_string().contains("not found"));
    }

    #[test]
    fn test_tolerance_is_inclusive() {
        let policy = FormatPolicy::from_toml_str(VALID).unwrap();
        assert!(policy.within_tolerance(440, 420));
        assert!(policy.within_tolerance(400, 420));
        assert!(!policy.within_tolerance(441, 420));
    }
}
