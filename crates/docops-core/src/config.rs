//! Configuration file for the pipeline
//!
//! A TOML file selecting the format options, the policy file and the
//! declarative skills to register.

use anyhow::Context;
use format_engine::{FormatBaseline, FormatFixMode, FormatMode, FormatPolicy};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use template_engine::UnsupportedMode;

use crate::pipeline::{Preset, RunOptions};
use crate::skills::{MappingSkill, SkillError, SkillRegistry, SkillSpec};

/// Top-level configuration loaded from TOML files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocopsConfig {
    #[serde(default)]
    pub format: FormatConfig,
    #[serde(default)]
    pub skills: Vec<NamedSkillSpec>,
    /// Directory relative paths resolve against
    #[serde(skip)]
    base_dir: Option<PathBuf>,
}

/// Format stage selection; explicit fields override the preset
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FormatConfig {
    pub preset: Option<Preset>,
    pub mode: Option<FormatMode>,
    pub baseline: Option<FormatBaseline>,
    pub fix_mode: Option<FormatFixMode>,
    pub unsupported_mode: Option<UnsupportedMode>,
    /// Policy file (`.toml` or `.json`); the built-in policy when absent
    pub policy: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamedSkillSpec {
    pub name: String,
    #[serde(flatten)]
    pub spec: SkillSpec,
}

impl DocopsConfig {
    /// Load configuration from a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or the TOML is malformed
    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_str(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    /// Parse configuration from a TOML string
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> anyhow::Result<Self> {
        toml::from_str(s).context("Failed to parse TOML configuration")
    }

    pub fn run_options(&self) -> RunOptions {
        let format = &self.format;
        let mut options = format.preset.map(|p| p.options()).unwrap_or_default();
        if let Some(mode) = format.mode {
            options.format_mode = mode;
        }
        if let Some(baseline) = format.baseline {
            options.format_baseline = baseline;
        }
        if let Some(fix_mode) = format.fix_mode {
            options.format_fix_mode = fix_mode;
        }
        if let Some(unsupported_mode) = format.unsupported_mode {
            options.unsupported_mode = unsupported_mode;
        }
        options
    }

    /// Policy path as configured, resolved against the config file's directory
    pub fn policy_path(&self) -> Option<PathBuf> {
        let path = self.format.policy.as_ref()?;
        match &self.base_dir {
            Some(base) if path.is_relative() => Some(base.join(path)),
            _ => Some(path.clone()),
        }
    }

    pub fn load_policy(&self) -> anyhow::Result<FormatPolicy> {
        match self.policy_path() {
            Some(path) => FormatPolicy::from_file(&path)
                .with_context(|| format!("Failed to load format policy: {}", path.display())),
            None => FormatPolicy::builtin().context("Built-in format policy is invalid"),
        }
    }

    pub fn skill_registry(&self) -> Result<SkillRegistry, SkillError> {
        let mut registry = SkillRegistry::new();
        for named in &self.skills {
            registry.register(MappingSkill::new(named.name.clone(), named.spec.clone())?)?;
        }
        Ok(registry)
    }
}
