//! Template rendering pipeline
//!
//! Chains placeholder rendering with format policy reconciliation, fixing and
//! validation. Skills map a task payload to template fields; configuration
//! selects presets, the policy file and the registered skills.

pub mod config;
pub mod errors;
pub mod pipeline;
pub mod skills;
pub mod telemetry;

pub use config::{DocopsConfig, FormatConfig, NamedSkillSpec};
pub use errors::PipelineError;
pub use pipeline::{run_skill_task, run_task, Preset, RunOptions};
pub use skills::{MappingSkill, Skill, SkillError, SkillRegistry, SkillSpec, TaskSpec};
pub use telemetry::init_tracing;

pub use format_engine::{FormatBaseline, FormatFixMode, FormatMode, FormatPolicy, FormatReport};
pub use shared_types::{Document, FieldSet};
pub use template_engine::{compute_template_fingerprint, RenderOutput, UnsupportedMode};
