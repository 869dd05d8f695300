//! Skills turn a task payload into a field set for one document type.
//!
//! Concrete skills are declarative: a [`SkillSpec`] maps payload keys to
//! template placeholders, and [`MappingSkill`] applies it.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use shared_types::FieldSet;
use template_engine::is_valid_field_name;
use thiserror::Error;

const LIST_SEPARATOR: &str = ", ";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SkillError {
    #[error("Task type '{actual}' does not match skill '{expected}'")]
    TaskTypeMismatch { expected: String, actual: String },

    #[error("Invalid placeholder '{placeholder}' for payload key '{key}'")]
    InvalidPlaceholder { key: String, placeholder: String },

    #[error("Placeholder '{0}' is mapped more than once")]
    DuplicatePlaceholder(String),

    #[error("Payload key '{0}' is declared but not mapped")]
    UnmappedKey(String),

    #[error("Skill '{0}' is already registered")]
    DuplicateSkill(String),

    #[error("Unknown skill: {0}")]
    UnknownSkill(String),
}

/// One unit of work: which document type, and its raw payload
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskSpec {
    pub task_type: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
}

impl TaskSpec {
    pub fn new(task_type: impl Into<String>) -> Self {
        Self {
            task_type: task_type.into(),
            payload: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.payload.insert(key.to_string(), value.into());
        self
    }
}

/// Builds the renderer's field set for one document type
pub trait Skill: Send + Sync {
    fn name(&self) -> &str;

    fn build_fields(&self, task: &TaskSpec) -> Result<FieldSet, SkillError>;
}

/// Declarative payload-to-placeholder mapping
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkillSpec {
    /// payload key -> PLACEHOLDER
    pub mapping: BTreeMap<String, String>,
    #[serde(default)]
    pub required_payload_keys: Vec<String>,
    /// Keys whose array values are joined into one string
    #[serde(default)]
    pub list_payload_keys: Vec<String>,
}

impl SkillSpec {
    pub fn validate(&self) -> Result<(), SkillError> {
        let mut seen = BTreeSet::new();
        for (key, placeholder) in &self.mapping {
            if !is_valid_field_name(placeholder) {
                return Err(SkillError::InvalidPlaceholder {
                    key: key.clone(),
                    placeholder: placeholder.clone(),
                });
            }
            if !seen.insert(placeholder.as_str()) {
                return Err(SkillError::DuplicatePlaceholder(placeholder.clone()));
            }
        }

        let declared = self
            .required_payload_keys
            .iter()
            .chain(&self.list_payload_keys);
        for key in declared {
            if !self.mapping.contains_key(key) {
                return Err(SkillError::UnmappedKey(key.clone()));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappingSkill {
    name: String,
    spec: SkillSpec,
}

impl MappingSkill {
    pub fn new(name: impl Into<String>, spec: SkillSpec) -> Result<Self, SkillError> {
        spec.validate()?;
        Ok(Self {
            name: name.into(),
            spec,
        })
    }

    pub fn spec(&self) -> &SkillSpec {
        &self.spec
    }

    fn value_text(&self, key: &str, value: &Value) -> Option<String> {
        match value {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            Value::Array(items) if self.spec.list_payload_keys.iter().any(|k| k == key) => Some(
                items
                    .iter()
                    .filter_map(|item| match item {
                        Value::Null => None,
                        Value::String(text) => Some(text.clone()),
                        other => Some(other.to_string()),
                    })
                    .collect::<Vec<_>>()
                    .join(LIST_SEPARATOR),
            ),
            other => Some(other.to_string()),
        }
    }
}

impl Skill for MappingSkill {
    fn name(&self) -> &str {
        &self.name
    }

    fn build_fields(&self, task: &TaskSpec) -> Result<FieldSet, SkillError> {
        if task.task_type != self.name {
            return Err(SkillError::TaskTypeMismatch {
                expected: self.name.clone(),
                actual: task.task_type.clone(),
            });
        }

        let mut fields = FieldSet::new();
        for (key, placeholder) in &self.spec.mapping {
            if self.spec.required_payload_keys.contains(key) {
                fields.required_fields.insert(placeholder.clone());
            } else {
                fields.optional_fields.insert(placeholder.clone());
            }

            let text = task
                .payload
                .get(key)
                .and_then(|value| self.value_text(key, value));
            if let Some(text) = text {
                fields.field_values.insert(placeholder.clone(), text);
            }
        }
        Ok(fields)
    }
}

/// Skills by name
#[derive(Default)]
pub struct SkillRegistry {
    skills: BTreeMap<String, Arc<dyn Skill>>,
}

impl SkillRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, skill: impl Skill + 'static) -> Result<(), SkillError> {
        let name = skill.name().to_string();
        if self.skills.contains_key(&name) {
            return Err(SkillError::DuplicateSkill(name));
        }
        self.skills.insert(name, Arc::new(skill));
        Ok(())
    }

    pub fn create(&self, name: &str) -> Result<Arc<dyn Skill>, SkillError> {
        self.skills
            .get(name)
            .cloned()
            .ok_or_else(|| SkillError::UnknownSkill(name.to_string()))
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<&str> {
        self.skills.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for SkillRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SkillRegistry")
            .field("skills", &self.names())
            .finish()
    }
}
