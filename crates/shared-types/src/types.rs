use std::collections::{BTreeMap, BTreeSet};

/// Field values plus the required/optional field sets supplied for one task
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldSet {
    #[serde(default)]
    pub field_values: BTreeMap<String, String>, // PLACEHOLDER -> replacement text
    #[serde(default)]
    pub required_fields: BTreeSet<String>,
    #[serde(default)]
    pub optional_fields: BTreeSet<String>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, field: &str, value: &str) -> Self {
        self.field_values.insert(field.to_string(), value.to_string());
        self
    }

    pub fn require(mut self, field: &str) -> Self {
        self.required_fields.insert(field.to_string());
        self
    }

    pub fn allow(mut self, field: &str) -> Self {
        self.optional_fields.insert(field.to_string());
        self
    }

    pub fn value(&self, field: &str) -> Option<&str> {
        self.field_values.get(field).map(String::as_str)
    }
}
