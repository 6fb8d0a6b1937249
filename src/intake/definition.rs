//! Flow definitions: the ordered list of fields a conversation collects.

use std::collections::{BTreeMap, HashSet};

use serde::Serialize;

use super::record::{ProjectRecord, ValueFormat};
use super::validator::{FieldRule, FieldValue, ValidationRejected};
use crate::error::FlowDefinitionError;

/// Substituted for a `[key]` placeholder whose value has not been collected.
const PLACEHOLDER_FALLBACK: &str = "there";

/// Description of one required field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldSpec {
    /// Record key the validated value is stored under.
    pub key: String,
    /// Human-readable name, used in rejection reasons and summaries.
    pub label: String,
    /// Question shown to the user. May contain `[key]` placeholders.
    pub prompt: String,
    /// Example input for UIs.
    pub placeholder: String,
    pub rule: FieldRule,
    /// Rendering used in the completion summary.
    pub format: ValueFormat,
}

impl FieldSpec {
    pub fn new(
        key: impl Into<String>,
        label: impl Into<String>,
        prompt: impl Into<String>,
        rule: FieldRule,
    ) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            prompt: prompt.into(),
            placeholder: String::new(),
            rule,
            format: ValueFormat::Plain,
        }
    }

    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = placeholder.into();
        self
    }

    pub fn with_format(mut self, format: ValueFormat) -> Self {
        self.format = format;
        self
    }

    /// Validate raw user text for this field.
    pub fn validate(&self, raw: &str) -> Result<FieldValue, ValidationRejected> {
        self.rule.apply(&self.label, raw)
    }
}

/// Ordered, immutable sequence of fields. Keys are unique.
#[derive(Debug, Clone, Serialize)]
pub struct FlowDefinition {
    fields: Vec<FieldSpec>,
}

impl FlowDefinition {
    /// Build a definition, rejecting empty field lists and duplicate keys.
    pub fn new(fields: Vec<FieldSpec>) -> Result<Self, FlowDefinitionError> {
        if fields.is_empty() {
            return Err(FlowDefinitionError::Empty);
        }
        let mut seen = HashSet::new();
        for field in &fields {
            if !seen.insert(field.key.as_str()) {
                return Err(FlowDefinitionError::DuplicateKey(field.key.clone()));
            }
        }
        Ok(Self { fields })
    }

    /// The project intake flow: name, project type, duration, budget.
    pub fn project_intake() -> Self {
        Self {
            fields: vec![
                FieldSpec::new(
                    "name",
                    "Client Name",
                    "Welcome! To start, what is your **full name**?",
                    FieldRule::MinChars { min: 3 },
                )
                .with_placeholder("e.g., Alex Johnson"),
                FieldSpec::new(
                    "projectType",
                    "Project Type",
                    "Thanks, [name]! What **type of project** are you planning?",
                    FieldRule::MinWords { min: 2 },
                )
                .with_placeholder("e.g., Web App, Data Analysis, Chatbot"),
                FieldSpec::new(
                    "duration",
                    "Estimated Duration",
                    "Approximately how many **weeks** will the project take?",
                    FieldRule::POSITIVE_INTEGER,
                )
                .with_placeholder("e.g., 8")
                .with_format(ValueFormat::Weeks),
                FieldSpec::new(
                    "budget",
                    "Approximate Budget",
                    "What is the approximate **budget** for this project (in USD)?",
                    FieldRule::POSITIVE_INTEGER,
                )
                .with_placeholder("e.g., 10000")
                .with_format(ValueFormat::Usd),
            ],
        }
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&FieldSpec> {
        self.fields.get(index)
    }

    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// Render the prompt for field `index`, filling `[key]` placeholders from
    /// the values collected so far.
    pub fn render_prompt(
        &self,
        index: usize,
        collected: &BTreeMap<String, FieldValue>,
    ) -> Option<String> {
        let field = self.fields.get(index)?;
        let mut prompt = field.prompt.clone();
        for spec in &self.fields {
            let token = format!("[{}]", spec.key);
            if !prompt.contains(&token) {
                continue;
            }
            let value = collected
                .get(&spec.key)
                .map(|v| v.to_string())
                .unwrap_or_else(|| PLACEHOLDER_FALLBACK.to_string());
            prompt = prompt.replace(&token, &value);
        }
        Some(prompt)
    }

    /// Assemble the finished record. Fails if any field is still missing.
    pub fn build_record(
        &self,
        collected: &BTreeMap<String, FieldValue>,
    ) -> Result<ProjectRecord, FlowDefinitionError> {
        let mut entries = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let value = collected
                .get(&field.key)
                .ok_or_else(|| FlowDefinitionError::MissingValue {
                    key: field.key.clone(),
                })?;
            entries.push((field.clone(), value.clone()));
        }
        Ok(ProjectRecord::from_entries(entries))
    }
}

impl Default for FlowDefinition {
    fn default() -> Self {
        Self::project_intake()
    }
}
