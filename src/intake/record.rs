//! The finished project record produced by a completed flow.

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};

use super::definition::FieldSpec;
use super::validator::FieldValue;

/// How a field value is rendered in the human-readable summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueFormat {
    #[default]
    Plain,
    /// A count of weeks, e.g. `8 weeks`.
    Weeks,
    /// A US dollar amount with thousands separators, e.g. `$10,000`.
    Usd,
}

impl ValueFormat {
    pub fn render(&self, value: &FieldValue) -> String {
        match (self, value) {
            (Self::Weeks, FieldValue::Integer(1)) => "1 week".to_string(),
            (Self::Weeks, v) => format!("{v} weeks"),
            (Self::Usd, FieldValue::Integer(n)) => format!("${}", group_thousands(*n)),
            (Self::Usd, v) => format!("${v}"),
            (Self::Plain, v) => v.to_string(),
        }
    }
}

fn group_thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if n < 0 {
        out.insert(0, '-');
    }
    out
}

/// One collected field in a finished record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordEntry {
    pub key: String,
    pub label: String,
    pub format: ValueFormat,
    pub value: FieldValue,
}

/// Every field of a flow, validated, in collection order.
///
/// Only built once all fields are present, and never mutated afterwards.
/// Serializes as a flat JSON object `{ key: value, .. }`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectRecord {
    entries: Vec<RecordEntry>,
}

impl ProjectRecord {
    pub(crate) fn from_entries(entries: Vec<(FieldSpec, FieldValue)>) -> Self {
        Self {
            entries: entries
                .into_iter()
                .map(|(spec, value)| RecordEntry {
                    key: spec.key,
                    label: spec.label,
                    format: spec.format,
                    value,
                })
                .collect(),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|e| e.key == key).map(|e| &e.value)
    }

    pub fn entries(&self) -> &[RecordEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Render the record as a markdown summary, one `label: value` per line.
    pub fn summary(&self) -> String {
        let mut parts = vec!["# Project Intake Summary".to_string()];
        for entry in &self.entries {
            parts.push(format!(
                "- **{}:** {}",
                entry.label,
                entry.format.render(&entry.value)
            ));
        }
        parts.join("\n")
    }
}

impl Serialize for ProjectRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.key, &entry.value)?;
        }
        map.end()
    }
}
