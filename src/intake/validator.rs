//! Field validation rules.
//!
//! Each field in a flow carries one declarative [`FieldRule`]. Applying a rule
//! to raw user text either yields a normalized [`FieldValue`] or a
//! [`ValidationRejected`] carrying a reason that can be shown to the user.

use std::num::IntErrorKind;

use serde::{Deserialize, Serialize};

/// A validated, normalized field value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Integer(i64),
    Text(String),
}

impl std::fmt::Display for FieldValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer(n) => write!(f, "{n}"),
            Self::Text(s) => write!(f, "{s}"),
        }
    }
}

/// User input failed a field rule. Recovered locally by re-asking.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct ValidationRejected {
    pub reason: String,
}

impl ValidationRejected {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

/// Declarative validation rule for a single field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum FieldRule {
    /// Trimmed text must have at least this many characters.
    MinChars { min: usize },
    /// Text must contain at least this many whitespace-separated words.
    MinWords { min: usize },
    /// Text must parse as an integer strictly greater than `min`.
    IntegerAbove { min: i64 },
}

impl FieldRule {
    /// Integer strictly greater than zero.
    pub const POSITIVE_INTEGER: FieldRule = FieldRule::IntegerAbove { min: 0 };

    /// Check `raw` against this rule. `label` names the field in the reason.
    ///
    /// Pure: no side effects, same input always gives the same answer.
    pub fn apply(&self, label: &str, raw: &str) -> Result<FieldValue, ValidationRejected> {
        let text = raw.trim();
        match *self {
            FieldRule::MinChars { min } => {
                if text.chars().count() < min {
                    return Err(ValidationRejected::new(format!(
                        "{label} must be at least {min} characters long."
                    )));
                }
                Ok(FieldValue::Text(text.to_string()))
            }
            FieldRule::MinWords { min } => {
                if text.split_whitespace().count() < min {
                    let unit = if min == 1 { "word" } else { "words" };
                    return Err(ValidationRejected::new(format!(
                        "{label} must be described in at least {min} {unit}."
                    )));
                }
                Ok(FieldValue::Text(text.to_string()))
            }
            FieldRule::IntegerAbove { min } => {
                let n: i64 = text.parse().map_err(|e: std::num::ParseIntError| {
                    ValidationRejected::new(match e.kind() {
                        IntErrorKind::PosOverflow => format!("{label} is too large."),
                        IntErrorKind::NegOverflow if min >= 0 => {
                            format!("{label} must be a positive number.")
                        }
                        _ => format!("{label} must be a valid integer."),
                    })
                })?;
                if n <= min {
                    let reason = if min == 0 {
                        format!("{label} must be a positive number.")
                    } else {
                        format!("{label} must be greater than {min}.")
                    };
                    return Err(ValidationRejected::new(reason));
                }
                Ok(FieldValue::Integer(n))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NAME: FieldRule = FieldRule::MinChars { min: 3 };
    const PROJECT_TYPE: FieldRule = FieldRule::MinWords { min: 2 };

    #[test]
    fn name_needs_three_chars() {
        assert!(NAME.apply("Name", "Al").is_err());
        assert_eq!(
            NAME.apply("Name", "Ana").unwrap(),
            FieldValue::Text("Ana".into())
        );
    }

    #[test]
    fn name_length_ignores_surrounding_whitespace() {
        assert!(NAME.apply("Name", "  Al  ").is_err());
        assert_eq!(
            NAME.apply("Name", "  Ana ").unwrap(),
            FieldValue::Text("Ana".into())
        );
    }

    #[test]
    fn name_counts_chars_not_bytes() {
        // Two chars, four bytes
        assert!(NAME.apply("Name", "Éé").is_err());
    }

    #[test]
    fn project_type_needs_two_words() {
        let err = PROJECT_TYPE.apply("Project type", "App").unwrap_err();
        assert_eq!(
            err.reason,
            "Project type must be described in at least 2 words."
        );
        assert_eq!(
            PROJECT_TYPE.apply("Project type", "Mobile App").unwrap(),
            FieldValue::Text("Mobile App".into())
        );
    }

    #[test]
    fn positive_integer_rejects_negative_and_garbage() {
        let rule = FieldRule::POSITIVE_INTEGER;
        assert_eq!(
            rule.apply("Duration", "-5").unwrap_err().reason,
            "Duration must be a positive number."
        );
        assert_eq!(
            rule.apply("Duration", "abc").unwrap_err().reason,
            "Duration must be a valid integer."
        );
        assert!(rule.apply("Duration", "0").is_err());
        assert!(rule.apply("Duration", "1.5").is_err());
        assert_eq!(rule.apply("Duration", "12").unwrap(), FieldValue::Integer(12));
        assert_eq!(rule.apply("Duration", " 12 ").unwrap(), FieldValue::Integer(12));
    }

    #[test]
    fn oversized_integers_are_too_large_not_invalid() {
        let rule = FieldRule::POSITIVE_INTEGER;
        assert_eq!(
            rule.apply("Approximate Budget", "9223372036854775808")
                .unwrap_err()
                .reason,
            "Approximate Budget is too large."
        );
        assert_eq!(
            rule.apply("Approximate Budget", "-9223372036854775809")
                .unwrap_err()
                .reason,
            "Approximate Budget must be a positive number."
        );
        assert_eq!(
            rule.apply("Approximate Budget", "9223372036854775807").unwrap(),
            FieldValue::Integer(i64::MAX)
        );
    }

    #[test]
    fn integer_above_custom_floor() {
        let rule = FieldRule::IntegerAbove { min: 100 };
        assert_eq!(
            rule.apply("Budget", "100").unwrap_err().reason,
            "Budget must be greater than 100."
        );
        assert_eq!(rule.apply("Budget", "101").unwrap(), FieldValue::Integer(101));
    }

    #[test]
    fn field_value_serializes_untagged() {
        assert_eq!(serde_json::to_value(FieldValue::Integer(12)).unwrap(), 12);
        assert_eq!(
            serde_json::to_value(FieldValue::Text("Ana".into())).unwrap(),
            "Ana"
        );
    }
}
