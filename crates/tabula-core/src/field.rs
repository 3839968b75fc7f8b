use std::collections::BTreeMap;
use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// Default `VARCHAR` length for char fields declared without `max_length`.
pub const DEFAULT_MAX_LENGTH: usize = 255;

/// Storage kind of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Integer,
    Char,
    Float,
    ForeignKey,
}

/// Integer column with optional inclusive bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct IntegerField {
    pub primary_key: bool,
    /// Values are generated by the store when omitted from an insert.
    pub auto_increment: bool,
    pub min_value: Option<i64>,
    pub max_value: Option<i64>,
}

/// Variable-length text column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CharField {
    pub primary_key: bool,
    pub max_length: usize,
    /// Exact number of whitespace-separated words required.
    pub words_count: Option<usize>,
}

impl Default for CharField {
    fn default() -> Self {
        Self {
            primary_key: false,
            max_length: DEFAULT_MAX_LENGTH,
            words_count: None,
        }
    }
}

/// Floating point column with optional inclusive bounds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FloatField {
    pub primary_key: bool,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// Integer column referencing the `id` column of another entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ForeignKeyField {
    /// Name of the referenced entity.
    pub to: String,
}

/// Type and constraints of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldDescriptor {
    Integer(IntegerField),
    Char(CharField),
    Float(FloatField),
    ForeignKey(ForeignKeyField),
}

impl FieldDescriptor {
    pub fn integer() -> Self {
        FieldDescriptor::Integer(IntegerField::default())
    }

    pub fn char(max_length: usize) -> Self {
        FieldDescriptor::Char(CharField {
            max_length,
            ..CharField::default()
        })
    }

    pub fn float() -> Self {
        FieldDescriptor::Float(FloatField::default())
    }

    pub fn foreign_key(to: impl Into<String>) -> Self {
        FieldDescriptor::ForeignKey(ForeignKeyField { to: to.into() })
    }

    /// Mark the field as part of the primary key. No-op for foreign keys.
    pub fn primary_key(mut self) -> Self {
        match &mut self {
            FieldDescriptor::Integer(field) => field.primary_key = true,
            FieldDescriptor::Char(field) => field.primary_key = true,
            FieldDescriptor::Float(field) => field.primary_key = true,
            FieldDescriptor::ForeignKey(_) => {}
        }
        self
    }

    pub fn kind(&self) -> FieldKind {
        match self {
            FieldDescriptor::Integer(_) => FieldKind::Integer,
            FieldDescriptor::Char(_) => FieldKind::Char,
            FieldDescriptor::Float(_) => FieldKind::Float,
            FieldDescriptor::ForeignKey(_) => FieldKind::ForeignKey,
        }
    }

    pub fn is_primary_key(&self) -> bool {
        match self {
            FieldDescriptor::Integer(field) => field.primary_key,
            FieldDescriptor::Char(field) => field.primary_key,
            FieldDescriptor::Float(field) => field.primary_key,
            FieldDescriptor::ForeignKey(_) => false,
        }
    }

    pub fn is_auto_increment(&self) -> bool {
        matches!(self, FieldDescriptor::Integer(field) if field.auto_increment)
    }

    /// Name of the referenced entity for foreign keys.
    pub fn foreign_key_target(&self) -> Option<&str> {
        match self {
            FieldDescriptor::ForeignKey(field) => Some(&field.to),
            _ => None,
        }
    }

    /// Column type used in `CREATE TABLE`.
    pub fn sql_type(&self) -> String {
        match self {
            FieldDescriptor::Integer(field) if field.auto_increment => {
                "INTEGER GENERATED BY DEFAULT AS IDENTITY".to_string()
            }
            FieldDescriptor::Integer(_) | FieldDescriptor::ForeignKey(_) => "INTEGER".to_string(),
            FieldDescriptor::Char(field) => format!("VARCHAR({})", field.max_length),
            FieldDescriptor::Float(_) => "FLOAT".to_string(),
        }
    }

    /// Declared value constraints keyed by name.
    pub fn constraints(&self) -> BTreeMap<&'static str, Value> {
        let mut constraints = BTreeMap::new();
        match self {
            FieldDescriptor::Integer(field) => {
                if let Some(min) = field.min_value {
                    constraints.insert("min_value", Value::Integer(min));
                }
                if let Some(max) = field.max_value {
                    constraints.insert("max_value", Value::Integer(max));
                }
            }
            FieldDescriptor::Float(field) => {
                if let Some(min) = field.min_value {
                    constraints.insert("min_value", Value::Float(min));
                }
                if let Some(max) = field.max_value {
                    constraints.insert("max_value", Value::Float(max));
                }
            }
            FieldDescriptor::Char(field) => {
                constraints.insert("max_length", Value::Integer(field.max_length as i64));
                if let Some(words) = field.words_count {
                    constraints.insert("words_count", Value::Integer(words as i64));
                }
            }
            FieldDescriptor::ForeignKey(_) => {}
        }
        constraints
    }

    /// Check a candidate value against the descriptor. `Null` is always accepted.
    pub fn validate(&self, value: &Value) -> Result<(), Violation> {
        if value.is_null() {
            return Ok(());
        }

        match self {
            FieldDescriptor::Integer(field) => {
                let number = value.as_i64().ok_or_else(|| wrong_type("integer", value))?;
                if let Some(min) = field.min_value.filter(|min| number < *min) {
                    return Err(Violation::BelowMin {
                        min: Value::Integer(min),
                        actual: value.clone(),
                    });
                }
                if let Some(max) = field.max_value.filter(|max| number > *max) {
                    return Err(Violation::AboveMax {
                        max: Value::Integer(max),
                        actual: value.clone(),
                    });
                }
                Ok(())
            }
            FieldDescriptor::Float(field) => {
                let number = value.as_f64().ok_or_else(|| wrong_type("float", value))?;
                let bounded = field.min_value.is_some() || field.max_value.is_some();
                if bounded && !number.is_finite() {
                    return Err(Violation::NotFinite {
                        actual: value.clone(),
                    });
                }
                if let Some(min) = field.min_value.filter(|min| number < *min) {
                    return Err(Violation::BelowMin {
                        min: Value::Float(min),
                        actual: value.clone(),
                    });
                }
                if let Some(max) = field.max_value.filter(|max| number > *max) {
                    return Err(Violation::AboveMax {
                        max: Value::Float(max),
                        actual: value.clone(),
                    });
                }
                Ok(())
            }
            FieldDescriptor::Char(field) => {
                let text = value.as_str().ok_or_else(|| wrong_type("text", value))?;
                if let Some(expected) = field.words_count {
                    let actual = text.split_whitespace().count();
                    if actual != expected {
                        return Err(Violation::WordCount { expected, actual });
                    }
                }
                let length = text.chars().count();
                if length > field.max_length {
                    return Err(Violation::TooLong {
                        max_length: field.max_length,
                        actual: length,
                    });
                }
                Ok(())
            }
            FieldDescriptor::ForeignKey(_) => {
                value.as_i64().ok_or_else(|| wrong_type("integer", value))?;
                Ok(())
            }
        }
    }

    /// The value as it is stored: integers bound for a float column become floats.
    pub fn normalize(&self, value: Value) -> Value {
        match (self, value) {
            (FieldDescriptor::Float(_), Value::Integer(number)) => Value::Float(number as f64),
            (_, value) => value,
        }
    }
}

fn wrong_type(expected: &'static str, value: &Value) -> Violation {
    Violation::WrongType {
        expected,
        actual: value.type_name(),
    }
}

/// The bound a value failed to satisfy.
#[derive(Debug, Clone, PartialEq)]
pub enum Violation {
    BelowMin { min: Value, actual: Value },
    AboveMax { max: Value, actual: Value },
    WordCount { expected: usize, actual: usize },
    TooLong { max_length: usize, actual: usize },
    WrongType { expected: &'static str, actual: &'static str },
    NotFinite { actual: Value },
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::BelowMin { min, actual } => {
                write!(f, "must be greater than or equal to {min}, got {actual}")
            }
            Violation::AboveMax { max, actual } => {
                write!(f, "must be less than or equal to {max}, got {actual}")
            }
            Violation::WordCount { expected, actual } => {
                write!(f, "must consist of {expected} words, got {actual}")
            }
            Violation::TooLong { max_length, actual } => {
                write!(f, "must not exceed {max_length} characters, got {actual}")
            }
            Violation::WrongType { expected, actual } => {
                write!(f, "expects a {expected} value, got {actual}")
            }
            Violation::NotFinite { actual } => write!(f, "must be a finite number, got {actual}"),
        }
    }
}
