use thiserror::Error;

use crate::field::Violation;

/// Core error type shared across Tabula crates.
#[derive(Debug, Error)]
pub enum Error {
    /// A declaration is malformed or the registry is inconsistent.
    #[error("schema error in `{entity}`: {message}")]
    Schema { entity: String, message: String },
    /// No entity with this name has been registered.
    #[error("unknown entity: {0}")]
    UnknownEntity(String),
    /// The field is not a declared column of the entity.
    #[error("`{entity}` has no field `{field}`")]
    UnknownField { entity: String, field: String },
    /// The field is declared but was never given a value.
    #[error("field `{entity}.{field}` is not set")]
    FieldNotSet { entity: String, field: String },
    /// A value falls outside the bounds declared for its field.
    #[error("field `{entity}.{field}` {violation}")]
    ConstraintViolation {
        entity: String,
        field: String,
        violation: Violation,
    },
    /// The store could not be reached.
    #[error("connection error: {0}")]
    Connection(String),
    /// The store rejected or failed a statement.
    #[error("statement error: {0}")]
    Statement(String),
}

impl Error {
    pub(crate) fn schema(entity: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Schema {
            entity: entity.into(),
            message: message.into(),
        }
    }

    pub(crate) fn unknown_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Error::UnknownField {
            entity: entity.into(),
            field: field.into(),
        }
    }
}

/// Convenience alias for results returned by Tabula crates.
pub type Result<T> = std::result::Result<T, Error>;
