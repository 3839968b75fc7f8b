use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::schema::EntitySchema;
use crate::value::Value;

/// A validated set of field values bound to an entity schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    schema: Arc<EntitySchema>,
    data: BTreeMap<String, Value>,
}

impl Instance {
    /// Validate and store every supplied field.
    ///
    /// Fails on the first field that is not declared or whose value violates
    /// the field's constraints.
    pub fn new<I, K>(schema: &Arc<EntitySchema>, fields: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        let mut instance = Self {
            schema: Arc::clone(schema),
            data: BTreeMap::new(),
        };
        for (field, value) in fields {
            instance.set(field, value)?;
        }
        Ok(instance)
    }

    /// Rehydrate a result row keyed by the returned column names.
    pub fn from_row(schema: &Arc<EntitySchema>, columns: &[String], row: Vec<Value>) -> Result<Self> {
        Self::new(schema, columns.iter().cloned().zip(row))
    }

    pub fn schema(&self) -> &Arc<EntitySchema> {
        &self.schema
    }

    pub fn entity(&self) -> &str {
        self.schema.name()
    }

    /// Read a field; undeclared and never-set fields are errors.
    pub fn get(&self, field: &str) -> Result<&Value> {
        if !self.schema.has_column(field) {
            return Err(Error::unknown_field(self.entity(), field));
        }
        self.data.get(field).ok_or_else(|| Error::FieldNotSet {
            entity: self.entity().to_string(),
            field: field.to_string(),
        })
    }

    /// Write a field with the same validation as construction.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> Result<()> {
        let field = field.into();
        let descriptor = self
            .schema
            .column(&field)
            .ok_or_else(|| Error::unknown_field(self.schema.name(), field.as_str()))?;

        descriptor
            .validate(&value)
            .map_err(|violation| Error::ConstraintViolation {
                entity: self.schema.name().to_string(),
                field: field.clone(),
                violation,
            })?;

        let value = descriptor.normalize(value);
        self.data.insert(field, value);
        Ok(())
    }

    pub fn is_set(&self, field: &str) -> bool {
        self.data.contains_key(field)
    }

    /// Set fields in schema column order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.schema.columns().iter().filter_map(|column| {
            self.data
                .get(&column.name)
                .map(|value| (column.name.as_str(), value))
        })
    }
}

impl fmt::Display for Instance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.entity())?;
        for (index, (name, value)) in self.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{name}={value}")?;
        }
        f.write_str(")")
    }
}
