use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::field::{FieldDescriptor, IntegerField};
use crate::parse;

/// A named column of an entity.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct Column {
    pub name: String,
    pub field: FieldDescriptor,
}

/// A many-to-many relation declared on an entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct ManyToMany {
    /// Field name used in the declaration.
    pub field: String,
    /// Name of the related entity.
    pub to: String,
}

/// Columns and relations of one entity, in declaration order.
///
/// Built once through [`EntitySchema::parse`] or [`EntitySchema::builder`]
/// and immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, JsonSchema)]
pub struct EntitySchema {
    name: String,
    columns: Vec<Column>,
    many_to_many: Vec<ManyToMany>,
}

impl EntitySchema {
    /// Parse a textual declaration, one `name: Kind(args)` per line.
    pub fn parse(name: &str, declaration: &str) -> Result<Self> {
        let parsed = parse::parse_fields(name, declaration)?;
        let mut builder = Self::builder(name);
        builder.columns = parsed.columns;
        builder.many_to_many = parsed.many_to_many;
        builder.build()
    }

    pub fn builder(name: impl Into<String>) -> EntitySchemaBuilder {
        EntitySchemaBuilder {
            name: name.into(),
            columns: Vec::new(),
            many_to_many: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Table name: the entity name lower-cased.
    pub fn table_name(&self) -> String {
        self.name.to_lowercase()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&FieldDescriptor> {
        self.columns
            .iter()
            .find(|column| column.name == name)
            .map(|column| &column.field)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    pub fn many_to_many(&self) -> &[ManyToMany] {
        &self.many_to_many
    }

    /// Primary key columns in declaration order.
    pub fn primary_key(&self) -> Vec<&str> {
        self.columns
            .iter()
            .filter(|column| column.field.is_primary_key())
            .map(|column| column.name.as_str())
            .collect()
    }

    /// Name of the junction table linking this entity to `related`.
    pub fn junction_table_name(&self, related: &str) -> String {
        format!("{}_has_{}", self.table_name(), related.to_lowercase())
    }

    /// Synthetic schemas backing the many-to-many relations.
    pub fn junction_schemas(&self) -> Vec<EntitySchema> {
        let owner = self.table_name();
        self.many_to_many
            .iter()
            .map(|relation| {
                let related = relation.to.to_lowercase();
                EntitySchema {
                    name: self.junction_table_name(&relation.to),
                    columns: vec![
                        Column {
                            name: "id".to_string(),
                            field: FieldDescriptor::Integer(IntegerField {
                                primary_key: true,
                                auto_increment: true,
                                ..IntegerField::default()
                            }),
                        },
                        Column {
                            name: format!("{owner}_id"),
                            field: FieldDescriptor::foreign_key(self.name.clone()),
                        },
                        Column {
                            name: format!("{related}_id"),
                            field: FieldDescriptor::foreign_key(relation.to.clone()),
                        },
                    ],
                    many_to_many: Vec::new(),
                }
            })
            .collect()
    }
}

/// Programmatic construction of an [`EntitySchema`].
#[derive(Debug, Clone)]
pub struct EntitySchemaBuilder {
    name: String,
    columns: Vec<Column>,
    many_to_many: Vec<ManyToMany>,
}

impl EntitySchemaBuilder {
    pub fn field(mut self, name: impl Into<String>, field: FieldDescriptor) -> Self {
        self.columns.push(Column {
            name: name.into(),
            field,
        });
        self
    }

    pub fn many_to_many(mut self, field: impl Into<String>, to: impl Into<String>) -> Self {
        self.many_to_many.push(ManyToMany {
            field: field.into(),
            to: to.into(),
        });
        self
    }

    /// Check identifiers, duplicates and bounds, then freeze the schema.
    pub fn build(self) -> Result<EntitySchema> {
        let entity = self.name.as_str();
        if !is_identifier(entity) {
            return Err(Error::schema(entity, "entity name is not a valid identifier"));
        }

        let mut seen = BTreeSet::new();
        let field_names = self
            .columns
            .iter()
            .map(|column| column.name.as_str())
            .chain(self.many_to_many.iter().map(|relation| relation.field.as_str()));
        for name in field_names {
            if !is_identifier(name) {
                return Err(Error::schema(
                    entity,
                    format!("field name `{name}` is not a valid identifier"),
                ));
            }
            if !seen.insert(name) {
                return Err(Error::schema(entity, format!("duplicate field `{name}`")));
            }
        }

        for column in &self.columns {
            check_field(entity, &column.name, &column.field)?;
        }

        let mut junctions = BTreeSet::new();
        for relation in &self.many_to_many {
            if !is_identifier(&relation.to) {
                return Err(Error::schema(
                    entity,
                    format!("`{}` references invalid entity `{}`", relation.field, relation.to),
                ));
            }
            if relation.to.eq_ignore_ascii_case(entity) {
                return Err(Error::schema(
                    entity,
                    format!("`{}` is a self-referential many-to-many relation", relation.field),
                ));
            }
            if !junctions.insert(relation.to.to_lowercase()) {
                return Err(Error::schema(
                    entity,
                    format!("more than one many-to-many relation to `{}`", relation.to),
                ));
            }
        }

        Ok(EntitySchema {
            name: self.name,
            columns: self.columns,
            many_to_many: self.many_to_many,
        })
    }
}

fn check_field(entity: &str, name: &str, field: &FieldDescriptor) -> Result<()> {
    match field {
        FieldDescriptor::Integer(integer) => {
            if let (Some(min), Some(max)) = (integer.min_value, integer.max_value) {
                if min > max {
                    return Err(Error::schema(
                        entity,
                        format!("`{name}` has min_value {min} greater than max_value {max}"),
                    ));
                }
            }
        }
        FieldDescriptor::Float(float) => {
            if let (Some(min), Some(max)) = (float.min_value, float.max_value) {
                if min > max {
                    return Err(Error::schema(
                        entity,
                        format!("`{name}` has min_value {min} greater than max_value {max}"),
                    ));
                }
            }
        }
        FieldDescriptor::Char(text) => {
            if text.max_length == 0 {
                return Err(Error::schema(
                    entity,
                    format!("`{name}` must have a positive max_length"),
                ));
            }
        }
        FieldDescriptor::ForeignKey(foreign) => {
            if !is_identifier(&foreign.to) {
                return Err(Error::schema(
                    entity,
                    format!("`{name}` references invalid entity `{}`", foreign.to),
                ));
            }
        }
    }
    Ok(())
}

/// ASCII identifier: a letter or `_` followed by letters, digits or `_`.
pub fn is_identifier(value: &str) -> bool {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() || first == '_' => {
            chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        }
        _ => false,
    }
}
