use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graph;
use crate::instance::Instance;
use crate::schema::EntitySchema;
use crate::validation;
use crate::value::Value;

/// Entity schemas keyed by table name.
///
/// Populated by explicit registration, typically at start-up, and read-only
/// once handed to a [`Store`](crate::store::Store).
#[derive(Debug, Clone, Default)]
pub struct Registry {
    entities: BTreeMap<String, Arc<EntitySchema>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a schema together with its many-to-many junction schemas.
    pub fn register(&mut self, schema: EntitySchema) -> Result<Arc<EntitySchema>> {
        let junctions = schema.junction_schemas();

        for candidate in std::iter::once(&schema).chain(junctions.iter()) {
            let table = candidate.table_name();
            if self.entities.contains_key(&table) {
                return Err(Error::schema(
                    candidate.name(),
                    format!("table `{table}` is already registered"),
                ));
            }
        }

        let schema = Arc::new(schema);
        self.entities.insert(schema.table_name(), Arc::clone(&schema));
        for junction in junctions {
            self.entities.insert(junction.table_name(), Arc::new(junction));
        }

        tracing::debug!(
            event = "entity_registered",
            entity = %schema.name(),
            columns = schema.columns().len(),
            many_to_many = schema.many_to_many().len()
        );

        Ok(schema)
    }

    /// Parse a textual declaration and register the result.
    pub fn declare(&mut self, name: &str, declaration: &str) -> Result<Arc<EntitySchema>> {
        self.register(EntitySchema::parse(name, declaration)?)
    }

    /// Look up a schema by entity or table name, ignoring case.
    pub fn schema(&self, name: &str) -> Result<&Arc<EntitySchema>> {
        self.entities
            .get(&name.to_lowercase())
            .ok_or_else(|| Error::UnknownEntity(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entities.contains_key(&name.to_lowercase())
    }

    /// Build a validated instance of a registered entity.
    pub fn instance<I, K>(&self, name: &str, fields: I) -> Result<Instance>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: Into<String>,
    {
        Instance::new(self.schema(name)?, fields)
    }

    /// Registered schemas ordered by table name.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<EntitySchema>> {
        self.entities.values()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Ensure every foreign key and many-to-many target is registered.
    pub fn validate_references(&self) -> Result<()> {
        validation::validate_references(self)
    }

    /// Schemas ordered so that referenced tables come before their referrers.
    pub fn creation_order(&self) -> Result<Vec<&Arc<EntitySchema>>> {
        let graph = graph::build_dependency_graph(self);
        let order = graph::creation_order(&graph).map_err(|cycle| {
            Error::schema(
                cycle.first().cloned().unwrap_or_default(),
                format!("foreign keys form a cycle between {}", cycle.join(", ")),
            )
        })?;

        Ok(order
            .iter()
            .filter_map(|table| self.entities.get(table))
            .collect())
    }
}
