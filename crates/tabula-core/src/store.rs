use std::sync::Arc;

use crate::ddl;
use crate::dml::{self, Statement};
use crate::error::Result;
use crate::executor::{Executor, RowSet};
use crate::instance::Instance;
use crate::registry::Registry;
use crate::schema::EntitySchema;
use crate::value::Value;

/// Persistence operations over a registry of entities and an executor.
#[derive(Debug)]
pub struct Store<E> {
    registry: Registry,
    executor: E,
}

impl<E: Executor> Store<E> {
    pub fn new(registry: Registry, executor: E) -> Self {
        Self { registry, executor }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Insert the instance as a new row.
    pub fn save(&self, instance: &Instance) -> Result<()> {
        let statement = dml::insert(instance)?;
        self.executor.execute(&statement)?;
        tracing::debug!(event = "instance_saved", entity = %instance.entity());
        Ok(())
    }

    /// Every row of the entity's table.
    pub fn all(&self, entity: &str) -> Result<Vec<Instance>> {
        let schema = self.registry.schema(entity)?;
        let rows = self.executor.execute(&dml::select_all(schema))?;
        rehydrate(schema, rows.unwrap_or_default())
    }

    /// First row matching every equality filter, if any.
    pub fn get<I, K>(&self, entity: &str, filters: I) -> Result<Option<Instance>>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let schema = self.registry.schema(entity)?;
        let statement = dml::select_where(schema, filters)?;
        let Some(RowSet { columns, rows }) = self.executor.execute(&statement)? else {
            return Ok(None);
        };

        rows.into_iter()
            .next()
            .map(|row| Instance::from_row(schema, &columns, row))
            .transpose()
    }

    /// Run a statement the builders do not cover.
    pub fn execute(&self, sql: &str, params: Vec<Value>) -> Result<Option<RowSet>> {
        self.executor.execute(&Statement::new(sql, params))
    }

    /// Create the entity's table and its junction tables.
    pub fn create_table(&self, entity: &str) -> Result<()> {
        let schema = self.registry.schema(entity)?;
        for sql in ddl::create_statements(schema) {
            self.executor.execute(&Statement::raw(sql))?;
        }
        tracing::info!(event = "table_created", entity = %schema.name());
        Ok(())
    }

    /// Create every registered table, referenced tables first.
    pub fn create_all_tables(&self) -> Result<()> {
        self.registry.validate_references()?;
        for schema in self.registry.creation_order()? {
            self.executor
                .execute(&Statement::raw(ddl::create_table(schema)))?;
            tracing::info!(event = "table_created", entity = %schema.name());
        }
        Ok(())
    }
}

fn rehydrate(schema: &Arc<EntitySchema>, rows: RowSet) -> Result<Vec<Instance>> {
    let RowSet { columns, rows } = rows;
    rows.into_iter()
        .map(|row| Instance::from_row(schema, &columns, row))
        .collect()
}
