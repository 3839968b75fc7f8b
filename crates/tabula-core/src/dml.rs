//! INSERT and SELECT statements with positional parameters.
//!
//! Only identifiers checked against a schema are written into the SQL text;
//! values always travel as bound parameters.

use crate::error::{Error, Result};
use crate::instance::Instance;
use crate::schema::EntitySchema;
use crate::value::Value;

/// SQL text plus the values bound to its `$n` placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// A statement without parameters.
    pub fn raw(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

fn placeholders(count: usize) -> String {
    (1..=count)
        .map(|index| format!("${index}"))
        .collect::<Vec<_>>()
        .join(", ")
}

/// INSERT of every column in schema order.
///
/// Unset auto-increment columns are left for the store to generate; any
/// other unset column is an error.
pub fn insert(instance: &Instance) -> Result<Statement> {
    let schema = instance.schema();
    let mut columns = Vec::with_capacity(schema.columns().len());
    let mut params = Vec::with_capacity(schema.columns().len());

    for column in schema.columns() {
        if !instance.is_set(&column.name) && column.field.is_auto_increment() {
            continue;
        }
        params.push(instance.get(&column.name)?.clone());
        columns.push(column.name.as_str());
    }

    let sql = format!(
        "INSERT INTO {} ({}) VALUES ({})",
        schema.table_name(),
        columns.join(", "),
        placeholders(params.len())
    );
    Ok(Statement::new(sql, params))
}

pub fn select_all(schema: &EntitySchema) -> Statement {
    Statement::raw(format!("SELECT * FROM {}", schema.table_name()))
}

/// SELECT with an equality condition per filter, joined with `AND`.
///
/// Filter names must be declared columns. A `Null` filter becomes `IS NULL`.
/// No filters selects every row.
pub fn select_where<I, K>(schema: &EntitySchema, filters: I) -> Result<Statement>
where
    I: IntoIterator<Item = (K, Value)>,
    K: AsRef<str>,
{
    let mut conditions = Vec::new();
    let mut params = Vec::new();

    for (column, value) in filters {
        let column = column.as_ref();
        if !schema.has_column(column) {
            return Err(Error::unknown_field(schema.name(), column));
        }
        if value.is_null() {
            conditions.push(format!("{column} IS NULL"));
            continue;
        }
        params.push(value);
        conditions.push(format!("{column} = ${}", params.len()));
    }

    let mut sql = format!("SELECT * FROM {}", schema.table_name());
    if !conditions.is_empty() {
        sql.push_str(" WHERE ");
        sql.push_str(&conditions.join(" AND "));
    }
    Ok(Statement::new(sql, params))
}
