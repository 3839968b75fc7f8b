//! In-memory executor understanding the statements Tabula generates.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::BTreeMap;

use tabula_core::{Error, Executor, Result, RowSet, Statement, Value};

static NULL: Value = Value::Null;

#[derive(Debug, Default, Clone)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

#[derive(Debug, Default)]
pub struct MemoryExecutor {
    pub tables: RefCell<BTreeMap<String, Table>>,
    pub log: RefCell<Vec<Statement>>,
}

impl MemoryExecutor {
    pub fn table(&self, name: &str) -> Option<Table> {
        self.tables.borrow().get(name).cloned()
    }

    pub fn executed(&self) -> Vec<String> {
        self.log.borrow().iter().map(|s| s.sql.clone()).collect()
    }

    fn create(&self, sql: &str) -> Result<Option<RowSet>> {
        let rest = sql.trim_start_matches("CREATE TABLE IF NOT EXISTS ");
        let (name, body) = rest
            .split_once(" (")
            .ok_or_else(|| Error::Statement(format!("malformed: {sql}")))?;
        let body = body.strip_suffix(')').unwrap_or(body);

        let columns = split_top_level(body)
            .into_iter()
            .filter(|clause| {
                !clause.starts_with("FOREIGN KEY") && !clause.starts_with("PRIMARY KEY")
            })
            .filter_map(|clause| clause.split_whitespace().next().map(str::to_string))
            .collect();

        self.tables
            .borrow_mut()
            .entry(name.to_string())
            .or_insert(Table {
                columns,
                rows: Vec::new(),
            });
        Ok(None)
    }

    fn insert(&self, statement: &Statement) -> Result<Option<RowSet>> {
        let rest = statement.sql.trim_start_matches("INSERT INTO ");
        let (name, rest) = rest.split_once(" (").unwrap();
        let (columns, _) = rest.split_once(") VALUES").unwrap();
        let columns: Vec<&str> = columns.split(", ").collect();

        let mut tables = self.tables.borrow_mut();
        let table = tables
            .get_mut(name)
            .ok_or_else(|| Error::Statement(format!("relation \"{name}\" does not exist")))?;

        let next_id = table.rows.len() as i64 + 1;
        let row = table
            .columns
            .iter()
            .map(|column| match columns.iter().position(|c| c == column) {
                Some(index) => statement.params[index].clone(),
                None if column == "id" => Value::Integer(next_id),
                None => Value::Null,
            })
            .collect();
        table.rows.push(row);
        Ok(None)
    }

    fn select(&self, statement: &Statement) -> Result<Option<RowSet>> {
        let rest = statement.sql.trim_start_matches("SELECT * FROM ");
        let (name, conditions): (&str, Vec<&str>) = match rest.split_once(" WHERE ") {
            Some((name, conditions)) => (name, conditions.split(" AND ").collect()),
            None => (rest, Vec::new()),
        };

        let tables = self.tables.borrow();
        let table = tables
            .get(name)
            .ok_or_else(|| Error::Statement(format!("relation \"{name}\" does not exist")))?;

        let filters: Vec<(usize, &Value)> = conditions
            .iter()
            .map(|condition| {
                let (column, value) = match condition.strip_suffix(" IS NULL") {
                    Some(column) => (column, &NULL),
                    None => {
                        let (column, placeholder) = condition.split_once(" = $").unwrap();
                        let index: usize = placeholder.parse().unwrap();
                        (column, &statement.params[index - 1])
                    }
                };
                let position = table.columns.iter().position(|c| c == column).unwrap();
                (position, value)
            })
            .collect();

        let rows = table
            .rows
            .iter()
            .filter(|row| filters.iter().all(|(position, value)| &row[*position] == *value))
            .cloned()
            .collect();

        Ok(Some(RowSet {
            columns: table.columns.clone(),
            rows,
        }))
    }
}

impl Executor for MemoryExecutor {
    fn execute(&self, statement: &Statement) -> Result<Option<RowSet>> {
        self.log.borrow_mut().push(statement.clone());
        let sql = statement.sql.as_str();
        if sql.starts_with("CREATE TABLE IF NOT EXISTS ") {
            self.create(sql)
        } else if sql.starts_with("INSERT INTO ") {
            self.insert(statement)
        } else if sql.starts_with("SELECT * FROM ") {
            self.select(statement)
        } else {
            Err(Error::Statement(format!("unsupported statement: {sql}")))
        }
    }
}

/// Executor whose store is always unreachable.
pub struct UnreachableExecutor;

impl Executor for UnreachableExecutor {
    fn execute(&self, _statement: &Statement) -> Result<Option<RowSet>> {
        Err(Error::Connection("connection refused".to_string()))
    }
}

fn split_top_level(body: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (index, ch) in body.char_indices() {
        match ch {
            '(' => depth += 1,
            ')' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(body[start..index].trim());
                start = index + 1;
            }
            _ => {}
        }
    }
    parts.push(body[start..].trim());
    parts
}
