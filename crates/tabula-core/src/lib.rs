//! Core contracts for Tabula.
//!
//! Entity schemas are declared in a compact textual form (or built
//! programmatically), collected in a [`Registry`], and turned into validated
//! [`Instance`]s, `CREATE TABLE` statements and parameterized INSERT/SELECT
//! statements. Running statements is delegated to an [`Executor`]; this crate
//! carries no database driver.

pub mod connection;
pub mod ddl;
pub mod dml;
pub mod error;
pub mod executor;
pub mod field;
mod graph;
pub mod instance;
pub mod parse;
pub mod registry;
pub mod schema;
pub mod store;
mod validation;
pub mod value;

pub use connection::{ConnectionConfig, redact_url};
pub use dml::Statement;
pub use error::{Error, Result};
pub use executor::{Executor, RowSet};
pub use field::{
    CharField, FieldDescriptor, FieldKind, FloatField, ForeignKeyField, IntegerField, Violation,
};
pub use instance::Instance;
pub use parse::{ParsedFields, parse_fields};
pub use registry::Registry;
pub use schema::{Column, EntitySchema, EntitySchemaBuilder, ManyToMany};
pub use store::Store;
pub use value::Value;
