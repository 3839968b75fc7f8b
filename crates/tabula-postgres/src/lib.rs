//! PostgreSQL executor for Tabula.
//!
//! [`PgExecutor`] runs each statement on a fresh connection inside its own
//! transaction and exposes the synchronous [`tabula_core::Executor`] API on top
//! of sqlx.

pub mod executor;
mod mapper;
pub mod options;
mod queries;

pub use executor::PgExecutor;
pub use options::{connect_options, parse_url};

pub use tabula_core::ConnectionConfig;
