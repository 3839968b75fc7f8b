use sqlx::PgConnection;

use tabula_core::{Error, Result};

fn statement_error(err: sqlx::Error) -> Error {
    Error::Statement(err.to_string())
}

pub(crate) async fn database_exists(conn: &mut PgConnection, name: &str) -> Result<bool> {
    sqlx::query_scalar::<_, bool>("select exists(select 1 from pg_database where datname = $1)")
        .bind(name)
        .fetch_one(conn)
        .await
        .map_err(statement_error)
}

/// `name` must already be a plain identifier; it cannot be bound as a parameter.
pub(crate) async fn create_database(conn: &mut PgConnection, name: &str) -> Result<()> {
    sqlx::query(&format!("CREATE DATABASE \"{name}\""))
        .execute(conn)
        .await
        .map_err(statement_error)?;
    Ok(())
}
