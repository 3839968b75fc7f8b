use std::str::FromStr;

use sqlx::postgres::PgConnectOptions;

use tabula_core::{ConnectionConfig, Error, Result, redact_url};

/// Database used to issue `CREATE DATABASE` when the target does not exist yet.
pub const MAINTENANCE_DATABASE: &str = "postgres";

/// Build sqlx connect options for the configured server and database.
pub fn connect_options(config: &ConnectionConfig) -> PgConnectOptions {
    let options = PgConnectOptions::new()
        .host(&config.host)
        .port(config.port_or_default())
        .username(&config.user)
        .database(&config.database);

    match &config.password {
        Some(password) => options.password(password),
        None => options,
    }
}

/// Parse a `postgres://` connection url with sqlx.
///
/// Credentials are percent-decoded and query parameters such as `sslmode`
/// are honoured.
pub fn parse_url(url: &str) -> Result<PgConnectOptions> {
    let invalid = |reason: String| {
        Error::Connection(format!("invalid connection url `{}`: {reason}", redact_url(url)))
    };

    if !(url.starts_with("postgres://") || url.starts_with("postgresql://")) {
        return Err(invalid("expected a postgres:// scheme".to_string()));
    }
    PgConnectOptions::from_str(url).map_err(|err| invalid(err.to_string()))
}
