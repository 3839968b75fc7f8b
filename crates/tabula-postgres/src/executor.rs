use sqlx::postgres::PgConnectOptions;
use sqlx::{Column as _, Connection as _, Executor as _, PgConnection, Statement as _};
use tokio::runtime::{Builder, Runtime};

use tabula_core::schema::is_identifier;
use tabula_core::{ConnectionConfig, Error, Executor, Result, RowSet, Statement, redact_url};

use crate::mapper;
use crate::options::{MAINTENANCE_DATABASE, connect_options, parse_url};
use crate::queries;

/// Executor backed by a PostgreSQL server.
///
/// Every call opens its own connection, runs the statement in a transaction,
/// commits and closes the connection. Calls block on a private current-thread
/// runtime, so they must not be made from inside another tokio runtime.
#[derive(Debug)]
pub struct PgExecutor {
    options: PgConnectOptions,
    server: String,
    runtime: Runtime,
}

impl PgExecutor {
    pub fn new(config: ConnectionConfig) -> Result<Self> {
        Self::with_options(connect_options(&config), config.to_string())
    }

    /// Connect using a `postgres://` url, including its query parameters.
    pub fn from_url(url: &str) -> Result<Self> {
        Self::with_options(parse_url(url)?, redact_url(url))
    }

    fn with_options(options: PgConnectOptions, server: String) -> Result<Self> {
        let runtime = Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| Error::Connection(format!("failed to start runtime: {err}")))?;
        Ok(Self {
            options,
            server,
            runtime,
        })
    }

    pub fn options(&self) -> &PgConnectOptions {
        &self.options
    }

    /// Target database, when one was configured.
    pub fn database(&self) -> Option<&str> {
        self.options.get_database()
    }

    /// Redacted description of the server, safe to log.
    pub fn server(&self) -> &str {
        &self.server
    }

    /// Create the configured database unless it already exists.
    ///
    /// Connects to the maintenance database to do so. Returns whether the
    /// database was created.
    pub fn create_database(&self) -> Result<bool> {
        let name = self
            .database()
            .ok_or_else(|| Error::Connection(format!("{}: no database configured", self.server)))?;
        if !is_identifier(name) {
            return Err(Error::Connection(format!(
                "database name `{name}` is not a valid identifier"
            )));
        }

        let maintenance = self.options.clone().database(MAINTENANCE_DATABASE);
        self.runtime.block_on(async {
            let mut conn = connect(&maintenance, &self.server).await?;
            let created = match queries::database_exists(&mut conn, name).await {
                Ok(true) => Ok(false),
                Ok(false) => queries::create_database(&mut conn, name).await.map(|()| true),
                Err(err) => Err(err),
            };
            close(conn).await;

            if let Ok(true) = created {
                tracing::info!(event = "database_created", database = %name);
            }
            created
        })
    }

    async fn run(&self, statement: &Statement) -> Result<Option<RowSet>> {
        let mut conn = connect(&self.options, &self.server).await?;
        let result = run_in_transaction(&mut conn, statement).await;
        close(conn).await;

        if let Ok(rows) = &result {
            tracing::debug!(
                event = "statement_executed",
                sql = %statement.sql,
                params = statement.params.len(),
                rows = rows.as_ref().map_or(0, |rows| rows.rows.len())
            );
        }
        result
    }
}

impl Executor for PgExecutor {
    fn execute(&self, statement: &Statement) -> Result<Option<RowSet>> {
        self.runtime.block_on(self.run(statement))
    }
}

async fn connect(options: &PgConnectOptions, server: &str) -> Result<PgConnection> {
    let conn = PgConnection::connect_with(options)
        .await
        .map_err(|err| Error::Connection(format!("{server}: {err}")))?;
    tracing::debug!(event = "connection_opened", server = %server);
    Ok(conn)
}

async fn close(conn: PgConnection) {
    if let Err(err) = conn.close().await {
        tracing::warn!(event = "connection_close_failed", error = %err);
    }
}

async fn run_in_transaction(
    conn: &mut PgConnection,
    statement: &Statement,
) -> Result<Option<RowSet>> {
    let mut tx = conn.begin().await.map_err(statement_error)?;

    let parameter_types: Vec<_> = statement.params.iter().map(mapper::parameter_type).collect();
    let prepared = (&mut *tx)
        .prepare_with(&statement.sql, &parameter_types)
        .await
        .map_err(statement_error)?;
    let columns: Vec<String> = prepared
        .columns()
        .iter()
        .map(|column| column.name().to_string())
        .collect();
    let query = mapper::bind_all(prepared.query(), &statement.params);

    let output = if columns.is_empty() {
        query.execute(&mut *tx).await.map_err(statement_error)?;
        None
    } else {
        let rows = query.fetch_all(&mut *tx).await.map_err(statement_error)?;
        let rows = rows
            .iter()
            .map(mapper::decode_row)
            .collect::<Result<Vec<_>>>()?;
        Some(RowSet { columns, rows })
    };

    tx.commit().await.map_err(statement_error)?;
    Ok(output)
}

fn statement_error(err: sqlx::Error) -> Error {
    Error::Statement(err.to_string())
}
