mod config;
mod logging;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use serde_json::{Map, Value as Json};
use tabula_core::{Error as CoreError, Instance, Store, ddl};
use tabula_postgres::PgExecutor;
use thiserror::Error;

use config::ProjectConfig;
use logging::init_logging;

#[derive(Debug, Error)]
pub(crate) enum CliError {
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    #[error("failed to read {}: {source}", .path.display())]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid project file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("logging error: {0}")]
    Logging(String),
}

pub(crate) type CliResult<T> = std::result::Result<T, CliError>;

#[derive(Parser, Debug)]
#[command(name = "tabula", version, about = "Tabula entity schema CLI")]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// Project file declaring the connection and entities.
    #[arg(long, global = true, default_value = "tabula.toml")]
    config: PathBuf,
    /// Connection url; overrides the [connection] table.
    #[arg(long, global = true, env = "DATABASE_URL", value_name = "CONNECTION_STRING")]
    conn: Option<String>,
    /// Emit logs as JSON lines.
    #[arg(long, global = true, default_value_t = false)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print CREATE TABLE statements in creation order.
    Ddl,
    /// Print the declared entity schemas as JSON.
    Schema,
    /// Create the configured database if it does not exist.
    CreateDb,
    /// Create every declared table.
    CreateTables,
    /// Print every row of an entity as JSON lines.
    Dump(DumpArgs),
}

#[derive(Args, Debug)]
struct DumpArgs {
    /// Entity name, case-insensitive.
    entity: String,
}

fn main() -> Result<(), CliError> {
    let Cli { global, command } = Cli::parse();
    init_logging(global.log_json)?;

    let project = ProjectConfig::load(&global.config)?;
    tracing::debug!(
        event = "project_loaded",
        path = %global.config.display(),
        entities = project.entity.len()
    );

    match command {
        Command::Ddl => print_ddl(&project),
        Command::Schema => print_schema(&project),
        Command::CreateDb => create_database(&project, global.conn.as_deref()),
        Command::CreateTables => create_tables(&project, global.conn.as_deref()),
        Command::Dump(args) => dump(&project, global.conn.as_deref(), &args.entity),
    }
}

fn print_ddl(project: &ProjectConfig) -> CliResult<()> {
    let registry = project.registry()?;
    registry.validate_references()?;
    for schema in registry.creation_order()? {
        println!("{};", ddl::create_table(schema));
    }
    Ok(())
}

fn print_schema(project: &ProjectConfig) -> CliResult<()> {
    let registry = project.registry()?;
    let schemas: Vec<_> = registry.iter().map(|schema| schema.as_ref()).collect();
    println!("{}", serde_json::to_string_pretty(&schemas)?);
    Ok(())
}

fn open_store(project: &ProjectConfig, url: Option<&str>) -> CliResult<Store<PgExecutor>> {
    let executor = project.executor(url)?;
    Ok(Store::new(project.registry()?, executor))
}

fn create_database(project: &ProjectConfig, url: Option<&str>) -> CliResult<()> {
    let executor = project.executor(url)?;
    let database = executor.database().unwrap_or_default();
    if executor.create_database()? {
        println!("created database {database}");
    } else {
        println!("database {database} already exists");
    }
    Ok(())
}

fn create_tables(project: &ProjectConfig, url: Option<&str>) -> CliResult<()> {
    let store = open_store(project, url)?;
    store.create_all_tables()?;
    tracing::info!(
        event = "tables_ready",
        server = %store.executor().server(),
        tables = store.registry().len()
    );
    Ok(())
}

fn dump(project: &ProjectConfig, url: Option<&str>, entity: &str) -> CliResult<()> {
    let store = open_store(project, url)?;
    for instance in store.all(entity)? {
        println!("{}", instance_json(&instance)?);
    }
    Ok(())
}

fn instance_json(instance: &Instance) -> CliResult<Json> {
    let mut fields = Map::new();
    for (name, value) in instance.iter() {
        fields.insert(name.to_string(), serde_json::to_value(value)?);
    }
    Ok(Json::Object(fields))
}
