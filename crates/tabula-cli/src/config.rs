use std::path::Path;

use serde::Deserialize;
use tabula_core::{ConnectionConfig, Registry};
use tabula_postgres::PgExecutor;

use crate::{CliError, CliResult};

/// Contents of a `tabula.toml` project file.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(default)]
    pub connection: Option<ConnectionConfig>,
    #[serde(default)]
    pub entity: Vec<EntityDecl>,
}

/// One `[[entity]]` table: a name and its field declarations.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntityDecl {
    pub name: String,
    pub fields: String,
}

impl ProjectConfig {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| CliError::ReadConfig {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> CliResult<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Declare every entity, in file order.
    pub fn registry(&self) -> CliResult<Registry> {
        let mut registry = Registry::new();
        for decl in &self.entity {
            registry.declare(&decl.name, &decl.fields)?;
        }
        Ok(registry)
    }

    /// Executor for the `--conn` url, or else the `[connection]` table.
    pub fn executor(&self, url: Option<&str>) -> CliResult<PgExecutor> {
        match (url, &self.connection) {
            (Some(url), _) => Ok(PgExecutor::from_url(url)?),
            (None, Some(config)) => Ok(PgExecutor::new(config.clone())?),
            (None, None) => Err(CliError::InvalidConfig(
                "no connection: pass --conn, set DATABASE_URL or add a [connection] table"
                    .to_string(),
            )),
        }
    }
}
