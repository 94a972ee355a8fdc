use serde::{Deserialize, Serialize};
use std::env;
use thiserror::Error;
use validator::{Validate, ValidationError};

use crate::dialect::{sanitize_identifier, DialectKind};
use crate::protection::EDGE_TABLE;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),

    #[error("Parse error for {field}: {value} - {source}")]
    Parse {
        field: String,
        value: String,
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Mapper configuration with validation
#[derive(Clone, Debug, Validate, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MapperConfig {
    /// SQL dialect used for naming rules and rendering
    pub dialect: DialectKind,

    /// Table holding HAS_A reference rows
    #[validate(
        length(min = 1, max = 64, message = "Edge table name must be 1-64 characters"),
        custom(function = "validate_identifier")
    )]
    pub edge_table: String,

    /// How deep example objects may reference each other in one query
    #[validate(range(
        min = 1,
        max = 256,
        message = "Max nesting depth must be between 1 and 256"
    ))]
    pub max_nesting_depth: usize,

    /// Default `env_logger` filter when RUST_LOG is unset
    #[validate(length(min = 1, message = "Log filter cannot be empty"))]
    pub log_filter: String,

    /// SQLite database holding the edge table
    pub database_path: Option<String>,
}

impl Default for MapperConfig {
    fn default() -> Self {
        Self {
            dialect: DialectKind::Ansi,
            edge_table: EDGE_TABLE.to_string(),
            max_nesting_depth: 32,
            log_filter: "info".to_string(),
            database_path: None,
        }
    }
}

impl MapperConfig {
    /// Create configuration from `OBJMAP_*` environment variables with validation.
    ///
    /// A `.env` file in the working directory is loaded first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = Self {
            dialect: parse_env_var("OBJMAP_DIALECT", "ansi")?,
            edge_table: env::var("OBJMAP_EDGE_TABLE").unwrap_or_else(|_| EDGE_TABLE.to_string()),
            max_nesting_depth: parse_env_var("OBJMAP_MAX_NESTING_DEPTH", "32")?,
            log_filter: env::var("OBJMAP_LOG").unwrap_or_else(|_| "info".to_string()),
            database_path: env::var("OBJMAP_DATABASE").ok(),
        };

        config.validate()?;
        Ok(config)
    }

    /// Create configuration from CLI arguments with validation.
    ///
    /// Options not given on the command line keep the values of `base`.
    pub fn from_cli(base: Self, cli: CliConfig) -> Result<Self, ConfigError> {
        let mut config = base;
        config.merge(cli);
        config.validate()?;
        Ok(config)
    }

    /// Create configuration from YAML file
    pub fn from_yaml_file<P: AsRef<std::path::Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Parse {
            field: "yaml_file".to_string(),
            value: "file read failed".to_string(),
            source: Box::new(e),
        })?;

        let config: Self = serde_yaml::from_str(&content).map_err(|e| ConfigError::Parse {
            field: "yaml_content".to_string(),
            value: content,
            source: Box::new(e),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Merge CLI overrides (CLI overrides environment and file)
    pub fn merge(&mut self, other: CliConfig) {
        if let Some(dialect) = other.dialect {
            self.dialect = dialect;
        }
        if let Some(edge_table) = other.edge_table {
            self.edge_table = edge_table;
        }
        if let Some(depth) = other.max_nesting_depth {
            self.max_nesting_depth = depth;
        }
        if let Some(filter) = other.log_filter {
            self.log_filter = filter;
        }
        if other.database_path.is_some() {
            self.database_path = other.database_path;
        }
    }
}

/// CLI configuration (parsed from command line arguments); unset fields
/// leave the underlying value alone
#[derive(Clone, Debug, Default)]
pub struct CliConfig {
    pub dialect: Option<DialectKind>,
    pub edge_table: Option<String>,
    pub max_nesting_depth: Option<usize>,
    pub log_filter: Option<String>,
    pub database_path: Option<String>,
}

fn validate_identifier(value: &str) -> Result<(), ValidationError> {
    if sanitize_identifier(value) == value {
        Ok(())
    } else {
        let mut err = ValidationError::new("identifier");
        err.message = Some("must be an uppercase SQL identifier ([A-Z0-9_])".into());
        Err(err)
    }
}

/// Parse an environment variable with a default value
fn parse_env_var<T: std::str::FromStr>(key: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let value = env::var(key).unwrap_or_else(|_| default.to_string());
    value.parse().map_err(|e| ConfigError::Parse {
        field: key.to_string(),
        value,
        source: Box::new(e),
    })
}
