//! # Configuration Management for Tablemap
//!
//! This crate provides the configuration structures for the database connection and the
//! mapper.
//!
//! ## Quick Start
//!
//! ### Programmatic Configuration
//! ```rust
//! use config::{DatabaseConfig, MapperConfig};
//! use type_mapping::Dialect;
//!
//! let db_config = DatabaseConfig::sqlite(":memory:");
//! let mapper_config = MapperConfig::new(Dialect::Sqlite);
//! assert_eq!(db_config.connection_string(), "sqlite::memory:");
//! assert_eq!(mapper_config.dialect, db_config.dialect);
//! ```
//!
//! ### TOML File Configuration
//! ```toml
//! [database]
//! dialect = "postgres"
//! host = "localhost"
//! port = 5432
//! database = "music"
//! username = "postgres"
//! password = "password"
//! min_connections = 1
//! max_connections = 10
//! connection_timeout_seconds = 30
//! idle_timeout_seconds = 600
//! max_lifetime_seconds = 3600
//!
//! [mapper]
//! dialect = "postgres"
//! default_schema = "public"
//! log_queries = false
//! ```
//!
//! Load configuration:
//! ```rust,no_run
//! use config::AppConfig;
//!
//! // Load from TABLEMAP_CONFIG or ./tablemap.toml
//! let config = AppConfig::load()?;
//!
//! // Or load from custom path
//! let config = AppConfig::from_file("config/production.toml")?;
//! # Ok::<(), config::ConfigError>(())
//! ```

use serde::{Deserialize, Serialize};
use std::{env, path::Path};
use thiserror::Error;
use type_mapping::Dialect;

const DEFAULT_CONFIG_PATH: &str = "./tablemap.toml";
const CONFIG_PATH_VAR: &str = "TABLEMAP_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Environment variable error: {0}")]
    Env(#[from] env::VarError),
    #[error("Dotenvy error: {0}")]
    Dotenvy(#[from] dotenvy::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub database: DatabaseConfig,
    pub mapper: MapperConfig,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub dialect: Dialect,
    /// Full connection URL; overrides the individual connection fields
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub port: u16,
    /// Database name, or the file path (`:memory:` included) for SQLite
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_connection_timeout")]
    pub connection_timeout_seconds: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_seconds: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_seconds: u64,
}

fn default_min_connections() -> u32 {
    1
}

fn default_max_connections() -> u32 {
    10
}

fn default_connection_timeout() -> u64 {
    30
}

fn default_idle_timeout() -> u64 {
    600
}

fn default_max_lifetime() -> u64 {
    3600
}

/// Mapper configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapperConfig {
    pub dialect: Dialect,
    /// Schema that tables are placed in when none is named
    #[serde(default = "default_schema")]
    pub default_schema: String,
    /// Log every executed query with its bound values
    #[serde(default)]
    pub log_queries: bool,
}

fn default_schema() -> String {
    "main".to_string()
}

impl AppConfig {
    /// Load configuration from TOML file specified in .env or defaults
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(e.into());
            }
        }

        if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::from_file(&config_path)
        } else if Path::new(DEFAULT_CONFIG_PATH).exists() {
            Self::from_file(DEFAULT_CONFIG_PATH)
        } else {
            Err(ConfigError::Invalid(format!(
                "Config path must be specified in .env file as {} or in {} file",
                CONFIG_PATH_VAR, DEFAULT_CONFIG_PATH
            )))
        }
    }

    /// Load configuration from TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse and validate TOML text
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Configuration for an in-memory SQLite database
    pub fn in_memory() -> Self {
        Self {
            database: DatabaseConfig::sqlite(":memory:"),
            mapper: MapperConfig::new(Dialect::Sqlite),
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.database.validate()?;
        self.mapper.validate()?;
        if self.database.dialect != self.mapper.dialect {
            return Err(ConfigError::Invalid(format!(
                "Mapper dialect {} does not match database dialect {}",
                self.mapper.dialect, self.database.dialect
            )));
        }
        Ok(())
    }
}

impl DatabaseConfig {
    /// Create a new PostgreSQL configuration
    #[allow(clippy::too_many_arguments)]
    pub fn postgres(
        host: String,
        port: u16,
        database: String,
        username: String,
        password: String,
        min_connections: u32,
        max_connections: u32,
        connection_timeout_seconds: u64,
        idle_timeout_seconds: u64,
        max_lifetime_seconds: u64,
    ) -> Self {
        Self {
            dialect: Dialect::Postgres,
            url: None,
            host,
            port,
            database,
            username,
            password,
            min_connections,
            max_connections,
            connection_timeout_seconds,
            idle_timeout_seconds,
            max_lifetime_seconds,
        }
    }

    /// SQLite configuration for a database file, or `:memory:`
    pub fn sqlite(path: impl Into<String>) -> Self {
        Self {
            dialect: Dialect::Sqlite,
            url: None,
            host: String::new(),
            port: 0,
            database: path.into(),
            username: String::new(),
            password: String::new(),
            min_connections: default_min_connections(),
            max_connections: default_max_connections(),
            connection_timeout_seconds: default_connection_timeout(),
            idle_timeout_seconds: default_idle_timeout(),
            max_lifetime_seconds: default_max_lifetime(),
        }
    }

    /// Configuration from a connection URL; the dialect follows the URL scheme
    pub fn from_url(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let dialect = if url.starts_with("sqlite:") {
            Dialect::Sqlite
        } else if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            Dialect::Postgres
        } else {
            return Err(ConfigError::Invalid(format!(
                "Unsupported database URL scheme in '{}'",
                url
            )));
        };
        let mut config = match dialect {
            Dialect::Sqlite => Self::sqlite(String::new()),
            Dialect::Postgres => Self::postgres(
                String::new(),
                0,
                String::new(),
                String::new(),
                String::new(),
                default_min_connections(),
                default_max_connections(),
                default_connection_timeout(),
                default_idle_timeout(),
                default_max_lifetime(),
            ),
        };
        config.url = Some(url);
        Ok(config)
    }

    /// Build connection string
    pub fn connection_string(&self) -> String {
        if let Some(url) = &self.url {
            return url.clone();
        }
        match self.dialect {
            Dialect::Sqlite if self.database == ":memory:" => "sqlite::memory:".to_string(),
            Dialect::Sqlite => format!("sqlite://{}", self.database),
            Dialect::Postgres => format!(
                "postgresql://{}:{}@{}:{}/{}",
                self.username, self.password, self.host, self.port, self.database
            ),
        }
    }

    /// SQLite database that lives only as long as its connection
    pub fn is_in_memory(&self) -> bool {
        self.dialect == Dialect::Sqlite
            && match &self.url {
                Some(url) => url.contains(":memory:") || url.contains("mode=memory"),
                None => self.database == ":memory:",
            }
    }

    /// `(min, max)` pool size; an in-memory database is pinned to one connection
    pub fn pool_bounds(&self) -> (u32, u32) {
        if self.is_in_memory() {
            (1, 1)
        } else {
            (self.min_connections, self.max_connections)
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.url.is_none() {
            if self.database.is_empty() {
                return Err(ConfigError::Invalid(
                    "Database name cannot be empty".to_string(),
                ));
            }
            if self.dialect == Dialect::Postgres {
                if self.host.is_empty() {
                    return Err(ConfigError::Invalid(
                        "Database host cannot be empty".to_string(),
                    ));
                }
                if self.port == 0 {
                    return Err(ConfigError::Invalid(
                        "Database port cannot be zero".to_string(),
                    ));
                }
                if self.username.is_empty() {
                    return Err(ConfigError::Invalid(
                        "Database username cannot be empty".to_string(),
                    ));
                }
            }
        }
        if self.min_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database min_connections must be greater than 0".to_string(),
            ));
        }
        if self.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "Database max_connections must be greater than 0".to_string(),
            ));
        }
        if self.min_connections > self.max_connections {
            return Err(ConfigError::Invalid(
                "Database min_connections cannot be greater than max_connections".to_string(),
            ));
        }
        if self.connection_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "Database connection_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl MapperConfig {
    /// Create a new mapper configuration with the default schema and query logging off
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            default_schema: default_schema(),
            log_queries: false,
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.default_schema.is_empty() {
            return Err(ConfigError::Invalid(
                "Mapper default_schema cannot be empty".to_string(),
            ));
        }
        Ok(())
    }
}
