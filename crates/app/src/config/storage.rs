//! Storage Config

use std::{fmt, path::PathBuf};

use clap::{Args, ValueEnum};

/// Namespace storage driver selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum NamespaceDriver {
    /// SQLite database via sqlx.
    Sqlite,
    /// Flat YAML file store.
    File,
}

impl fmt::Display for NamespaceDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
            Self::File => f.write_str("file"),
        }
    }
}

/// Login repository driver selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum LoginDriver {
    Sqlite,
}

impl fmt::Display for LoginDriver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sqlite => f.write_str("sqlite"),
        }
    }
}

/// Storage settings consumed by the repository factories.
#[derive(Debug, Clone, Args)]
pub struct StorageConfig {
    /// Namespace storage driver
    #[arg(long, env = "ENCLAVE_DRIVER", value_enum, default_value_t = NamespaceDriver::Sqlite)]
    pub driver: NamespaceDriver,

    /// SQLite connection string, e.g. `sqlite://enclave.db`
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Directory holding the file-backed namespace store
    #[arg(long, env = "ENCLAVE_FILE_DIR", default_value = "data")]
    pub file_dir: PathBuf,

    /// File name of the namespace store inside the directory
    #[arg(long, env = "ENCLAVE_FILE_NAME", default_value = "namespaces.yaml")]
    pub file_name: String,

    /// Seconds between background flushes of the file store
    #[arg(long, env = "ENCLAVE_FLUSH_INTERVAL_SECS", default_value_t = 10)]
    pub flush_interval_secs: u64,

    /// Snowflake node id distinguishing this instance from others
    #[arg(long, env = "ENCLAVE_NODE_ID", default_value_t = 1)]
    pub node_id: u16,
}

impl StorageConfig {
    /// The configured database URL.
    ///
    /// # Errors
    ///
    /// Returns the flag/env name that is missing when unset.
    pub fn require_database_url(&self) -> Result<&str, MissingSetting> {
        self.database_url
            .as_deref()
            .ok_or(MissingSetting("DATABASE_URL"))
    }
}

/// A required setting that was left unset.
#[derive(Debug, Clone, Copy, thiserror::Error)]
#[error("{0} is required but not set")]
pub struct MissingSetting(pub &'static str);
