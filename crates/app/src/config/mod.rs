//! Service configuration module

use clap::Parser;

pub mod auth;
pub mod oauth;
pub mod storage;

pub use auth::JwtSettings;
pub use oauth::OAuthSettings;
pub use storage::{LoginDriver, NamespaceDriver, StorageConfig};

/// Enclave service configuration.
#[derive(Debug, Parser)]
#[command(name = "enclave", about = "Enclave namespace registry", long_about = None)]
pub struct AppConfig {
    /// Storage backend settings.
    #[command(flatten)]
    pub storage: StorageConfig,

    /// Login and token settings.
    #[command(flatten)]
    pub jwt: JwtSettings,

    /// Identity provider credentials.
    #[command(flatten)]
    pub oauth: OAuthSettings,
}

impl AppConfig {
    /// Load configuration from environment and CLI arguments.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be parsed.
    pub fn load() -> Result<Self, clap::Error> {
        // Load .env file if present (ignore if missing)
        _ = dotenvy::dotenv();

        Self::try_parse()
    }
}
