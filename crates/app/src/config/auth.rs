//! Auth Config

use std::time::Duration;

use clap::Args;

use crate::{
    config::storage::LoginDriver,
    domain::auth::jwt::{JwtConfig, JwtSecret},
};

/// Login and token issuance settings.
#[derive(Debug, Clone, Args)]
pub struct JwtSettings {
    /// Login repository driver
    #[arg(long, env = "ENCLAVE_LOGIN_DRIVER", value_enum, default_value_t = LoginDriver::Sqlite)]
    pub login_driver: LoginDriver,

    /// HMAC secret for login tokens; login stays disabled without it
    #[arg(long, env = "JWT_SECRET", hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// Issuer claim for login tokens
    #[arg(long, env = "JWT_ISSUER", default_value = "enclave")]
    pub jwt_issuer: String,

    /// Seconds of token validity
    #[arg(long, env = "JWT_EXPIRE_SECS", default_value_t = 600)]
    pub jwt_expire_secs: u64,
}

impl JwtSettings {
    /// Token settings, present when a secret is configured.
    #[must_use]
    pub fn jwt_config(&self) -> Option<JwtConfig> {
        self.jwt_secret.as_deref().map(|secret| JwtConfig {
            secret: JwtSecret::new(secret),
            issuer: self.jwt_issuer.clone(),
            expire: Duration::from_secs(self.jwt_expire_secs),
        })
    }
}
