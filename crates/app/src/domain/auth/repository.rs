//! Login repository contract.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;

use crate::{
    config::storage::StorageConfig,
    domain::auth::{
        errors::AuthError,
        jwt::JwtConfig,
        models::{LoginRequest, LoginResponse},
    },
    registry::Cleanup,
};

/// Third-party login, polymorphic over the configured identity backend.
#[automock]
#[async_trait]
pub trait LoginRepository: Send + Sync {
    /// Runs the login pipeline for an externally authenticated user and
    /// returns the redirect URL carrying the issued token.
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError>;
}

/// A constructed login repository plus its teardown.
pub struct LoginHandle {
    pub repository: Arc<dyn LoginRepository>,
    pub cleanup: Cleanup,
}

impl fmt::Debug for LoginHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginHandle").finish_non_exhaustive()
    }
}

/// Constructor registered in the driver registry, one per backend.
#[async_trait]
pub trait LoginRepositoryFactory: Send + Sync {
    async fn build(
        &self,
        config: &StorageConfig,
        jwt: &JwtConfig,
    ) -> Result<LoginHandle, AuthError>;
}

/// Registry entry type for login backends.
pub type LoginFactory = Arc<dyn LoginRepositoryFactory>;
