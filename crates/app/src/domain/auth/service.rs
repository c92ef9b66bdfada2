//! Login service facade.
//!
//! Provider-agnostic: resolves the adapter for the configured provider,
//! normalizes the external user, and hands the result to whichever login
//! repository was constructed.

use std::sync::Arc;

use crate::{
    domain::auth::{
        errors::AuthError,
        models::{LoginRequest, LoginResponse},
        repository::LoginRepository,
    },
    oauth::{self, OAuthClientConfig, ProviderRegistry},
};

#[derive(Clone)]
pub struct LoginService {
    repository: Arc<dyn LoginRepository>,
    providers: Arc<ProviderRegistry>,
}

impl std::fmt::Debug for LoginService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginService").finish_non_exhaustive()
    }
}

impl LoginService {
    #[must_use]
    pub fn new(repository: Arc<dyn LoginRepository>, providers: Arc<ProviderRegistry>) -> Self {
        Self {
            repository,
            providers,
        }
    }

    /// Completes an OAuth callback: code exchange, user-info fetch, then the
    /// repository's login pipeline.
    ///
    /// # Errors
    ///
    /// Adapter and repository failures pass through with their causes.
    pub async fn login_callback(
        &self,
        config: &OAuthClientConfig,
        code: Option<&str>,
    ) -> Result<LoginResponse, AuthError> {
        let user = oauth::authenticate(&self.providers, config, code).await?;

        self.repository
            .login(LoginRequest {
                redirect_url: config.redirect_url.clone(),
                user,
            })
            .await
    }
}
