//! OAuth2 provider adapters.
//!
//! Each adapter exchanges the callback authorization code at its provider's
//! token endpoint, fetches the provider's user-info endpoint with the
//! obtained token, and normalizes the provider-specific payload into the
//! canonical [`AuthenticatedUser`] shape. Adapters register in a
//! provider-indexed [`ProviderRegistry`]; [`authenticate`] resolves the right
//! one and is otherwise provider-agnostic.

mod errors;
pub mod feishu;
pub mod gitee;
pub mod github;

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use clap::ValueEnum;
use serde::Deserialize;

use crate::registry::DriverRegistry;

pub use errors::OAuthError;

/// Supported identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum OAuthApp {
    Feishu,
    Github,
    Gitee,
}

impl fmt::Display for OAuthApp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Feishu => f.write_str("feishu"),
            Self::Github => f.write_str("github"),
            Self::Gitee => f.write_str("gitee"),
        }
    }
}

/// Per-provider client credentials and endpoints.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub app: OAuthApp,
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    /// Where the user lands after login; the issued token is appended to it.
    pub redirect_url: String,
    pub scopes: Vec<String>,
}

/// Canonical accessor contract over a provider's user payload.
///
/// Nickname and remark are optional per provider and default to empty.
pub trait ProviderUser {
    fn app(&self) -> OAuthApp;
    fn open_id(&self) -> String;
    fn name(&self) -> String;
    fn email(&self) -> String;
    fn avatar(&self) -> String;
    fn nickname(&self) -> String {
        String::new()
    }
    fn remark(&self) -> String {
        String::new()
    }
    fn raw(&self) -> serde_json::Value;
}

/// Provider-agnostic user shape handed to the login repository.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthenticatedUser {
    pub app: OAuthApp,
    pub open_id: String,
    pub name: String,
    pub nickname: String,
    pub remark: String,
    pub email: String,
    pub avatar: String,
    pub raw: serde_json::Value,
}

impl AuthenticatedUser {
    #[must_use]
    pub fn from_provider_user(user: &dyn ProviderUser) -> Self {
        Self {
            app: user.app(),
            open_id: user.open_id(),
            name: user.name(),
            nickname: user.nickname(),
            remark: user.remark(),
            email: user.email(),
            avatar: user.avatar(),
            raw: user.raw(),
        }
    }
}

/// One identity provider's login flow.
#[async_trait]
pub trait OAuthProvider: Send + Sync {
    fn app(&self) -> OAuthApp;

    /// Exchange the authorization code and fetch the provider's user info.
    async fn login(
        &self,
        config: &OAuthClientConfig,
        code: &str,
    ) -> Result<AuthenticatedUser, OAuthError>;
}

/// Registry entry type for provider adapters.
pub type ProviderRegistry = DriverRegistry<OAuthApp, Arc<dyn OAuthProvider>>;

/// Provider-agnostic callback entry point.
///
/// # Errors
///
/// A missing or empty code is an invalid argument; an unregistered provider
/// is a configuration error; adapter failures pass through with their cause.
pub async fn authenticate(
    registry: &ProviderRegistry,
    config: &OAuthClientConfig,
    code: Option<&str>,
) -> Result<AuthenticatedUser, OAuthError> {
    let code = code
        .map(str::trim)
        .filter(|code| !code.is_empty())
        .ok_or(OAuthError::MissingCode)?;

    let provider = registry
        .get(config.app)
        .ok_or(OAuthError::NotRegistered(config.app))?;

    provider.login(config, code).await
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Standard authorization-code exchange, shared by the adapters.
///
/// The Accept header matters: GitHub's token endpoint answers with
/// form-encoding unless JSON is requested explicitly.
pub(crate) async fn exchange_code(
    client: &reqwest::Client,
    config: &OAuthClientConfig,
    code: &str,
) -> Result<String, OAuthError> {
    let params = [
        ("grant_type", "authorization_code"),
        ("code", code),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
        ("redirect_uri", config.redirect_url.as_str()),
    ];

    let response = client
        .post(&config.token_url)
        .header(reqwest::header::ACCEPT, "application/json")
        .form(&params)
        .send()
        .await
        .map_err(OAuthError::Exchange)?;

    let token: TokenResponse = response.json().await.map_err(OAuthError::Exchange)?;

    if token.access_token.is_empty() {
        let message = if token.error_description.is_empty() {
            token.error
        } else {
            token.error_description
        };
        return Err(OAuthError::Provider {
            app: config.app,
            message,
        });
    }

    Ok(token.access_token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(app: OAuthApp) -> OAuthClientConfig {
        OAuthClientConfig {
            app,
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            auth_url: "https://example.com/authorize".to_string(),
            token_url: "https://example.com/token".to_string(),
            redirect_url: "https://app.example.com/welcome".to_string(),
            scopes: Vec::new(),
        }
    }

    #[tokio::test]
    async fn missing_code_is_an_invalid_argument() {
        let registry = ProviderRegistry::new();

        for code in [None, Some(""), Some("   ")] {
            let result = authenticate(&registry, &config(OAuthApp::Github), code).await;
            assert!(
                matches!(result, Err(OAuthError::MissingCode)),
                "expected MissingCode for {code:?}, got {result:?}"
            );
        }
    }

    #[tokio::test]
    async fn unregistered_provider_is_a_configuration_error() {
        let registry = ProviderRegistry::new();

        let result = authenticate(&registry, &config(OAuthApp::Feishu), Some("abc")).await;

        assert!(
            matches!(result, Err(OAuthError::NotRegistered(OAuthApp::Feishu))),
            "expected NotRegistered, got {result:?}"
        );
    }

    #[test]
    fn token_response_decodes_provider_failures() {
        let token: TokenResponse = serde_json::from_str(
            r#"{"error":"bad_verification_code","error_description":"The code is wrong."}"#,
        )
        .unwrap();

        assert!(token.access_token.is_empty());
        assert_eq!(token.error_description, "The code is wrong.");
    }
}
