//! GitHub login adapter.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::oauth::{
    AuthenticatedUser, OAuthApp, OAuthClientConfig, OAuthError, OAuthProvider, ProviderUser,
    exchange_code,
};

const USER_INFO_URL: &str = "https://api.github.com/user";

/// GitHub OAuth2 adapter.
#[derive(Debug, Clone, Default)]
pub struct GithubProvider {
    client: reqwest::Client,
}

impl GithubProvider {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OAuthProvider for GithubProvider {
    fn app(&self) -> OAuthApp {
        OAuthApp::Github
    }

    async fn login(
        &self,
        config: &OAuthClientConfig,
        code: &str,
    ) -> Result<AuthenticatedUser, OAuthError> {
        let token = exchange_code(&self.client, config, code).await?;

        let response = self
            .client
            .get(USER_INFO_URL)
            .bearer_auth(&token)
            // GitHub rejects requests without a User-Agent.
            .header(reqwest::header::USER_AGENT, "enclave")
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(OAuthError::UserInfo)?;

        let user: GithubUser = response.json().await.map_err(OAuthError::Decode)?;

        Ok(AuthenticatedUser::from_provider_user(&user))
    }
}

/// User payload of the GitHub user endpoint. Display name and email are
/// nullable on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GithubUser {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
}

impl ProviderUser for GithubUser {
    fn app(&self) -> OAuthApp {
        OAuthApp::Github
    }

    fn open_id(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> String {
        self.login.clone()
    }

    fn nickname(&self) -> String {
        self.name.clone().unwrap_or_default()
    }

    fn email(&self) -> String {
        self.email.clone().unwrap_or_default()
    }

    fn avatar(&self) -> String {
        self.avatar_url.clone()
    }

    fn raw(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_decodes_with_nullable_fields() {
        let user: GithubUser = serde_json::from_str(
            r#"{
                "id": 583231,
                "login": "octocat",
                "name": null,
                "email": null,
                "avatar_url": "https://avatars.githubusercontent.com/u/583231"
            }"#,
        )
        .unwrap();

        assert_eq!(user.open_id(), "583231");
        assert_eq!(user.name(), "octocat");
        assert_eq!(user.email(), "");
        assert_eq!(user.nickname(), "");
    }

    #[test]
    fn numeric_id_becomes_the_open_id() {
        let user: GithubUser = serde_json::from_str(
            r#"{"id": 1, "login": "mona", "name": "Mona Lisa", "email": "mona@example.com"}"#,
        )
        .unwrap();

        let canonical = AuthenticatedUser::from_provider_user(&user);

        assert_eq!(canonical.open_id, "1");
        assert_eq!(canonical.nickname, "Mona Lisa");
        assert_eq!(canonical.email, "mona@example.com");
    }
}
