//! Gitee login adapter.
//!
//! Gitee's token endpoint wants the full credential set spelled out as
//! request parameters; the shared exchange already sends exactly that.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::oauth::{
    AuthenticatedUser, OAuthApp, OAuthClientConfig, OAuthError, OAuthProvider, ProviderUser,
    exchange_code,
};

const USER_INFO_URL: &str = "https://gitee.com/api/v5/user";

/// Gitee OAuth2 adapter.
#[derive(Debug, Clone, Default)]
pub struct GiteeProvider {
    client: reqwest::Client,
}

impl GiteeProvider {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OAuthProvider for GiteeProvider {
    fn app(&self) -> OAuthApp {
        OAuthApp::Gitee
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
            .send()
            .await
            .map_err(OAuthError::UserInfo)?;

        let user: GiteeUser = response.json().await.map_err(OAuthError::Decode)?;

        Ok(AuthenticatedUser::from_provider_user(&user))
    }
}

/// User payload of the Gitee user endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GiteeUser {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub remark: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub html_url: String,
}

impl ProviderUser for GiteeUser {
    fn app(&self) -> OAuthApp {
        OAuthApp::Gitee
    }

    fn open_id(&self) -> String {
        self.id.to_string()
    }

    fn name(&self) -> String {
        self.login.clone()
    }

    fn nickname(&self) -> String {
        self.name.clone()
    }

    fn remark(&self) -> String {
        self.remark.clone()
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
