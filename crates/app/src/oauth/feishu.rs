//! Feishu login adapter.
//!
//! Feishu wraps user info in a `{code, msg, data}` envelope; a non-zero code
//! inside an otherwise successful response is an application-level failure
//! carrying the provider's message.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::oauth::{
    AuthenticatedUser, OAuthApp, OAuthClientConfig, OAuthError, OAuthProvider, ProviderUser,
    exchange_code,
};

const USER_INFO_URL: &str = "https://open.feishu.cn/open-apis/authen/v1/user_info";

/// Feishu OAuth2 adapter.
#[derive(Debug, Clone, Default)]
pub struct FeishuProvider {
    client: reqwest::Client,
}

impl FeishuProvider {
    #[must_use]
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl OAuthProvider for FeishuProvider {
    fn app(&self) -> OAuthApp {
        OAuthApp::Feishu
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

        let envelope: UserEnvelope = response.json().await.map_err(OAuthError::Decode)?;
        let user = envelope.into_user()?;

        Ok(AuthenticatedUser::from_provider_user(&user))
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct UserEnvelope {
    #[serde(default)]
    code: i64,
    #[serde(default)]
    msg: String,
    data: Option<FeishuUser>,
}

impl UserEnvelope {
    pub(crate) fn into_user(self) -> Result<FeishuUser, OAuthError> {
        match self.data {
            Some(user) if self.code == 0 => Ok(user),
            _ => Err(OAuthError::Provider {
                app: OAuthApp::Feishu,
                message: self.msg,
            }),
        }
    }
}

/// User payload of the Feishu user-info endpoint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeishuUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub en_name: String,
    #[serde(default)]
    pub avatar_url: String,
    /// Unique identifier of the user within the requesting application.
    #[serde(default)]
    pub open_id: String,
    /// Unique identifier across the Feishu open platform.
    #[serde(default)]
    pub union_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub enterprise_email: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub tenant_key: String,
    #[serde(default)]
    pub employee_no: String,
}

impl ProviderUser for FeishuUser {
    fn app(&self) -> OAuthApp {
        OAuthApp::Feishu
    }

    fn open_id(&self) -> String {
        self.open_id.clone()
    }

    fn name(&self) -> String {
        self.name.clone()
    }

    fn email(&self) -> String {
        self.email.clone()
    }

    fn avatar(&self) -> String {
        self.avatar_url.clone()
    }

    fn raw(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
