//! OAuth Config

use clap::Args;

use crate::oauth::{OAuthApp, OAuthClientConfig};

const FEISHU_AUTH_URL: &str = "https://open.feishu.cn/open-apis/authen/v1/authorize";
const FEISHU_TOKEN_URL: &str = "https://open.feishu.cn/open-apis/authen/v2/oauth/token";
const GITHUB_AUTH_URL: &str = "https://github.com/login/oauth/authorize";
const GITHUB_TOKEN_URL: &str = "https://github.com/login/oauth/access_token";
const GITEE_AUTH_URL: &str = "https://gitee.com/oauth/authorize";
const GITEE_TOKEN_URL: &str = "https://gitee.com/oauth/token";

/// Per-provider OAuth2 credentials. A provider participates once its client
/// id, client secret, and redirect URL are all present.
#[derive(Debug, Clone, Default, Args)]
pub struct OAuthSettings {
    /// Feishu application id
    #[arg(long, env = "FEISHU_CLIENT_ID")]
    pub feishu_client_id: Option<String>,

    /// Feishu application secret
    #[arg(long, env = "FEISHU_CLIENT_SECRET", hide_env_values = true)]
    pub feishu_client_secret: Option<String>,

    /// Redirect target after a Feishu login
    #[arg(long, env = "FEISHU_REDIRECT_URL")]
    pub feishu_redirect_url: Option<String>,

    /// GitHub OAuth app client id
    #[arg(long, env = "GITHUB_CLIENT_ID")]
    pub github_client_id: Option<String>,

    /// GitHub OAuth app client secret
    #[arg(long, env = "GITHUB_CLIENT_SECRET", hide_env_values = true)]
    pub github_client_secret: Option<String>,

    /// Redirect target after a GitHub login
    #[arg(long, env = "GITHUB_REDIRECT_URL")]
    pub github_redirect_url: Option<String>,

    /// Gitee application client id
    #[arg(long, env = "GITEE_CLIENT_ID")]
    pub gitee_client_id: Option<String>,

    /// Gitee application client secret
    #[arg(long, env = "GITEE_CLIENT_SECRET", hide_env_values = true)]
    pub gitee_client_secret: Option<String>,

    /// Redirect target after a Gitee login
    #[arg(long, env = "GITEE_REDIRECT_URL")]
    pub gitee_redirect_url: Option<String>,
}

impl OAuthSettings {
    /// Client configs for every fully configured provider.
    #[must_use]
    pub fn client_configs(&self) -> Vec<OAuthClientConfig> {
        let candidates = [
            (
                OAuthApp::Feishu,
                &self.feishu_client_id,
                &self.feishu_client_secret,
                &self.feishu_redirect_url,
                FEISHU_AUTH_URL,
                FEISHU_TOKEN_URL,
            ),
            (
                OAuthApp::Github,
                &self.github_client_id,
                &self.github_client_secret,
                &self.github_redirect_url,
                GITHUB_AUTH_URL,
                GITHUB_TOKEN_URL,
            ),
            (
                OAuthApp::Gitee,
                &self.gitee_client_id,
                &self.gitee_client_secret,
                &self.gitee_redirect_url,
                GITEE_AUTH_URL,
                GITEE_TOKEN_URL,
            ),
        ];

        candidates
            .into_iter()
            .filter_map(|(app, id, secret, redirect, auth_url, token_url)| {
                match (id, secret, redirect) {
                    (Some(client_id), Some(client_secret), Some(redirect_url)) => {
                        Some(OAuthClientConfig {
                            app,
                            client_id: client_id.clone(),
                            client_secret: client_secret.clone(),
                            auth_url: auth_url.to_string(),
                            token_url: token_url.to_string(),
                            redirect_url: redirect_url.clone(),
                            scopes: Vec::new(),
                        })
                    }
                    _ => None,
                }
            })
            .collect()
    }

    /// Client config for one provider, when fully configured.
    #[must_use]
    pub fn client_config(&self, app: OAuthApp) -> Option<OAuthClientConfig> {
        self.client_configs()
            .into_iter()
            .find(|config| config.app == app)
    }
}
