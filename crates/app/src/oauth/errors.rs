//! OAuth adapter errors.

use thiserror::Error;

use crate::oauth::OAuthApp;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("authorization code is required")]
    MissingCode,

    #[error("no login adapter registered for provider {0}")]
    NotRegistered(OAuthApp),

    #[error("exchange token failed")]
    Exchange(#[source] reqwest::Error),

    #[error("get user info failed")]
    UserInfo(#[source] reqwest::Error),

    #[error("decode user info failed")]
    Decode(#[source] reqwest::Error),

    #[error("{app} login failed: {message}")]
    Provider { app: OAuthApp, message: String },
}
