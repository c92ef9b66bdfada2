//! Auth service errors.

use thiserror::Error;

use crate::oauth::OAuthError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("token signing failed")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("invalid redirect URL")]
    RedirectUrl(#[source] url::ParseError),

    #[error("storage error")]
    Sql(#[from] sqlx::Error),

    #[error(transparent)]
    OAuth(#[from] OAuthError),
}
