//! Auth domain records and login shapes.

use crate::{oauth::AuthenticatedUser, uid::Uid};

/// A login attempt: the normalized provider user plus where to send them
/// afterwards.
#[derive(Debug, Clone)]
pub struct LoginRequest {
    /// OAuth redirect target; the issued token is appended as a `token`
    /// query parameter.
    pub redirect_url: String,
    pub user: AuthenticatedUser,
}

/// Successful login outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginResponse {
    pub redirect_url: String,
}

/// External identity row, keyed by the provider-assigned open id. Its `uid`
/// points at the bound local user and is rewritten on re-binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthIdentityRecord {
    pub id: i64,
    pub uid: Uid,
    pub open_id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub app: String,
    pub raw: String,
}

/// Local user row, provider-agnostic, keyed by email.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserRecord {
    pub id: i64,
    pub uid: Uid,
    pub name: String,
    pub nickname: String,
    pub remark: String,
    pub email: String,
    pub avatar: String,
}
