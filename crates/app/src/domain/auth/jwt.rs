//! HMAC-signed login tokens.

use std::{fmt, time::Duration};

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::{domain::auth::errors::AuthError, uid::Uid};

/// Expiry applied when the configured one is zero.
pub const DEFAULT_EXPIRE: Duration = Duration::from_secs(10 * 60);

/// Issuer applied when the configured one is empty.
pub const DEFAULT_ISSUER: &str = "enclave";

/// HMAC signing secret, zeroized on drop.
#[derive(Clone)]
pub struct JwtSecret(String);

impl JwtSecret {
    #[must_use]
    pub fn new(secret: impl Into<String>) -> Self {
        Self(secret.into())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Debug for JwtSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("JwtSecret(**redacted**)")
    }
}

impl Drop for JwtSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

/// Token issuance settings.
#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: JwtSecret,
    pub issuer: String,
    pub expire: Duration,
}

/// Signed claim set: the user's uid and email, plus standard expiry/issuer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub uid: i64,
    pub username: String,
    pub exp: i64,
    pub iss: String,
}

/// Sign a token for the given user.
///
/// # Errors
///
/// Returns an error when HMAC signing fails.
pub fn issue_token(config: &JwtConfig, uid: Uid, username: &str) -> Result<String, AuthError> {
    let expire = if config.expire.is_zero() {
        DEFAULT_EXPIRE
    } else {
        config.expire
    };
    let issuer = if config.issuer.is_empty() {
        DEFAULT_ISSUER
    } else {
        config.issuer.as_str()
    };

    let now = jiff::Timestamp::now().as_second();
    let claims = Claims {
        uid: uid.value(),
        username: username.to_string(),
        exp: now + expire.as_secs() as i64,
        iss: issuer.to_string(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;
    Ok(token)
}

/// Parse and verify a token at the auth-consumption boundary.
///
/// # Errors
///
/// Any signature, shape, or expiry problem surfaces as
/// [`AuthError::Unauthorized`].
pub fn parse_token(secret: &JwtSecret, token: &str) -> Result<Claims, AuthError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|error| AuthError::Unauthorized(error.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(expire: Duration) -> JwtConfig {
        JwtConfig {
            secret: JwtSecret::new("test-secret"),
            issuer: String::new(),
            expire,
        }
    }

    #[test]
    fn issue_then_parse_round_trips() {
        let config = config(Duration::from_secs(3600));

        let token = issue_token(&config, Uid::new(99), "ada@example.com").unwrap();
        let claims = parse_token(&config.secret, &token).unwrap();

        assert_eq!(claims.uid, 99);
        assert_eq!(claims.username, "ada@example.com");
        assert_eq!(claims.iss, DEFAULT_ISSUER);
    }

    #[test]
    fn zero_expire_defaults_to_ten_minutes() {
        let config = config(Duration::ZERO);

        let token = issue_token(&config, Uid::new(1), "u@example.com").unwrap();
        let claims = parse_token(&config.secret, &token).unwrap();

        let now = jiff::Timestamp::now().as_second();
        let remaining = claims.exp - now;
        assert!(
            (590..=600).contains(&remaining),
            "expected ~10 minutes of validity, got {remaining}s"
        );
    }

    #[test]
    fn wrong_secret_is_unauthorized() {
        let config = config(Duration::from_secs(3600));
        let token = issue_token(&config, Uid::new(1), "u@example.com").unwrap();

        let result = parse_token(&JwtSecret::new("other-secret"), &token);

        assert!(
            matches!(result, Err(AuthError::Unauthorized(_))),
            "expected Unauthorized, got {result:?}"
        );
    }

    #[test]
    fn mangled_token_is_unauthorized() {
        let result = parse_token(&JwtSecret::new("s"), "not.a.token");

        assert!(
            matches!(result, Err(AuthError::Unauthorized(_))),
            "expected Unauthorized, got {result:?}"
        );
    }

    #[test]
    fn secret_debug_output_is_redacted() {
        let secret = JwtSecret::new("hunter2");

        assert_eq!(format!("{secret:?}"), "JwtSecret(**redacted**)");
    }
}
