//! SQLite-backed login repository.
//!
//! The login pipeline: validate → find-or-create the external identity by
//! open id → find-or-create the local user by email → bind them → issue a
//! signed token → append it to the redirect URL. The find-or-create/bind
//! sequence runs inside one transaction, and `open_id`/`email` carry unique
//! indexes, so concurrent first logins for the same person cannot produce
//! duplicate rows.

use std::sync::Arc;

use async_trait::async_trait;
use sqlx::{FromRow, Row, Sqlite, SqlitePool, Transaction, query, query_as, sqlite::SqliteRow};
use tracing::debug;
use url::Url;

use crate::{
    config::storage::StorageConfig,
    database,
    domain::auth::{
        errors::AuthError,
        jwt::{self, JwtConfig},
        models::{LoginRequest, LoginResponse, OAuthIdentityRecord, UserRecord},
        repository::{LoginHandle, LoginRepository, LoginRepositoryFactory},
    },
    oauth::AuthenticatedUser,
    registry::Cleanup,
    uid::{SnowflakeGenerator, Uid},
};

const GET_OAUTH_USER_SQL: &str = include_str!("sql/get_oauth_user.sql");
const CREATE_OAUTH_USER_SQL: &str = include_str!("sql/create_oauth_user.sql");
const GET_USER_BY_EMAIL_SQL: &str = include_str!("sql/get_user_by_email.sql");
const CREATE_USER_SQL: &str = include_str!("sql/create_user.sql");
const BIND_OAUTH_USER_SQL: &str = include_str!("sql/bind_oauth_user.sql");

/// Builds [`SqliteLoginRepository`] instances; registered under the `sqlite`
/// driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct SqliteLoginFactory;

#[async_trait]
impl LoginRepositoryFactory for SqliteLoginFactory {
    async fn build(
        &self,
        config: &StorageConfig,
        jwt: &JwtConfig,
    ) -> Result<LoginHandle, AuthError> {
        let url = config
            .require_database_url()
            .map_err(|error| AuthError::InvalidArgument(error.to_string()))?;
        let generator = Arc::new(
            SnowflakeGenerator::new(config.node_id)
                .map_err(|error| AuthError::InvalidArgument(error.to_string()))?,
        );

        let pool = database::connect(url).await?;
        let repository = Arc::new(SqliteLoginRepository::new(
            pool.clone(),
            generator,
            jwt.clone(),
        ));

        let cleanup: Cleanup = Box::new(move || {
            Box::pin(async move {
                pool.close().await;
                Ok(())
            })
        });

        Ok(LoginHandle {
            repository,
            cleanup,
        })
    }
}

/// SQLite login repository.
#[derive(Debug, Clone)]
pub struct SqliteLoginRepository {
    pool: SqlitePool,
    generator: Arc<SnowflakeGenerator>,
    jwt: JwtConfig,
}

impl SqliteLoginRepository {
    #[must_use]
    pub fn new(pool: SqlitePool, generator: Arc<SnowflakeGenerator>, jwt: JwtConfig) -> Self {
        Self {
            pool,
            generator,
            jwt,
        }
    }

    async fn find_or_create_identity(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user: &AuthenticatedUser,
    ) -> Result<OAuthIdentityRecord, AuthError> {
        if let Some(identity) = query_as::<Sqlite, OAuthIdentityRecord>(GET_OAUTH_USER_SQL)
            .bind(&user.open_id)
            .fetch_optional(&mut **tx)
            .await?
        {
            return Ok(identity);
        }

        let now = jiff::Timestamp::now().as_second();
        let uid = self.generator.generate();
        debug!(open_id = %user.open_id, %uid, "creating oauth identity");

        query(CREATE_OAUTH_USER_SQL)
            .bind(uid.value())
            .bind(&user.open_id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.avatar)
            .bind(user.app.to_string())
            .bind(user.raw.to_string())
            .bind(now)
            .execute(&mut **tx)
            .await?;

        let identity = query_as::<Sqlite, OAuthIdentityRecord>(GET_OAUTH_USER_SQL)
            .bind(&user.open_id)
            .fetch_one(&mut **tx)
            .await?;
        Ok(identity)
    }

    async fn find_or_create_user(
        &self,
        tx: &mut Transaction<'_, Sqlite>,
        user: &AuthenticatedUser,
    ) -> Result<UserRecord, AuthError> {
        if let Some(local) = query_as::<Sqlite, UserRecord>(GET_USER_BY_EMAIL_SQL)
            .bind(&user.email)
            .fetch_optional(&mut **tx)
            .await?
        {
            return Ok(local);
        }

        let now = jiff::Timestamp::now().as_second();
        let uid = self.generator.generate();
        debug!(email = %user.email, %uid, "creating local user");

        query(CREATE_USER_SQL)
            .bind(uid.value())
            .bind(&user.name)
            .bind(&user.nickname)
            .bind(&user.remark)
            .bind(&user.email)
            .bind(&user.avatar)
            .bind(now)
            .execute(&mut **tx)
            .await?;

        let local = query_as::<Sqlite, UserRecord>(GET_USER_BY_EMAIL_SQL)
            .bind(&user.email)
            .fetch_one(&mut **tx)
            .await?;
        Ok(local)
    }
}

#[async_trait]
impl LoginRepository for SqliteLoginRepository {
    async fn login(&self, request: LoginRequest) -> Result<LoginResponse, AuthError> {
        let user = &request.user;
        if user.email.trim().is_empty() {
            return Err(AuthError::InvalidArgument("email is empty".to_string()));
        }
        if user.open_id.trim().is_empty() {
            return Err(AuthError::InvalidArgument("open id is empty".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let identity = self.find_or_create_identity(&mut tx, user).await?;
        let local = self.find_or_create_user(&mut tx, user).await?;

        // Bind, unless this identity already points at the user. Last
        // successful login wins the binding.
        if identity.uid != local.uid {
            let now = jiff::Timestamp::now().as_second();
            query(BIND_OAUTH_USER_SQL)
                .bind(&identity.open_id)
                .bind(local.uid.value())
                .bind(now)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        let token = jwt::issue_token(&self.jwt, local.uid, &local.email)?;
        let redirect_url = append_token(&request.redirect_url, &token)?;

        Ok(LoginResponse { redirect_url })
    }
}

/// Set the `token` query parameter on the redirect URL, replacing any
/// caller-supplied value of the same name.
fn append_token(redirect_url: &str, token: &str) -> Result<String, AuthError> {
    let mut url = Url::parse(redirect_url).map_err(AuthError::RedirectUrl)?;

    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != "token")
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    {
        let mut pairs = url.query_pairs_mut();
        pairs.clear();
        pairs.extend_pairs(kept);
        pairs.append_pair("token", token);
    }

    Ok(url.to_string())
}

impl<'r> FromRow<'r, SqliteRow> for OAuthIdentityRecord {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            uid: Uid::new(row.try_get("uid")?),
            open_id: row.try_get("open_id")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            avatar: row.try_get("avatar")?,
            app: row.try_get("app")?,
            raw: row.try_get("raw")?,
        })
    }
}

impl<'r> FromRow<'r, SqliteRow> for UserRecord {
    fn from_row(row: &'r SqliteRow) -> sqlx::Result<Self> {
        Ok(Self {
            id: row.try_get("id")?,
            uid: Uid::new(row.try_get("uid")?),
            name: row.try_get("name")?,
            nickname: row.try_get("nickname")?,
            remark: row.try_get("remark")?,
            email: row.try_get("email")?,
            avatar: row.try_get("avatar")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use sqlx::query_scalar;
    use testresult::TestResult;

    use crate::{
        domain::auth::jwt::{JwtSecret, parse_token},
        oauth::OAuthApp,
        test::db::memory_pool,
    };

    use super::*;

    fn jwt_config() -> JwtConfig {
        JwtConfig {
            secret: JwtSecret::new("login-test-secret"),
            issuer: "enclave-test".to_string(),
            expire: Duration::from_secs(3600),
        }
    }

    async fn repository() -> SqliteLoginRepository {
        let pool = memory_pool().await;
        let generator = Arc::new(SnowflakeGenerator::new(1).expect("valid node id"));
        SqliteLoginRepository::new(pool, generator, jwt_config())
    }

    fn feishu_user(open_id: &str, email: &str) -> AuthenticatedUser {
        AuthenticatedUser {
            app: OAuthApp::Feishu,
            open_id: open_id.to_string(),
            name: "Ada".to_string(),
            nickname: String::new(),
            remark: String::new(),
            email: email.to_string(),
            avatar: "https://avatars.example.com/ada".to_string(),
            raw: serde_json::json!({"open_id": open_id}),
        }
    }

    fn request(user: AuthenticatedUser) -> LoginRequest {
        LoginRequest {
            redirect_url: "https://app.example.com/welcome?from=cli".to_string(),
            user,
        }
    }

    #[tokio::test]
    async fn first_login_creates_identity_user_and_token() -> TestResult {
        let repository = repository().await;

        let response = repository
            .login(request(feishu_user("ou_1", "ada@example.com")))
            .await?;

        let url = Url::parse(&response.redirect_url)?;
        let token = url
            .query_pairs()
            .find(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .expect("redirect URL must carry a token");

        let claims = parse_token(&JwtSecret::new("login-test-secret"), &token)?;
        assert_eq!(claims.username, "ada@example.com");
        assert_eq!(claims.iss, "enclave-test");
        assert!(claims.uid > 0, "claims must carry the user uid");

        // The original query parameters survive.
        assert!(
            url.query_pairs().any(|(key, value)| key == "from" && value == "cli"),
            "caller query parameters must be preserved"
        );

        let users: i64 = query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&repository.pool)
            .await?;
        let identities: i64 = query_scalar("SELECT COUNT(*) FROM oauth_users")
            .fetch_one(&repository.pool)
            .await?;
        assert_eq!((users, identities), (1, 1));

        Ok(())
    }

    #[tokio::test]
    async fn repeated_logins_do_not_duplicate_rows() -> TestResult {
        let repository = repository().await;

        for _ in 0..3 {
            repository
                .login(request(feishu_user("ou_1", "ada@example.com")))
                .await?;
        }

        let users: i64 = query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&repository.pool)
            .await?;
        let identities: i64 = query_scalar("SELECT COUNT(*) FROM oauth_users")
            .fetch_one(&repository.pool)
            .await?;
        assert_eq!((users, identities), (1, 1));

        Ok(())
    }

    #[tokio::test]
    async fn identities_from_two_providers_bind_to_one_user() -> TestResult {
        let repository = repository().await;

        repository
            .login(request(feishu_user("ou_1", "ada@example.com")))
            .await?;

        let github = AuthenticatedUser {
            app: OAuthApp::Github,
            open_id: "583231".to_string(),
            ..feishu_user("", "ada@example.com")
        };
        repository.login(request(github)).await?;

        let users: i64 = query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&repository.pool)
            .await?;
        assert_eq!(users, 1, "one email means one local user");

        let distinct_uids: i64 =
            query_scalar("SELECT COUNT(DISTINCT uid) FROM oauth_users")
                .fetch_one(&repository.pool)
                .await?;
        assert_eq!(distinct_uids, 1, "both identities must point at the same user");

        Ok(())
    }

    #[tokio::test]
    async fn empty_email_fails_without_side_effects() -> TestResult {
        let repository = repository().await;

        let result = repository.login(request(feishu_user("ou_1", ""))).await;

        assert!(
            matches!(result, Err(AuthError::InvalidArgument(_))),
            "expected InvalidArgument, got {result:?}"
        );

        let identities: i64 = query_scalar("SELECT COUNT(*) FROM oauth_users")
            .fetch_one(&repository.pool)
            .await?;
        assert_eq!(identities, 0, "validation failures must leave no rows behind");

        Ok(())
    }

    #[tokio::test]
    async fn empty_open_id_is_rejected() {
        let repository = repository().await;

        let result = repository
            .login(request(feishu_user("", "ada@example.com")))
            .await;

        assert!(
            matches!(result, Err(AuthError::InvalidArgument(_))),
            "expected InvalidArgument, got {result:?}"
        );
    }

    #[tokio::test]
    async fn invalid_redirect_url_is_rejected() {
        let repository = repository().await;

        let result = repository
            .login(LoginRequest {
                redirect_url: "::not a url::".to_string(),
                user: feishu_user("ou_1", "ada@example.com"),
            })
            .await;

        assert!(
            matches!(result, Err(AuthError::RedirectUrl(_))),
            "expected RedirectUrl, got {result:?}"
        );
    }

    #[test]
    fn append_token_replaces_an_existing_token_parameter() -> TestResult {
        let url = append_token("https://app.example.com/cb?token=stale&keep=1", "fresh")?;

        let parsed = Url::parse(&url)?;
        let tokens: Vec<String> = parsed
            .query_pairs()
            .filter(|(key, _)| key == "token")
            .map(|(_, value)| value.into_owned())
            .collect();

        assert_eq!(tokens, ["fresh"], "exactly one fresh token parameter");
        assert!(
            parsed.query_pairs().any(|(key, value)| key == "keep" && value == "1"),
            "other parameters survive"
        );

        Ok(())
    }
}
