//! App Context
//!
//! The composition root: builds the driver registries with an explicit
//! registration sequence, resolves the configured drivers, and constructs
//! the services the transport layer consumes.

use std::sync::Arc;

use thiserror::Error;
use tracing::info;

use crate::{
    config::{
        AppConfig,
        storage::{LoginDriver, NamespaceDriver, StorageConfig},
    },
    domain::{
        auth::{
            AuthError, LoginService,
            jwt::JwtConfig,
            repository::LoginFactory,
            sqlite::SqliteLoginFactory,
        },
        namespaces::{
            NamespaceService,
            file::FileNamespaceFactory,
            repository::NamespaceFactory,
            sqlite::SqliteNamespaceFactory,
        },
    },
    errors::RepositoryError,
    oauth::{
        OAuthApp, ProviderRegistry, feishu::FeishuProvider, gitee::GiteeProvider,
        github::GithubProvider,
    },
    registry::{Cleanup, DriverRegistry, RegistryError},
};

#[derive(Debug, Error)]
pub enum AppInitError {
    #[error("no namespace repository factory registered for driver {0}")]
    MissingNamespaceDriver(NamespaceDriver),

    #[error("no login repository factory registered for driver {0}")]
    MissingLoginDriver(LoginDriver),

    #[error(transparent)]
    Registry(#[from] RegistryError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Every capability registry, populated by an explicit call sequence at
/// startup rather than scattered module-initialization side effects.
#[derive(Debug)]
pub struct Registries {
    pub namespaces: DriverRegistry<NamespaceDriver, NamespaceFactory>,
    pub logins: DriverRegistry<LoginDriver, LoginFactory>,
    pub providers: Arc<ProviderRegistry>,
}

/// Registries with every built-in backend and provider registered.
///
/// # Errors
///
/// Returns an error when two registrations claim the same driver id.
pub fn default_registries() -> Result<Registries, RegistryError> {
    let namespaces: DriverRegistry<NamespaceDriver, NamespaceFactory> = DriverRegistry::new();
    namespaces.register(NamespaceDriver::Sqlite, Arc::new(SqliteNamespaceFactory))?;
    namespaces.register(NamespaceDriver::File, Arc::new(FileNamespaceFactory))?;

    let logins: DriverRegistry<LoginDriver, LoginFactory> = DriverRegistry::new();
    logins.register(LoginDriver::Sqlite, Arc::new(SqliteLoginFactory))?;

    let client = reqwest::Client::new();
    let providers = Arc::new(ProviderRegistry::new());
    providers.register(OAuthApp::Feishu, Arc::new(FeishuProvider::new(client.clone())))?;
    providers.register(OAuthApp::Github, Arc::new(GithubProvider::new(client.clone())))?;
    providers.register(OAuthApp::Gitee, Arc::new(GiteeProvider::new(client)))?;

    Ok(Registries {
        namespaces,
        logins,
        providers,
    })
}

/// Constructed services plus the teardown collected from their factories.
pub struct AppContext {
    pub namespaces: NamespaceService,
    /// Present when a JWT secret is configured.
    pub login: Option<LoginService>,
    cleanups: Vec<Cleanup>,
}

impl std::fmt::Debug for AppContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppContext")
            .field("login", &self.login.is_some())
            .finish_non_exhaustive()
    }
}

impl AppContext {
    /// Build namespace storage only, per the configured driver.
    ///
    /// # Errors
    ///
    /// Returns an error when the driver is unregistered or its backend
    /// fails to construct.
    pub async fn from_storage(storage: &StorageConfig) -> Result<Self, AppInitError> {
        let registries = default_registries()?;
        Self::build(&registries, storage, None).await
    }

    /// Build the full context: namespace storage, plus login when a JWT
    /// secret is configured.
    ///
    /// # Errors
    ///
    /// Returns an error when a driver is unregistered or a backend fails to
    /// construct.
    pub async fn from_config(config: &AppConfig) -> Result<Self, AppInitError> {
        let registries = default_registries()?;
        let login = config
            .jwt
            .jwt_config()
            .map(|jwt| (config.jwt.login_driver, jwt));
        Self::build(&registries, &config.storage, login).await
    }

    /// Resolve drivers against the given registries and construct services.
    ///
    /// # Errors
    ///
    /// An unregistered driver surfaces as a configuration error, never a
    /// panic.
    pub async fn build(
        registries: &Registries,
        storage: &StorageConfig,
        login: Option<(LoginDriver, JwtConfig)>,
    ) -> Result<Self, AppInitError> {
        let factory = registries
            .namespaces
            .get(storage.driver)
            .ok_or(AppInitError::MissingNamespaceDriver(storage.driver))?;
        let handle = factory.build(storage).await?;
        info!(driver = %storage.driver, "namespace repository ready");

        let mut cleanups = vec![handle.cleanup];
        let namespaces = NamespaceService::new(handle.repository);

        let login = match login {
            Some((driver, jwt)) => {
                let factory = registries
                    .logins
                    .get(driver)
                    .ok_or(AppInitError::MissingLoginDriver(driver))?;
                let handle = factory.build(storage, &jwt).await?;
                info!(driver = %driver, "login repository ready");

                cleanups.push(handle.cleanup);
                Some(LoginService::new(
                    handle.repository,
                    Arc::clone(&registries.providers),
                ))
            }
            None => None,
        };

        Ok(Self {
            namespaces,
            login,
            cleanups,
        })
    }

    /// Run every collected cleanup: final file flush, pool close. Callers
    /// must await this before process exit so the last write is not lost.
    ///
    /// # Errors
    ///
    /// Returns the first cleanup failure.
    pub async fn shutdown(self) -> Result<(), RepositoryError> {
        for cleanup in self.cleanups {
            cleanup().await?;
        }
        Ok(())
    }
}
