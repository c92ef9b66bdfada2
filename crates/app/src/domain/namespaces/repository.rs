//! Namespace repository contract.

use std::{fmt, sync::Arc};

use async_trait::async_trait;
use mockall::automock;

use crate::{
    config::storage::StorageConfig,
    domain::namespaces::models::{
        NamespaceListQuery, NamespacePage, NamespaceRecord, NamespaceSelectQuery,
        NamespaceSelection, NamespaceStatusUpdate, NamespaceUpdate, NewNamespace, ResultInfo,
    },
    errors::RepositoryError,
    registry::Cleanup,
    uid::Uid,
};

/// Namespace persistence, polymorphic over the configured backend.
#[automock]
#[async_trait]
pub trait NamespaceRepository: Send + Sync {
    /// Creates a namespace, assigning its id and uid.
    async fn create_namespace(
        &self,
        new: NewNamespace,
    ) -> Result<NamespaceRecord, RepositoryError>;

    /// Retrieves a namespace by uid.
    async fn get_namespace(&self, uid: Uid) -> Result<NamespaceRecord, RepositoryError>;

    /// Retrieves a namespace by its unique name.
    async fn get_namespace_by_name(&self, name: &str)
    -> Result<NamespaceRecord, RepositoryError>;

    /// Rewrites name and metadata of the namespace with the given uid.
    async fn update_namespace(
        &self,
        update: NamespaceUpdate,
    ) -> Result<ResultInfo, RepositoryError>;

    /// Transitions the status of the namespace with the given uid.
    async fn update_namespace_status(
        &self,
        update: NamespaceStatusUpdate,
    ) -> Result<ResultInfo, RepositoryError>;

    /// Deletes the namespace with the given uid.
    async fn delete_namespace(&self, uid: Uid) -> Result<ResultInfo, RepositoryError>;

    /// Lists namespaces with filtering, sorting and page pagination.
    async fn list_namespace(
        &self,
        query: NamespaceListQuery,
    ) -> Result<NamespacePage, RepositoryError>;

    /// Cursor-based selection for incremental consumers.
    async fn select_namespace(
        &self,
        query: NamespaceSelectQuery,
    ) -> Result<NamespaceSelection, RepositoryError>;
}

/// A constructed repository plus its teardown.
pub struct NamespaceHandle {
    pub repository: Arc<dyn NamespaceRepository>,
    pub cleanup: Cleanup,
}

impl fmt::Debug for NamespaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamespaceHandle").finish_non_exhaustive()
    }
}

/// Constructor registered in the driver registry, one per backend.
#[async_trait]
pub trait NamespaceRepositoryFactory: Send + Sync {
    async fn build(&self, config: &StorageConfig) -> Result<NamespaceHandle, RepositoryError>;
}

/// Registry entry type for namespace backends.
pub type NamespaceFactory = Arc<dyn NamespaceRepositoryFactory>;
