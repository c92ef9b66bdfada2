//! Namespace service facade.
//!
//! Thin pass-through over whichever repository the driver registry
//! constructed; the seam the transport layer consumes.

use std::sync::Arc;

use crate::{
    domain::namespaces::{
        models::{
            NamespaceListQuery, NamespacePage, NamespaceRecord, NamespaceSelectQuery,
            NamespaceSelection, NamespaceStatusUpdate, NamespaceUpdate, NewNamespace, ResultInfo,
        },
        repository::NamespaceRepository,
    },
    errors::RepositoryError,
    uid::Uid,
};

#[derive(Clone)]
pub struct NamespaceService {
    repository: Arc<dyn NamespaceRepository>,
}

impl std::fmt::Debug for NamespaceService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NamespaceService").finish_non_exhaustive()
    }
}

impl NamespaceService {
    #[must_use]
    pub fn new(repository: Arc<dyn NamespaceRepository>) -> Self {
        Self { repository }
    }

    /// Creates a namespace.
    ///
    /// # Errors
    ///
    /// Propagates the repository error unchanged.
    pub async fn create_namespace(
        &self,
        new: NewNamespace,
    ) -> Result<NamespaceRecord, RepositoryError> {
        self.repository.create_namespace(new).await
    }

    /// Retrieves a namespace by uid.
    ///
    /// # Errors
    ///
    /// Propagates the repository error unchanged.
    pub async fn get_namespace(&self, uid: Uid) -> Result<NamespaceRecord, RepositoryError> {
        self.repository.get_namespace(uid).await
    }

    /// Retrieves a namespace by name.
    ///
    /// # Errors
    ///
    /// Propagates the repository error unchanged.
    pub async fn get_namespace_by_name(
        &self,
        name: &str,
    ) -> Result<NamespaceRecord, RepositoryError> {
        self.repository.get_namespace_by_name(name).await
    }

    /// Rewrites name and metadata of a namespace.
    ///
    /// # Errors
    ///
    /// Propagates the repository error unchanged.
    pub async fn update_namespace(
        &self,
        update: NamespaceUpdate,
    ) -> Result<ResultInfo, RepositoryError> {
        self.repository.update_namespace(update).await
    }

    /// Transitions a namespace's status.
    ///
    /// # Errors
    ///
    /// Propagates the repository error unchanged.
    pub async fn update_namespace_status(
        &self,
        update: NamespaceStatusUpdate,
    ) -> Result<ResultInfo, RepositoryError> {
        self.repository.update_namespace_status(update).await
    }

    /// Deletes a namespace.
    ///
    /// # Errors
    ///
    /// Propagates the repository error unchanged.
    pub async fn delete_namespace(&self, uid: Uid) -> Result<ResultInfo, RepositoryError> {
        self.repository.delete_namespace(uid).await
    }

    /// Lists namespaces.
    ///
    /// # Errors
    ///
    /// Propagates the repository error unchanged.
    pub async fn list_namespace(
        &self,
        query: NamespaceListQuery,
    ) -> Result<NamespacePage, RepositoryError> {
        self.repository.list_namespace(query).await
    }

    /// Cursor-based selection.
    ///
    /// # Errors
    ///
    /// Propagates the repository error unchanged.
    pub async fn select_namespace(
        &self,
        query: NamespaceSelectQuery,
    ) -> Result<NamespaceSelection, RepositoryError> {
        self.repository.select_namespace(query).await
    }
}
