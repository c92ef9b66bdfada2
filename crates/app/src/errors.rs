//! Repository errors.

use sqlx::error::{DatabaseError, ErrorKind};
use thiserror::Error;

/// Errors surfaced by namespace repositories, independent of backend.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error("{0} already exists")]
    AlreadyExists(String),

    #[error("{0} is not supported by this backend")]
    Unimplemented(&'static str),

    #[error("{context}")]
    Internal {
        context: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("storage i/o failed")]
    Io(#[from] std::io::Error),

    #[error("namespace file is malformed")]
    Yaml(#[from] serde_norway::Error),

    #[error("storage error")]
    Sql(#[source] sqlx::Error),
}

impl RepositoryError {
    /// Wrap a lower-level failure with a human-readable context line.
    pub fn internal(
        context: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Internal {
            context: context.into(),
            source: Box::new(source),
        }
    }
}

impl From<sqlx::Error> for RepositoryError {
    fn from(error: sqlx::Error) -> Self {
        if matches!(error, sqlx::Error::RowNotFound) {
            return Self::NotFound("record".to_string());
        }

        match error.as_database_error().map(DatabaseError::kind) {
            Some(ErrorKind::UniqueViolation) => Self::AlreadyExists("record".to_string()),
            Some(ErrorKind::NotNullViolation) => {
                Self::InvalidArgument("missing required column".to_string())
            }
            Some(ErrorKind::CheckViolation) => Self::InvalidArgument("invalid data".to_string()),
            _ => Self::Sql(error),
        }
    }
}
