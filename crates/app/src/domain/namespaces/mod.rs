//! Namespaces

pub mod file;
pub mod models;
pub mod repository;
pub mod service;
pub mod sqlite;

pub use repository::{NamespaceFactory, NamespaceHandle, NamespaceRepository};
pub use service::NamespaceService;
