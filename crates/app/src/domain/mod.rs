//! Enclave Domain Concerns

pub mod auth;
pub mod namespaces;
