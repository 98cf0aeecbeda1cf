// tagwarden-core/src/error.rs

use crate::domain::error::DomainError;
use crate::infrastructure::error::InfrastructureError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TagwardenError {
    // --- DOMAIN ERRORS (rules, spec validation, planning) ---
    #[error(transparent)]
    Domain(#[from] DomainError),

    // --- INFRASTRUCTURE ERRORS (IO, parsing, warehouse transport) ---
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    // --- GENERIC / APPLICATION ---
    #[error("Internal Error: {0}")]
    InternalError(String),
}

// Manual implementations to avoid duplicate enum variants but keep ergonomics
impl From<std::io::Error> for TagwardenError {
    fn from(err: std::io::Error) -> Self {
        TagwardenError::Infrastructure(InfrastructureError::Io(err))
    }
}

impl From<duckdb::Error> for TagwardenError {
    fn from(err: duckdb::Error) -> Self {
        TagwardenError::Infrastructure(InfrastructureError::from(err))
    }
}

impl From<serde_yaml::Error> for TagwardenError {
    fn from(err: serde_yaml::Error) -> Self {
        TagwardenError::Infrastructure(InfrastructureError::YamlError(err))
    }
}

impl From<serde_json::Error> for TagwardenError {
    fn from(err: serde_json::Error) -> Self {
        TagwardenError::Infrastructure(InfrastructureError::JsonError(err))
    }
}
