//! Collaborator error model.

use thiserror::Error;

use storefront_core::StoreError;

/// Failure reported by one of the managed-backend collaborators.
///
/// These are **infrastructure errors**. The storefront maps them onto its own taxonomy:
/// identity rejections become `AuthFailure`, everything else becomes `PersistFailure`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The identity provider refused the request (bad credentials, weak password, ...).
    #[error("rejected by identity provider: {0}")]
    Rejected(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Network or service outage.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(String),
}

impl From<serde_json::Error> for BackendError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<std::io::Error> for BackendError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<BackendError> for StoreError {
    fn from(err: BackendError) -> Self {
        match err {
            BackendError::Rejected(reason) => StoreError::auth(reason),
            other => StoreError::persist(other.to_string()),
        }
    }
}
