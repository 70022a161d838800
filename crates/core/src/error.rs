//! Storefront error model.

use thiserror::Error;

use crate::id::ProductId;

/// Result type used across the storefront crates.
pub type StoreResult<T> = Result<T, StoreError>;

/// Storefront-level error.
///
/// Every variant is surfaced to the end user as a blocking notice by the session layer and
/// otherwise swallowed. There is no retry and no queued-write recovery.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// `add` referenced a product id missing from the current catalog snapshot.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),

    /// `remove` was given an index outside the active cart.
    #[error("cart index {index} out of range (cart has {len} items)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The identity provider rejected the request.
    #[error("authentication failed: {0}")]
    AuthFailure(String),

    /// A write (or read) against the document/blob store or device storage failed.
    #[error("persist failed: {0}")]
    PersistFailure(String),

    /// The current identity lacks a required permission.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// A value failed validation (e.g. an empty product name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// The signed-in account is flagged as disabled.
    #[error("account is disabled")]
    AccountDisabled,

    /// The operation needs an identified session.
    #[error("not signed in")]
    NotSignedIn,
}

impl StoreError {
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthFailure(msg.into())
    }

    pub fn persist(msg: impl Into<String>) -> Self {
        Self::PersistFailure(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn index_out_of_range(index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { index, len }
    }
}
