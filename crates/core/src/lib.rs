//! `storefront-core`: shared building blocks for the storefront client.
//!
//! This crate contains **pure** primitives (no collaborators, no IO): identifiers,
//! the error taxonomy, value objects and configuration.

pub mod config;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use config::StoreConfig;
pub use entity::Entity;
pub use error::{StoreError, StoreResult};
pub use id::{ProductId, UserId};
pub use value_object::{Price, ValueObject};
