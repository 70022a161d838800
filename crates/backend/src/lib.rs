//! Collaborator boundary: the managed backend as seen by the storefront client.
//!
//! The identity provider, document store, blob store and device storage are opaque
//! services. This crate defines their contracts as traits, the error type they fail
//! with, and in-memory implementations for tests and local development.

pub mod blob_store;
pub mod context;
pub mod device_storage;
pub mod document_store;
pub mod error;
pub mod identity;
pub mod memory;

pub use blob_store::{BlobRef, BlobStore, InMemoryBlobStore};
pub use context::StoreContext;
pub use device_storage::{DeviceStorage, FileDeviceStorage, InMemoryDeviceStorage};
pub use document_store::{
    Direction, Document, DocumentStore, FeedCallback, FieldFilter, InMemoryDocumentStore,
    OrderBy, Query, Record, WriteOp, from_record, server_timestamp, to_record,
};
pub use error::BackendError;
pub use identity::{AuthStateCallback, IdentityProvider, InMemoryIdentityProvider};
pub use memory::InMemoryBackend;
