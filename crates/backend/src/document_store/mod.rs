//! Document database boundary.
//!
//! Contract plus an in-memory implementation that mirrors the managed backend's merge,
//! ordering and realtime semantics closely enough for tests and local development.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{
    Direction, Document, DocumentStore, FeedCallback, FieldFilter, OrderBy, Query, Record,
    SERVER_TIMESTAMP_KEY, WriteOp, compare_values, from_record, is_server_timestamp,
    server_timestamp, to_record,
};
