//! Identity provider boundary.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryIdentityProvider;
pub use r#trait::{AuthStateCallback, IdentityProvider};
