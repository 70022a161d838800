//! `storefront-auth`: authorization boundary for the storefront client.
//!
//! Authentication itself is delegated to the managed identity provider. This crate only
//! models what the provider hands back (an [`Identity`] with role claims) and decides
//! whether that identity may perform privileged operations such as catalog writes.
//!
//! There is deliberately no shared secret here: the admin gate is a role claim issued by
//! the backend, never a password compared in the client.

pub mod authorize;
pub mod permissions;
pub mod principal;
pub mod roles;

pub use authorize::{AuthzError, authorize};
pub use permissions::Permission;
pub use principal::Identity;
pub use roles::Role;
