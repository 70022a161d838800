//! Subscription mechanics shared by the realtime collaborators.
//!
//! The managed backend pushes state (catalog snapshots, auth-state changes) through
//! callbacks. This crate provides the two pieces every feed needs: a listener registry
//! with broadcast fan-out and a cancellable handle that removes a listener again.

pub mod registry;
pub mod subscription;

pub use registry::{Callback, ListenerRegistry};
pub use subscription::SubscriptionHandle;
