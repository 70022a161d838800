//! `storefront-cart`: the shopper's cart and the per-user record it lives in.
//!
//! The cart has exactly one active scope. Anonymous carts are kept in device storage and
//! survive sign-in untouched; identified carts are kept in the user's record. Switching scope
//! never merges the two.

pub mod item;
pub mod store;
pub mod user_record;

pub use item::{CartItem, CartScope};
pub use store::{CartChanged, CartStore};
pub use user_record::{UserRecord, cart_fields, profile_fields};
