//! `storefront-session`
//!
//! **Responsibility:** one explicit context per storefront session (browser tab).
//!
//! This crate wires together:
//! - the realtime catalog and debounced search ([`CatalogView`]s for the renderer)
//! - the cart and the identity transitions that switch its scope
//! - account flows driven by [`InputRequest`]s instead of blocking prompts
//! - user-facing [`Notice`]s, the only place errors end up
//!
//! The UI layer owns the receiving ends in [`SessionChannels`].

pub mod account;
pub mod notice;
pub mod prompt;
pub mod session;
pub mod view;
pub mod watcher;

pub use account::{AccountFlows, ProfileImage, profile_upload_path};
pub use notice::{Notice, NoticeLevel, Notifier};
pub use prompt::{InputField, InputRequest, InputResponse, Prompter};
pub use session::{Session, SessionChannels};
pub use view::CatalogView;
pub use watcher::{AuthView, IdentityWatcher, SignedInUser};
