//! Client configuration.
//!
//! Defaults match the production backend layout. Every field can be overridden through a
//! `STOREFRONT_*` environment variable; unparsable values keep the default and log a warning.

use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_PRODUCTS_COLLECTION: &str = "products";
pub const DEFAULT_USERS_COLLECTION: &str = "nh_users";
pub const DEFAULT_LOCAL_CART_KEY: &str = "nh_local_cart";
pub const DEFAULT_PROFILE_UPLOAD_PREFIX: &str = "profiles";
pub const DEFAULT_SEARCH_DEBOUNCE_MS: u64 = 1_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Document collection holding the catalog.
    pub products_collection: String,
    /// Document collection holding one record per user (profile + remote cart).
    pub users_collection: String,
    /// Device storage key of the anonymous cart.
    pub local_cart_key: String,
    /// Blob path prefix for uploaded profile pictures.
    pub profile_upload_prefix: String,
    /// Quiet period after the last keystroke before search results are rendered.
    pub search_debounce_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            products_collection: DEFAULT_PRODUCTS_COLLECTION.to_string(),
            users_collection: DEFAULT_USERS_COLLECTION.to_string(),
            local_cart_key: DEFAULT_LOCAL_CART_KEY.to_string(),
            profile_upload_prefix: DEFAULT_PROFILE_UPLOAD_PREFIX.to_string(),
            search_debounce_ms: DEFAULT_SEARCH_DEBOUNCE_MS,
        }
    }
}

impl StoreConfig {
    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary variable source (tests, embedding hosts).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = non_empty("STOREFRONT_PRODUCTS_COLLECTION") {
            config.products_collection = v;
        }
        if let Some(v) = non_empty("STOREFRONT_USERS_COLLECTION") {
            config.users_collection = v;
        }
        if let Some(v) = non_empty("STOREFRONT_LOCAL_CART_KEY") {
            config.local_cart_key = v;
        }
        if let Some(v) = non_empty("STOREFRONT_PROFILE_UPLOAD_PREFIX") {
            config.profile_upload_prefix = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = non_empty("STOREFRONT_SEARCH_DEBOUNCE_MS") {
            match v.trim().parse::<u64>() {
                Ok(ms) => config.search_debounce_ms = ms,
                Err(err) => tracing::warn!(
                    value = %v,
                    "STOREFRONT_SEARCH_DEBOUNCE_MS is not a number ({err}); keeping {}ms",
                    config.search_debounce_ms
                ),
            }
        }

        config
    }

    pub fn search_debounce(&self) -> Duration {
        Duration::from_millis(self.search_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_match_backend_layout() {
        let config = StoreConfig::default();
        assert_eq!(config.products_collection, "products");
        assert_eq!(config.users_collection, "nh_users");
        assert_eq!(config.local_cart_key, "nh_local_cart");
        assert_eq!(config.search_debounce(), Duration::from_secs(1));
    }

    #[test]
    fn lookup_overrides_and_ignores_garbage() {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("STOREFRONT_USERS_COLLECTION", "shoppers"),
            ("STOREFRONT_PROFILE_UPLOAD_PREFIX", "avatars/"),
            ("STOREFRONT_SEARCH_DEBOUNCE_MS", "soon"),
            ("STOREFRONT_LOCAL_CART_KEY", "  "),
        ]);
        let config = StoreConfig::from_lookup(|k| vars.get(k).map(|v| v.to_string()));

        assert_eq!(config.users_collection, "shoppers");
        assert_eq!(config.profile_upload_prefix, "avatars");
        assert_eq!(config.search_debounce_ms, DEFAULT_SEARCH_DEBOUNCE_MS);
        assert_eq!(config.local_cart_key, DEFAULT_LOCAL_CART_KEY);
    }
}
