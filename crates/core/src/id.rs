//! Strongly-typed identifiers.
//!
//! Identifiers are assigned by the managed backend and are opaque strings, so unlike
//! locally generated ids these are not UUIDs.

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Identifier of a catalog product (document id in the products collection).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductId(String);

/// Identifier of an authenticated user (identity provider uid).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

macro_rules! impl_string_newtype {
    ($t:ty, $name:literal) => {
        impl $t {
            /// Wrap a backend-assigned identifier without validation.
            ///
            /// Prefer `str::parse` for untrusted input.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $t {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $t {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $t {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl AsRef<str> for $t {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl FromStr for $t {
            type Err = StoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Err(StoreError::validation(format!("{}: empty identifier", $name)));
                }
                // Document paths use '/' as the segment separator.
                if trimmed.contains('/') {
                    return Err(StoreError::validation(format!(
                        "{}: identifier must not contain '/'",
                        $name
                    )));
                }
                Ok(Self(trimmed.to_string()))
            }
        }
    };
}

impl_string_newtype!(ProductId, "ProductId");
impl_string_newtype!(UserId, "UserId");
