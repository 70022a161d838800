//! Value object trait: equality by value, not identity.

use serde::{Deserialize, Serialize};

/// Marker trait for value objects.
///
/// Value objects are **immutable** and **compared by value**. To "modify" one, build a new
/// one. Cart items copy value objects out of the catalog at add-time, which is what gives the
/// cart its snapshot semantics.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}

/// A price as the backend stores it: a decimal rendered as a string.
///
/// The client never does arithmetic on prices, it only displays them verbatim, so the
/// original text is kept exactly (`"9.99"`, `"10"`, `"4,50"` all round-trip unchanged).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(String);

impl Price {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl ValueObject for Price {}

impl core::fmt::Display for Price {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Price {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Price {
    fn from(value: String) -> Self {
        Self(value)
    }
}
