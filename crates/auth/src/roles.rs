use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Permission;

/// Role claim issued by the identity provider.
///
/// Roles are opaque strings on the wire; the mapping to permissions lives in
/// [`Role::permissions`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

pub const ADMIN: &str = "admin";
pub const CATALOG_EDITOR: &str = "catalog_editor";

impl Role {
    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn admin() -> Self {
        Self::new(ADMIN)
    }

    pub fn catalog_editor() -> Self {
        Self::new(CATALOG_EDITOR)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Permissions granted by this role. Unknown roles grant nothing.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            ADMIN => vec![Permission::wildcard()],
            CATALOG_EDITOR => vec![Permission::catalog_write()],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
