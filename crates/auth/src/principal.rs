use serde::{Deserialize, Serialize};

use storefront_core::UserId;

use crate::{Permission, Role};

/// An authenticated identity as reported by the identity provider.
///
/// `roles` are the provider-issued claims. A freshly created account carries none.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Identity {
    pub fn new(user_id: UserId, email: impl Into<String>) -> Self {
        Self {
            user_id,
            email: email.into(),
            roles: Vec::new(),
        }
    }

    pub fn with_role(mut self, role: Role) -> Self {
        if !self.roles.contains(&role) {
            self.roles.push(role);
        }
        self
    }

    pub fn has_role(&self, role: &Role) -> bool {
        self.roles.contains(role)
    }

    /// Effective permissions derived from all role claims.
    pub fn permissions(&self) -> Vec<Permission> {
        let mut perms: Vec<Permission> = Vec::new();
        for perm in self.roles.iter().flat_map(Role::permissions) {
            if !perms.contains(&perm) {
                perms.push(perm);
            }
        }
        perms
    }
}
