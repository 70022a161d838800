use thiserror::Error;

use storefront_core::StoreError;

use crate::{Identity, Permission};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
}

impl From<AuthzError> for StoreError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(perm) => StoreError::forbidden(perm),
        }
    }
}

/// Authorize an identity against a required permission.
///
/// - No IO
/// - No panics
/// - Pure policy check over role claims
pub fn authorize(identity: &Identity, required: &Permission) -> Result<(), AuthzError> {
    if identity.permissions().iter().any(|p| p.grants(required)) {
        Ok(())
    } else {
        tracing::debug!(
            user_id = %identity.user_id,
            permission = %required,
            "authorization denied"
        );
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Role;
    use storefront_core::UserId;

    fn shopper() -> Identity {
        Identity::new(UserId::new("u-1"), "shopper@example.com")
    }

    #[test]
    fn plain_identity_cannot_write_catalog() {
        let err = authorize(&shopper(), &Permission::catalog_write()).unwrap_err();
        assert_eq!(err, AuthzError::Forbidden("catalog.write".to_string()));
    }

    #[test]
    fn admin_role_grants_everything() {
        let admin = shopper().with_role(Role::admin());
        assert!(authorize(&admin, &Permission::catalog_write()).is_ok());
        assert!(authorize(&admin, &Permission::new("orders.refund")).is_ok());
    }

    #[test]
    fn catalog_editor_is_scoped() {
        let editor = shopper().with_role(Role::catalog_editor());
        assert!(authorize(&editor, &Permission::catalog_write()).is_ok());
        assert!(authorize(&editor, &Permission::new("orders.refund")).is_err());
    }

    #[test]
    fn unknown_roles_grant_nothing() {
        let id = shopper().with_role(Role::new("vip"));
        assert!(id.permissions().is_empty());
    }

    #[test]
    fn forbidden_maps_to_store_error() {
        let err: StoreError = AuthzError::Forbidden("catalog.write".into()).into();
        assert_eq!(err, StoreError::Forbidden("catalog.write".into()));
    }

    #[test]
    fn roles_deserialize_from_claim_strings() {
        let id: Identity = serde_json::from_str(
            r#"{"user_id":"u-9","email":"a@b.c","roles":["admin"]}"#,
        )
        .unwrap();
        assert!(id.has_role(&Role::admin()));
    }
}
