use std::sync::Arc;

use storefront_auth::Identity;
use storefront_events::SubscriptionHandle;

use crate::error::BackendError;

/// Listener for auth-state changes: `Some` when an identity is signed in, `None` otherwise.
pub type AuthStateCallback = Arc<dyn Fn(Option<Identity>) + Send + Sync>;

/// Managed identity provider.
///
/// Credential checks, password storage and token issuance all happen on the provider
/// side. Failures the user can act on (wrong password, weak password, duplicate email)
/// are reported as [`BackendError::Rejected`].
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Create an account and sign it in.
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, BackendError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError>;

    async fn sign_out(&self) -> Result<(), BackendError>;

    /// Ask the provider to e-mail a password-reset link.
    async fn send_password_reset(&self, email: &str) -> Result<(), BackendError>;

    /// Identity currently signed in, if any.
    fn current(&self) -> Option<Identity>;

    /// Observe auth-state transitions.
    ///
    /// The current state is delivered immediately on registration, then once per change.
    fn on_auth_state_changed(&self, callback: AuthStateCallback) -> SubscriptionHandle;
}

#[async_trait::async_trait]
impl<P> IdentityProvider for Arc<P>
where
    P: IdentityProvider + ?Sized,
{
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        (**self).create_account(email, password).await
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        (**self).sign_in(email, password).await
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        (**self).sign_out().await
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), BackendError> {
        (**self).send_password_reset(email).await
    }

    fn current(&self) -> Option<Identity> {
        (**self).current()
    }

    fn on_auth_state_changed(&self, callback: AuthStateCallback) -> SubscriptionHandle {
        (**self).on_auth_state_changed(callback)
    }
}
