use std::collections::HashMap;
use std::sync::{Mutex, RwLock};

use uuid::Uuid;

use storefront_auth::{Identity, Role};
use storefront_core::UserId;
use storefront_events::{ListenerRegistry, SubscriptionHandle};

use super::r#trait::{AuthStateCallback, IdentityProvider};
use crate::error::BackendError;

/// Same minimum the managed provider enforces.
pub const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct Account {
    password: String,
    identity: Identity,
}

/// In-memory identity provider for tests/dev.
///
/// Accounts are keyed by lower-cased e-mail. Passwords are kept in clear text, which is
/// fine for a fake and nothing else.
pub struct InMemoryIdentityProvider {
    accounts: RwLock<HashMap<String, Account>>,
    current: Mutex<Option<Identity>>,
    listeners: ListenerRegistry<AuthStateCallback>,
    resets: Mutex<Vec<String>>,
}

impl Default for InMemoryIdentityProvider {
    fn default() -> Self {
        Self {
            accounts: RwLock::new(HashMap::new()),
            current: Mutex::new(None),
            listeners: ListenerRegistry::new(),
            resets: Mutex::new(Vec::new()),
        }
    }
}

impl core::fmt::Debug for InMemoryIdentityProvider {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryIdentityProvider")
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

fn email_key(email: &str) -> String {
    email.trim().to_lowercase()
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an account without signing it in (fixtures).
    pub fn register(
        &self,
        email: &str,
        password: &str,
        roles: Vec<Role>,
    ) -> Result<Identity, BackendError> {
        let key = email_key(email);
        if !key.contains('@') {
            return Err(BackendError::Rejected("invalid-email".to_string()));
        }
        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(BackendError::Rejected("weak-password".to_string()));
        }

        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        if accounts.contains_key(&key) {
            return Err(BackendError::Rejected("email-already-in-use".to_string()));
        }

        let identity = Identity {
            user_id: UserId::new(Uuid::now_v7().simple().to_string()),
            email: email.trim().to_string(),
            roles,
        };
        accounts.insert(
            key,
            Account {
                password: password.to_string(),
                identity: identity.clone(),
            },
        );
        Ok(identity)
    }

    /// Add a role claim to an existing account. Takes effect on the next sign-in.
    pub fn grant_role(&self, email: &str, role: Role) -> Result<(), BackendError> {
        let mut accounts = self
            .accounts
            .write()
            .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
        let account = accounts
            .get_mut(&email_key(email))
            .ok_or_else(|| BackendError::NotFound(email.to_string()))?;
        account.identity = account.identity.clone().with_role(role);
        Ok(())
    }

    /// E-mail addresses a password reset was sent to, in order.
    pub fn password_resets(&self) -> Vec<String> {
        self.resets.lock().map(|r| r.clone()).unwrap_or_default()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    /// Replace the signed-in identity and notify listeners if it changed.
    fn transition(&self, next: Option<Identity>) {
        let changed = match self.current.lock() {
            Ok(mut current) => {
                let changed = *current != next;
                *current = next.clone();
                changed
            }
            Err(_) => false,
        };
        if changed {
            tracing::debug!(
                user_id = ?next.as_ref().map(|i| &i.user_id),
                "auth state changed"
            );
            self.listeners.publish(next);
        }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn create_account(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let identity = self.register(email, password, Vec::new())?;
        self.transition(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let identity = {
            let accounts = self
                .accounts
                .read()
                .map_err(|_| BackendError::Unavailable("lock poisoned".to_string()))?;
            match accounts.get(&email_key(email)) {
                Some(account) if account.password == password => account.identity.clone(),
                _ => return Err(BackendError::Rejected("invalid-credential".to_string())),
            }
        };
        self.transition(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), BackendError> {
        self.transition(None);
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), BackendError> {
        // Unknown addresses succeed silently so the endpoint cannot enumerate accounts.
        let known = self
            .accounts
            .read()
            .map(|a| a.contains_key(&email_key(email)))
            .unwrap_or(false);
        if known {
            if let Ok(mut resets) = self.resets.lock() {
                resets.push(email.trim().to_string());
            }
        }
        Ok(())
    }

    fn current(&self) -> Option<Identity> {
        self.current.lock().ok().and_then(|c| c.clone())
    }

    fn on_auth_state_changed(&self, callback: AuthStateCallback) -> SubscriptionHandle {
        let handle = self.listeners.register(callback.clone());
        callback(self.current());
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn create_account_signs_in_and_notifies() {
        let idp = InMemoryIdentityProvider::new();
        let seen: Arc<Mutex<Vec<Option<String>>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _h = idp.on_auth_state_changed(Arc::new(move |id| {
            sink.lock().unwrap().push(id.map(|i| i.email));
        }));

        idp.create_account("tea@example.com", "hunter22").await.unwrap();
        idp.sign_out().await.unwrap();
        idp.sign_out().await.unwrap();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![None, Some("tea@example.com".to_string()), None]
        );
    }

    #[tokio::test]
    async fn rejects_weak_passwords_duplicates_and_bad_credentials() {
        let idp = InMemoryIdentityProvider::new();
        assert_eq!(
            idp.create_account("a@b.c", "123").await.unwrap_err(),
            BackendError::Rejected("weak-password".into())
        );
        idp.register("a@b.c", "secret1", vec![]).unwrap();
        assert_eq!(
            idp.create_account("A@B.C", "secret2").await.unwrap_err(),
            BackendError::Rejected("email-already-in-use".into())
        );
        assert_eq!(
            idp.sign_in("a@b.c", "nope").await.unwrap_err(),
            BackendError::Rejected("invalid-credential".into())
        );
        assert!(idp.current().is_none());
    }

    #[tokio::test]
    async fn granted_roles_show_up_on_next_sign_in() {
        let idp = InMemoryIdentityProvider::new();
        idp.register("boss@example.com", "secret1", vec![]).unwrap();
        idp.grant_role("boss@example.com", Role::admin()).unwrap();
        let id = idp.sign_in("boss@example.com", "secret1").await.unwrap();
        assert!(id.has_role(&Role::admin()));
    }

    #[tokio::test]
    async fn password_reset_is_recorded_only_for_known_accounts() {
        let idp = InMemoryIdentityProvider::new();
        idp.register("a@b.c", "secret1", vec![]).unwrap();
        idp.send_password_reset("a@b.c").await.unwrap();
        idp.send_password_reset("ghost@b.c").await.unwrap();
        assert_eq!(idp.password_resets(), vec!["a@b.c".to_string()]);
    }
}
