//! Reacting to sign-in / sign-out.

use std::sync::Arc;

use tokio::sync::{Notify, mpsc, watch};
use tokio::task::JoinHandle;

use storefront_auth::Identity;
use storefront_backend::{DocumentStore, IdentityProvider, StoreContext};
use storefront_cart::{CartStore, UserRecord};
use storefront_core::{StoreError, StoreResult};
use storefront_events::SubscriptionHandle;

use crate::notice::Notifier;

/// The signed-in user together with their stored record.
///
/// `record.cart` is always empty: the cart moves into the session's cart store at sign-in and
/// is read from there (`Session::cart_items`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedInUser {
    pub identity: Identity,
    pub record: UserRecord,
}

/// Authentication state as the session last settled it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthView {
    /// Number of identity transitions processed so far.
    pub transitions: u64,
    pub user: Option<SignedInUser>,
}

struct Transition {
    documents: Arc<dyn DocumentStore>,
    identity: Arc<dyn IdentityProvider>,
    users_collection: String,
    cart: Arc<CartStore>,
    notifier: Notifier,
    state: Arc<watch::Sender<AuthView>>,
}

impl Transition {
    async fn apply(&self, next: Option<Identity>) {
        let user = match next {
            None => {
                tracing::info!("signed out; cart scope anonymous");
                self.cart.enter_anonymous();
                None
            }
            Some(identity) => match self.load_or_create(&identity).await {
                Ok(record) if record.disabled => {
                    tracing::warn!(user_id = %identity.user_id, "disabled account signed in; forcing sign-out");
                    self.notifier.report(&StoreError::AccountDisabled);
                    self.force_sign_out().await;
                    self.cart.enter_anonymous();
                    None
                }
                Ok(mut record) => {
                    let items = std::mem::take(&mut record.cart);
                    tracing::info!(user_id = %identity.user_id, items = items.len(), "signed in");
                    self.cart.enter_identified(identity.user_id.clone(), items);
                    Some(SignedInUser { identity, record })
                }
                Err(err) => {
                    tracing::warn!(user_id = %identity.user_id, error = %err, "user record unavailable; forcing sign-out");
                    self.notifier.report(&err);
                    self.force_sign_out().await;
                    self.cart.enter_anonymous();
                    None
                }
            },
        };

        self.state.send_modify(|view| {
            view.transitions += 1;
            view.user = user;
        });
    }

    async fn force_sign_out(&self) {
        if let Err(err) = self.identity.sign_out().await {
            tracing::error!(error = %err, "forced sign-out failed");
        }
    }

    /// Fetch the user's record, creating a minimal one (merge-write) when there is none.
    async fn load_or_create(&self, identity: &Identity) -> StoreResult<UserRecord> {
        let uid = identity.user_id.as_str();
        let stored = self
            .documents
            .get(&self.users_collection, uid)
            .await
            .map_err(|err| {
                tracing::error!(user_id = %uid, error = %err, "failed to load user record");
                StoreError::from(err)
            })?;

        if let Some(record) = stored {
            return Ok(UserRecord::decode(uid, record)?);
        }

        let record = UserRecord::minimal(identity.user_id.clone(), identity.email.clone());
        self.documents
            .set(&self.users_collection, uid, record.minimal_fields(), true)
            .await
            .map_err(|err| {
                tracing::error!(user_id = %uid, error = %err, "failed to create user record");
                StoreError::from(err)
            })?;
        tracing::info!(user_id = %uid, "created minimal user record");
        Ok(record)
    }
}

/// Background task applying identity transitions in the order the provider reports them.
pub struct IdentityWatcher {
    shutdown: Arc<Notify>,
    task: JoinHandle<()>,
    _auth: SubscriptionHandle,
}

impl core::fmt::Debug for IdentityWatcher {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("IdentityWatcher")
            .field("running", &!self.task.is_finished())
            .finish_non_exhaustive()
    }
}

impl IdentityWatcher {
    /// Start watching. Must be called from within a tokio runtime.
    pub fn start(
        ctx: &StoreContext,
        cart: Arc<CartStore>,
        notifier: Notifier,
        state: Arc<watch::Sender<AuthView>>,
    ) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<Option<Identity>>();
        let auth = ctx.identity.on_auth_state_changed(Arc::new(move |next| {
            if tx.send(next).is_err() {
                tracing::debug!("identity transition dropped; watcher stopped");
            }
        }));

        let transition = Transition {
            documents: ctx.documents.clone(),
            identity: ctx.identity.clone(),
            users_collection: ctx.config.users_collection.clone(),
            cart,
            notifier,
            state,
        };
        let shutdown = Arc::new(Notify::new());
        let stop = shutdown.clone();

        let task = tokio::spawn(async move {
            tracing::debug!("identity watcher started");
            loop {
                tokio::select! {
                    _ = stop.notified() => break,
                    next = rx.recv() => match next {
                        Some(next) => transition.apply(next).await,
                        None => break,
                    },
                }
            }
            tracing::debug!("identity watcher stopped");
        });

        Self {
            shutdown,
            task,
            _auth: auth,
        }
    }

    pub async fn stop(self) {
        self.shutdown.notify_one();
        if let Err(err) = self.task.await {
            tracing::error!(error = %err, "identity watcher task failed");
        }
    }
}
