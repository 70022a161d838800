//! Cart state and its reconciliation with device storage or the user's record.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use storefront_backend::{DeviceStorage, DocumentStore, StoreContext};
use storefront_catalog::SharedCatalog;
use storefront_core::{ProductId, StoreError, StoreResult, UserId};
use storefront_events::{Callback, ListenerRegistry, SubscriptionHandle};

use crate::item::{CartItem, CartScope};
use crate::user_record::{UserRecord, cart_fields};

/// Published after the visible cart changed (mutation or scope switch).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartChanged {
    pub scope: CartScope,
    pub item_count: usize,
}

#[derive(Debug)]
struct CartState {
    scope: CartScope,
    items: Vec<CartItem>,
    /// Bumped on every scope switch; mutations started under an older epoch are not applied.
    epoch: u64,
}

/// Cart for the active session scope.
///
/// Mutations persist first and update the in-memory list only after the write succeeded:
/// - Anonymous: the whole list is written synchronously to device storage
/// - Identified: the whole list is merge-written into the `cart` field of the user's record
///
/// Mutations are serialized so concurrent adds never lose an item. A scope switch may land
/// while a mutation is in flight; the mutation still persists to the scope it started in but
/// its result is not shown.
pub struct CartStore {
    documents: Arc<dyn DocumentStore>,
    device: Arc<dyn DeviceStorage>,
    users_collection: String,
    local_cart_key: String,
    catalog: SharedCatalog,
    state: Mutex<CartState>,
    mutation: tokio::sync::Mutex<()>,
    switch_requests: AtomicU64,
    listeners: ListenerRegistry<Callback<CartChanged>>,
}

impl core::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("CartStore")
            .field("scope", &self.scope())
            .field("item_count", &self.item_count())
            .finish_non_exhaustive()
    }
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

impl CartStore {
    /// Start in the anonymous scope with whatever cart device storage holds.
    pub fn new(ctx: &StoreContext, catalog: SharedCatalog) -> Self {
        let store = Self {
            documents: ctx.documents.clone(),
            device: ctx.device.clone(),
            users_collection: ctx.config.users_collection.clone(),
            local_cart_key: ctx.config.local_cart_key.clone(),
            catalog,
            state: Mutex::new(CartState {
                scope: CartScope::Anonymous,
                items: Vec::new(),
                epoch: 0,
            }),
            mutation: tokio::sync::Mutex::new(()),
            switch_requests: AtomicU64::new(0),
            listeners: ListenerRegistry::new(),
        };
        let local = store.load_local();
        store.lock_state().items = local;
        store
    }

    fn lock_state(&self) -> MutexGuard<'_, CartState> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn scope(&self) -> CartScope {
        self.lock_state().scope.clone()
    }

    pub fn items(&self) -> Vec<CartItem> {
        self.lock_state().items.clone()
    }

    pub fn item_count(&self) -> usize {
        self.lock_state().items.len()
    }

    /// Notify `listener` after every visible change.
    pub fn on_change(&self, listener: Callback<CartChanged>) -> SubscriptionHandle {
        self.listeners.register(listener)
    }

    /// Append the catalog product `product_id`, snapshotting its name and price, and return the
    /// new item. It is returned even when a scope switch happened while it was being persisted
    /// and the active list no longer shows it.
    pub async fn add(&self, product_id: &ProductId) -> StoreResult<CartItem> {
        let _serial = self.mutation.lock().await;

        let product = self
            .catalog
            .find(product_id)
            .ok_or_else(|| StoreError::ProductNotFound(product_id.clone()))?;

        let (scope, epoch, mut items) = self.begin();
        let item = CartItem::from_product(&product, now_millis());
        items.push(item.clone());
        self.persist(&scope, &items).await?;

        tracing::info!(%scope, product_id = %product_id, items = items.len(), "cart item added");
        self.finish(epoch, items);
        Ok(item)
    }

    /// Remove the item at `index`, keeping the order of the rest.
    pub async fn remove(&self, index: usize) -> StoreResult<()> {
        let _serial = self.mutation.lock().await;

        let (scope, epoch, mut items) = self.begin();
        if index >= items.len() {
            return Err(StoreError::index_out_of_range(index, items.len()));
        }
        let removed = items.remove(index);
        self.persist(&scope, &items).await?;

        tracing::info!(%scope, product_id = %removed.id, items = items.len(), "cart item removed");
        self.finish(epoch, items);
        Ok(())
    }

    /// Make `scope` the active one. Never merges carts across scopes.
    ///
    /// - Anonymous: reloads the local cart from device storage
    /// - Identified: loads the `cart` field of the user's record (empty when there is none)
    pub async fn switch_scope(&self, scope: CartScope) -> StoreResult<()> {
        match scope {
            CartScope::Anonymous => {
                self.enter_anonymous();
                Ok(())
            }
            CartScope::Identified(user_id) => {
                let ticket = self.switch_requests.fetch_add(1, Ordering::SeqCst) + 1;
                let items = self.fetch_remote_cart(&user_id).await?;
                if self.switch_requests.load(Ordering::SeqCst) != ticket {
                    tracing::warn!(user_id = %user_id, "scope switch superseded while loading remote cart");
                    return Ok(());
                }
                self.install(CartScope::Identified(user_id), items);
                Ok(())
            }
        }
    }

    /// Switch to the anonymous scope, reloading the local cart.
    pub fn enter_anonymous(&self) {
        self.switch_requests.fetch_add(1, Ordering::SeqCst);
        let items = self.load_local();
        self.install(CartScope::Anonymous, items);
    }

    /// Switch to `user_id` with a cart the caller already read from the user's record.
    pub fn enter_identified(&self, user_id: UserId, items: Vec<CartItem>) {
        self.switch_requests.fetch_add(1, Ordering::SeqCst);
        self.install(CartScope::Identified(user_id), items);
    }

    fn install(&self, scope: CartScope, items: Vec<CartItem>) {
        let changed = {
            let mut state = self.lock_state();
            state.epoch += 1;
            state.scope = scope.clone();
            state.items = items;
            CartChanged {
                scope,
                item_count: state.items.len(),
            }
        };
        tracing::info!(scope = %changed.scope, items = changed.item_count, "cart scope switched");
        self.listeners.publish(changed);
    }

    fn begin(&self) -> (CartScope, u64, Vec<CartItem>) {
        let state = self.lock_state();
        (state.scope.clone(), state.epoch, state.items.clone())
    }

    fn finish(&self, epoch: u64, items: Vec<CartItem>) {
        let changed = {
            let mut state = self.lock_state();
            if state.epoch != epoch {
                tracing::warn!(
                    scope = %state.scope,
                    "cart scope switched during mutation; result persisted but not shown"
                );
                return;
            }
            state.items = items;
            CartChanged {
                scope: state.scope.clone(),
                item_count: state.items.len(),
            }
        };
        self.listeners.publish(changed);
    }

    async fn persist(&self, scope: &CartScope, items: &[CartItem]) -> StoreResult<()> {
        let result = match scope {
            CartScope::Anonymous => serde_json::to_string(items)
                .map_err(Into::into)
                .and_then(|json| self.device.set(&self.local_cart_key, &json)),
            CartScope::Identified(user_id) => match cart_fields(items) {
                Ok(fields) => {
                    self.documents
                        .set(&self.users_collection, user_id.as_str(), fields, true)
                        .await
                }
                Err(err) => Err(err),
            },
        };
        result.map_err(|err| {
            tracing::error!(%scope, error = %err, "cart persist failed");
            StoreError::from(err)
        })
    }

    async fn fetch_remote_cart(&self, user_id: &UserId) -> StoreResult<Vec<CartItem>> {
        let record = self
            .documents
            .get(&self.users_collection, user_id.as_str())
            .await
            .map_err(|err| {
                tracing::error!(user_id = %user_id, error = %err, "failed to load user record");
                StoreError::from(err)
            })?;
        match record {
            Some(record) => Ok(UserRecord::decode(user_id.as_str(), record)?.cart),
            None => Ok(Vec::new()),
        }
    }

    /// Device-stored cart; missing or unreadable data yields an empty cart.
    fn load_local(&self) -> Vec<CartItem> {
        match self.device.get(&self.local_cart_key) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(items) => items,
                Err(err) => {
                    tracing::warn!(key = %self.local_cart_key, error = %err, "discarding corrupt local cart");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(err) => {
                tracing::warn!(key = %self.local_cart_key, error = %err, "local cart unreadable");
                Vec::new()
            }
        }
    }
}
