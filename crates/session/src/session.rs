//! One storefront session (browser tab): catalog, cart, identity and account flows.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};

use storefront_backend::StoreContext;
use storefront_cart::{CartItem, CartScope, CartStore};
use storefront_catalog::{
    CatalogAdmin, CatalogSnapshot, CatalogSubscription, CatalogSync, NewProduct, SearchDebouncer,
    SharedCatalog,
};
use storefront_core::{ProductId, StoreError, StoreResult};

use crate::account::{AccountFlows, ProfileImage};
use crate::notice::{Notice, Notifier};
use crate::prompt::{InputRequest, Prompter};
use crate::view::{CatalogView, ViewPipeline};
use crate::watcher::{AuthView, IdentityWatcher, SignedInUser};

/// Receiving ends the UI layer drives.
#[derive(Debug)]
pub struct SessionChannels {
    pub requests: mpsc::UnboundedReceiver<InputRequest>,
    pub notices: mpsc::UnboundedReceiver<Notice>,
    pub views: mpsc::UnboundedReceiver<CatalogView>,
}

/// Every failure is turned into an error notice here and goes no further.
pub struct Session {
    ctx: StoreContext,
    sync: CatalogSync,
    subscription: CatalogSubscription,
    cart: Arc<CartStore>,
    search: SearchDebouncer,
    admin: CatalogAdmin,
    accounts: AccountFlows,
    notifier: Notifier,
    auth: watch::Receiver<AuthView>,
    watcher: IdentityWatcher,
}

impl core::fmt::Debug for Session {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Session")
            .field("ctx", &self.ctx)
            .field("cart", &self.cart)
            .field("watcher", &self.watcher)
            .finish_non_exhaustive()
    }
}

impl Session {
    /// Wire a session and open the catalog feed. Must be called from within a tokio runtime.
    pub fn start(ctx: StoreContext) -> (Self, SessionChannels) {
        let (prompter, requests) = Prompter::channel();
        let (notifier, notices) = Notifier::channel();
        let (views_tx, views) = mpsc::unbounded_channel();
        let pipeline = Arc::new(ViewPipeline::new(views_tx));

        let catalog = SharedCatalog::new();
        let sync = CatalogSync::new(&ctx, catalog.clone());
        let feed = pipeline.clone();
        let subscription = sync.subscribe(Arc::new(move |update| feed.catalog_delivered(update)));

        let settled = pipeline;
        let search = SearchDebouncer::new(
            catalog.clone(),
            ctx.config.search_debounce(),
            Arc::new(move |results| settled.search_settled(results)),
        );

        let cart = Arc::new(CartStore::new(&ctx, catalog));
        let (state, auth) = watch::channel(AuthView::default());
        let state = Arc::new(state);
        let watcher = IdentityWatcher::start(&ctx, cart.clone(), notifier.clone(), state.clone());
        let accounts = AccountFlows::new(ctx.clone(), prompter, notifier.clone(), state);
        let admin = CatalogAdmin::new(&ctx);

        tracing::info!(collection = %ctx.config.products_collection, "session started");
        let session = Self {
            ctx,
            sync,
            subscription,
            cart,
            search,
            admin,
            accounts,
            notifier,
            auth,
            watcher,
        };
        (
            session,
            SessionChannels {
                requests,
                notices,
                views,
            },
        )
    }

    pub fn catalog(&self) -> CatalogSnapshot {
        self.sync.catalog().current()
    }

    pub fn cart_items(&self) -> Vec<CartItem> {
        self.cart.items()
    }

    pub fn cart_count(&self) -> usize {
        self.cart.item_count()
    }

    pub fn cart_scope(&self) -> CartScope {
        self.cart.scope()
    }

    pub fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub fn current_user(&self) -> Option<SignedInUser> {
        self.auth.borrow().user.clone()
    }

    /// Watch authentication state as transitions are applied.
    pub fn auth_state(&self) -> watch::Receiver<AuthView> {
        self.auth.clone()
    }

    /// Feed a keystroke to the debounced search.
    pub fn search(&self, query: &str) {
        self.search.submit(query);
    }

    /// Drives the disabled state of the search button.
    pub fn is_search_pending(&self) -> bool {
        self.search.is_pending()
    }

    fn report<T>(&self, result: StoreResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.notifier.report(&err);
                None
            }
        }
    }

    pub async fn add_to_cart(&self, product_id: &ProductId) {
        if let Some(item) = self.report(self.cart.add(product_id).await) {
            self.notifier.info(format!("{} added to cart.", item.name));
        }
    }

    pub async fn remove_from_cart(&self, index: usize) {
        self.report(self.cart.remove(index).await);
    }

    pub async fn create_account(&self) {
        self.report(self.accounts.create_account().await);
    }

    pub async fn sign_in(&self) {
        self.report(self.accounts.sign_in().await);
    }

    pub async fn sign_out(&self) {
        self.report(self.accounts.sign_out().await);
    }

    pub async fn recover_password(&self) {
        self.report(self.accounts.recover_password().await);
    }

    pub async fn change_profile_image(&self, image: ProfileImage) {
        self.report(self.accounts.change_profile_image(image).await);
    }

    /// Publish a product as the signed-in operator.
    pub async fn add_product(&self, product: NewProduct) -> Option<ProductId> {
        let result = match self.current_user() {
            Some(user) => self.admin.add_product(&user.identity, product).await,
            None => Err(StoreError::NotSignedIn),
        };
        let id = self.report(result)?;
        self.notifier.info("Product added.");
        Some(id)
    }

    /// Stop the catalog feed, pending search and identity watcher.
    pub async fn shutdown(self) {
        self.subscription.unsubscribe();
        self.search.cancel();
        self.watcher.stop().await;
        tracing::info!("session stopped");
    }
}
