//! Shopper wishlist store.
//!
//! Entries are keyed by product only; variants are chosen when the entry is
//! moved to the cart. Entries persist under [`WISHLIST_STORAGE_KEY`].

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::cart::CartItemInput;
use crate::slot::{self, SharedSlot};
use crate::subscribers::{SubscriptionId, Subscribers};
use crate::types::ProductId;

/// Durable slot key for wishlist entries.
pub const WISHLIST_STORAGE_KEY: &str = "honeywell-wishlist";

/// One saved-for-later product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistEntry {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub product_image: Option<String>,
    pub price: Decimal,
    /// Set on insertion; stored as epoch milliseconds.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub added_at: DateTime<Utc>,
}

/// Payload of an add-to-wishlist action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistItemInput {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub product_image: Option<String>,
    pub price: Decimal,
}

/// Read-only view of the wishlist with derived values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WishlistSnapshot {
    pub items: Vec<WishlistEntry>,
    pub is_open: bool,
    pub is_ready: bool,
    pub item_count: usize,
}

/// The shopper's wishlist.
#[derive(Debug)]
pub struct WishlistStore {
    items: Vec<WishlistEntry>,
    is_open: bool,
    ready: bool,
    slot: SharedSlot,
    subscribers: Subscribers<WishlistSnapshot>,
}

impl WishlistStore {
    /// Create an empty, not-yet-hydrated wishlist backed by `slot`.
    #[must_use]
    pub const fn new(slot: SharedSlot) -> Self {
        Self {
            items: Vec::new(),
            is_open: false,
            ready: false,
            slot,
            subscribers: Subscribers::new(),
        }
    }

    /// Create a wishlist and immediately hydrate it from `slot`.
    #[must_use]
    pub fn load(slot: SharedSlot) -> Self {
        let mut store = Self::new(slot);
        store.hydrate();
        store
    }

    /// Replace in-memory entries with the persisted snapshot and mark ready.
    ///
    /// Later duplicates of a product in the snapshot are dropped.
    pub fn hydrate(&mut self) {
        match slot::load_items::<WishlistEntry>(self.slot.as_ref(), WISHLIST_STORAGE_KEY) {
            Ok(entries) => {
                self.items.clear();
                for entry in entries {
                    if !self.contains(&entry.product_id) {
                        self.items.push(entry);
                    }
                }
                tracing::debug!(entries = self.items.len(), "Wishlist hydrated");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load persisted wishlist, starting empty");
                self.items.clear();
            }
        }
        self.ready = true;
        self.notify();
    }

    /// Save a product. No-op if it is already saved; the drawer stays as is.
    pub fn add_item(&mut self, item: WishlistItemInput) {
        if self.contains(&item.product_id) {
            return;
        }

        self.items.push(WishlistEntry {
            product_id: item.product_id,
            product_name: item.product_name,
            product_slug: item.product_slug,
            product_image: item.product_image,
            price: item.price,
            added_at: now_millis(),
        });
        self.commit();
    }

    /// Remove the matching entry. No-op if absent.
    pub fn remove_item(&mut self, product_id: &ProductId) {
        let before = self.items.len();
        self.items.retain(|e| &e.product_id != product_id);
        if self.items.len() != before {
            self.commit();
        }
    }

    pub fn clear_wishlist(&mut self) {
        self.items.clear();
        self.commit();
    }

    /// Move a saved product into the cart.
    ///
    /// `add_to_cart` receives the base-product line and a quantity of 1; the
    /// entry is removed afterwards. Returns `false` without calling
    /// `add_to_cart` if the product is not saved.
    pub fn move_to_cart(
        &mut self,
        product_id: &ProductId,
        add_to_cart: impl FnOnce(CartItemInput, u32),
    ) -> bool {
        let Some(entry) = self.items.iter().find(|e| &e.product_id == product_id) else {
            return false;
        };

        add_to_cart(
            CartItemInput {
                product_id: entry.product_id.clone(),
                product_name: entry.product_name.clone(),
                product_slug: entry.product_slug.clone(),
                product_image: entry.product_image.clone(),
                variant_id: None,
                variant_color: None,
                variant_sku: None,
                price: entry.price,
            },
            1,
        );
        self.remove_item(product_id);
        true
    }

    pub fn open_wishlist(&mut self) {
        self.is_open = true;
        self.notify();
    }

    pub fn close_wishlist(&mut self) {
        self.is_open = false;
        self.notify();
    }

    pub fn toggle_wishlist(&mut self) {
        self.is_open = !self.is_open;
        self.notify();
    }

    #[must_use]
    pub fn is_in_wishlist(&self, product_id: &ProductId) -> bool {
        self.contains(product_id)
    }

    /// Number of saved products.
    #[must_use]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn items(&self) -> &[WishlistEntry] {
        &self.items
    }

    #[must_use]
    pub const fn is_open(&self) -> bool {
        self.is_open
    }

    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.ready
    }

    #[must_use]
    pub fn snapshot(&self) -> WishlistSnapshot {
        WishlistSnapshot {
            items: self.items.clone(),
            is_open: self.is_open,
            is_ready: self.ready,
            item_count: self.item_count(),
        }
    }

    /// Register a listener called with a fresh snapshot after every change.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&WishlistSnapshot) + Send + 'static,
    ) -> SubscriptionId {
        self.subscribers.add(listener)
    }

    /// Returns `true` if the listener was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn contains(&self, product_id: &ProductId) -> bool {
        self.items.iter().any(|e| &e.product_id == product_id)
    }

    fn commit(&self) {
        slot::persist_items(self.slot.as_ref(), WISHLIST_STORAGE_KEY, &self.items);
        self.notify();
    }

    fn notify(&self) {
        if !self.subscribers.is_empty() {
            self.subscribers.notify(&self.snapshot());
        }
    }
}

/// Current time truncated to the millisecond precision the snapshot keeps.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}
