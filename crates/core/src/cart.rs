//! Shopper cart store.
//!
//! Lines are keyed by `(product_id, variant_id)`; a missing variant denotes
//! the base product. Every line mutation is mirrored to the durable slot
//! under [`CART_STORAGE_KEY`]. Drawer visibility is session-only.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::slot::{self, SharedSlot};
use crate::subscribers::{SubscriptionId, Subscribers};
use crate::types::{ProductId, VariantId};

/// Durable slot key for cart lines.
pub const CART_STORAGE_KEY: &str = "honeywell-cart";

/// One purchasable line in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub product_image: Option<String>,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub variant_color: Option<String>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    /// Unit price.
    pub price: Decimal,
    pub quantity: u32,
}

impl CartLine {
    fn matches(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        &self.product_id == product_id && self.variant_id.as_ref() == variant_id
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Payload of an add-to-cart action: a [`CartLine`] without quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemInput {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_slug: String,
    pub product_image: Option<String>,
    #[serde(default)]
    pub variant_id: Option<VariantId>,
    #[serde(default)]
    pub variant_color: Option<String>,
    #[serde(default)]
    pub variant_sku: Option<String>,
    pub price: Decimal,
}

impl CartItemInput {
    fn into_line(self, quantity: u32) -> CartLine {
        CartLine {
            product_id: self.product_id,
            product_name: self.product_name,
            product_slug: self.product_slug,
            product_image: self.product_image,
            variant_id: self.variant_id,
            variant_color: self.variant_color,
            variant_sku: self.variant_sku,
            price: self.price,
            quantity,
        }
    }
}

/// Read-only view of the cart with derived values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSnapshot {
    pub items: Vec<CartLine>,
    pub is_open: bool,
    pub is_ready: bool,
    pub item_count: u64,
    pub total: Decimal,
}

/// The shopper's active cart.
///
/// Starts empty and not ready; call [`CartStore::hydrate`] to reload the
/// persisted lines. Derived counts are only meaningful once
/// [`CartStore::is_ready`] returns `true`.
#[derive(Debug)]
pub struct CartStore {
    items: Vec<CartLine>,
    is_open: bool,
    ready: bool,
    slot: SharedSlot,
    subscribers: Subscribers<CartSnapshot>,
}

impl CartStore {
    /// Create an empty, not-yet-hydrated cart backed by `slot`.
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

    /// Create a cart and immediately hydrate it from `slot`.
    #[must_use]
    pub fn load(slot: SharedSlot) -> Self {
        let mut store = Self::new(slot);
        store.hydrate();
        store
    }

    /// Replace in-memory lines with the persisted snapshot and mark ready.
    ///
    /// A missing or unreadable snapshot leaves the cart empty. Duplicate keys
    /// in the snapshot are merged and zero-quantity lines dropped.
    pub fn hydrate(&mut self) {
        match slot::load_items::<CartLine>(self.slot.as_ref(), CART_STORAGE_KEY) {
            Ok(lines) => {
                self.items.clear();
                for line in lines.into_iter().filter(|l| l.quantity > 0) {
                    match self
                        .items
                        .iter_mut()
                        .find(|i| i.matches(&line.product_id, line.variant_id.as_ref()))
                    {
                        Some(existing) => {
                            existing.quantity = existing.quantity.saturating_add(line.quantity);
                        }
                        None => self.items.push(line),
                    }
                }
                tracing::debug!(lines = self.items.len(), "Cart hydrated");
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to load persisted cart, starting empty");
                self.items.clear();
            }
        }
        self.ready = true;
        self.notify();
    }

    // =========================================================================
    // Actions
    // =========================================================================

    /// Add `quantity` units of `item`, merging with an existing line.
    ///
    /// A zero quantity is treated as one. Always opens the cart drawer.
    pub fn add_item(&mut self, item: CartItemInput, quantity: u32) {
        let quantity = if quantity == 0 {
            tracing::warn!(product_id = %item.product_id, "Zero quantity added to cart, using 1");
            1
        } else {
            quantity
        };

        match self
            .items
            .iter_mut()
            .find(|l| l.matches(&item.product_id, item.variant_id.as_ref()))
        {
            Some(line) => line.quantity = line.quantity.saturating_add(quantity),
            None => self.items.push(item.into_line(quantity)),
        }

        self.is_open = true;
        self.commit();
    }

    /// Remove the matching line. No-op if absent.
    pub fn remove_item(&mut self, product_id: &ProductId, variant_id: Option<&VariantId>) {
        let before = self.items.len();
        self.items.retain(|l| !l.matches(product_id, variant_id));
        if self.items.len() != before {
            self.commit();
        }
    }

    /// Set the matching line's quantity. Non-positive values remove the line.
    pub fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: i64,
        variant_id: Option<&VariantId>,
    ) {
        if quantity <= 0 {
            self.remove_item(product_id, variant_id);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(line) = self
            .items
            .iter_mut()
            .find(|l| l.matches(product_id, variant_id))
        {
            line.quantity = quantity;
            self.commit();
        }
    }

    /// Remove every line.
    pub fn clear_cart(&mut self) {
        self.items.clear();
        self.commit();
    }

    pub fn open_cart(&mut self) {
        self.is_open = true;
        self.notify();
    }

    pub fn close_cart(&mut self) {
        self.is_open = false;
        self.notify();
    }

    pub fn toggle_cart(&mut self) {
        self.is_open = !self.is_open;
        self.notify();
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Total units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u64 {
        self.items.iter().map(|l| u64::from(l.quantity)).sum()
    }

    /// Sum of unit price times quantity across all lines.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(CartLine::line_total).sum()
    }

    #[must_use]
    pub fn get_item(
        &self,
        product_id: &ProductId,
        variant_id: Option<&VariantId>,
    ) -> Option<&CartLine> {
        self.items.iter().find(|l| l.matches(product_id, variant_id))
    }

    #[must_use]
    pub fn is_in_cart(&self, product_id: &ProductId, variant_id: Option<&VariantId>) -> bool {
        self.get_item(product_id, variant_id).is_some()
    }

    #[must_use]
    pub fn items(&self) -> &[CartLine] {
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

    /// Current lines plus derived values.
    #[must_use]
    pub fn snapshot(&self) -> CartSnapshot {
        CartSnapshot {
            items: self.items.clone(),
            is_open: self.is_open,
            is_ready: self.ready,
            item_count: self.item_count(),
            total: self.total(),
        }
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Register a listener called with a fresh snapshot after every change.
    pub fn subscribe(
        &mut self,
        listener: impl Fn(&CartSnapshot) + Send + 'static,
    ) -> SubscriptionId {
        self.subscribers.add(listener)
    }

    /// Returns `true` if the listener was registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    fn commit(&self) {
        slot::persist_items(self.slot.as_ref(), CART_STORAGE_KEY, &self.items);
        self.notify();
    }

    fn notify(&self) {
        if !self.subscribers.is_empty() {
            self.subscribers.notify(&self.snapshot());
        }
    }
}
