//! Owned container for one shopper's cart and wishlist.
//!
//! A `ShopperSession` is created per client session and handed to UI code
//! explicitly; there is no global store. Both stores share one durable slot.

use std::sync::Arc;

use crate::cart::CartStore;
use crate::slot::SharedSlot;
use crate::types::ProductId;
use crate::wishlist::WishlistStore;

#[derive(Debug)]
pub struct ShopperSession {
    cart: CartStore,
    wishlist: WishlistStore,
}

impl ShopperSession {
    /// Create an empty session. Call [`ShopperSession::hydrate`] before
    /// trusting any derived counts.
    #[must_use]
    pub fn new(slot: SharedSlot) -> Self {
        Self {
            cart: CartStore::new(Arc::clone(&slot)),
            wishlist: WishlistStore::new(slot),
        }
    }

    /// Create a session and reload both stores from `slot`.
    #[must_use]
    pub fn load(slot: SharedSlot) -> Self {
        let mut session = Self::new(slot);
        session.hydrate();
        session
    }

    /// Reload both stores from the durable slot.
    pub fn hydrate(&mut self) {
        self.cart.hydrate();
        self.wishlist.hydrate();
    }

    /// `true` once both stores have been hydrated.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        self.cart.is_ready() && self.wishlist.is_ready()
    }

    #[must_use]
    pub const fn cart(&self) -> &CartStore {
        &self.cart
    }

    pub const fn cart_mut(&mut self) -> &mut CartStore {
        &mut self.cart
    }

    #[must_use]
    pub const fn wishlist(&self) -> &WishlistStore {
        &self.wishlist
    }

    pub const fn wishlist_mut(&mut self) -> &mut WishlistStore {
        &mut self.wishlist
    }

    /// Move a wishlist entry into the cart with quantity 1.
    ///
    /// Returns `false` if the product was not in the wishlist.
    pub fn move_to_cart(&mut self, product_id: &ProductId) -> bool {
        let cart = &mut self.cart;
        self.wishlist
            .move_to_cart(product_id, |line, quantity| cart.add_item(line, quantity))
    }
}
