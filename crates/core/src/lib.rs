//! Honeywell Core - Shared types and the shopper session store.
//!
//! This crate provides the pieces shared across all Honeywell components:
//! - `storefront` - Public catalogue, search and cache invalidation API
//! - `cli` - Terminal shopper client for cart and wishlist
//!
//! # Architecture
//!
//! The core crate contains types, traits and in-memory state only - no
//! network access and no filesystem I/O. Durable storage for the cart and
//! wishlist is injected through the [`DurableSlot`] trait, so the same store
//! runs against a file in the CLI and against memory in tests.
//!
//! # Modules
//!
//! - [`types`] - Newtype IDs, prices, slugs, statuses and catalogue documents
//! - [`cart`] - Cart line store with drawer visibility
//! - [`wishlist`] - Saved-for-later store with drawer visibility
//! - [`session`] - Owned container wiring both stores to one durable slot
//! - [`slot`] - Durable key-value slot abstraction and snapshot format

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod session;
pub mod slot;
mod subscribers;
pub mod types;
pub mod wishlist;

pub use cart::{CartItemInput, CartLine, CartSnapshot, CartStore};
pub use session::ShopperSession;
pub use slot::{DurableSlot, MemorySlot, SharedSlot, SlotError};
pub use subscribers::SubscriptionId;
pub use types::*;
pub use wishlist::{WishlistEntry, WishlistItemInput, WishlistSnapshot, WishlistStore};
