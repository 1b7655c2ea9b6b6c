//! Shopper commands.
//!
//! Each command mutates a hydrated [`honeywell_core::ShopperSession`] and
//! returns the text to show the shopper. Persistence happens inside the
//! stores on every mutation.

pub mod cart;
pub mod wishlist;

use honeywell_core::{CurrencyCode, Price};
use rust_decimal::Decimal;
use thiserror::Error;

use crate::catalog::CatalogError;

/// Errors that can occur while running a shopper command.
#[derive(Debug, Error)]
pub enum CommandError {
    #[error("No product with slug '{0}'")]
    UnknownProduct(String),

    #[error("Product '{product}' has no variant '{variant}'")]
    UnknownVariant { product: String, variant: String },

    #[error("Variant '{variant}' of '{product}' is out of stock")]
    VariantUnavailable { product: String, variant: String },

    #[error("'{0}' is not in the cart")]
    NotInCart(String),

    #[error("'{0}' is in the cart more than once, pass --variant or --base")]
    AmbiguousLine(String),

    #[error("'{0}' is not in the wishlist")]
    NotInWishlist(String),

    #[error(transparent)]
    Catalog(#[from] CatalogError),

    #[error("Failed to encode output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Format an amount in the store currency.
pub(crate) fn money(amount: Decimal) -> String {
    Price::new(amount, CurrencyCode::default()).display()
}
