//! Core types for Honeywell.
//!
//! This module provides type-safe wrappers for common domain concepts and
//! the catalogue documents served by the content source.

pub mod catalog;
pub mod id;
pub mod price;
pub mod slug;
pub mod status;

pub use catalog::{Category, MediaRef, Product, ProductSeries, ProductVariant, Specification};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use slug::{Slug, SlugError};
pub use status::*;
