//! Product lookup over the storefront catalogue file.

use std::path::{Path, PathBuf};

use honeywell_core::{CartItemInput, Product, ProductVariant, WishlistItemInput};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Failed to read catalogue {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid catalogue JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, Deserialize)]
struct ProductsDocument {
    #[serde(default)]
    products: Vec<Product>,
}

/// Products keyed by slug.
#[derive(Debug, Default)]
pub struct ProductLookup {
    products: Vec<Product>,
}

impl ProductLookup {
    /// Read the `products` collection of a catalogue file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }

    /// # Errors
    ///
    /// Returns an error if the JSON is not a catalogue document.
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        let document: ProductsDocument = serde_json::from_str(json)?;
        Ok(Self {
            products: document.products,
        })
    }

    #[must_use]
    pub fn by_slug(&self, slug: &str) -> Option<&Product> {
        self.products.iter().find(|p| p.slug.as_str() == slug)
    }
}

/// Find a variant by ID or by colour name, ignoring case.
#[must_use]
pub fn find_variant<'a>(product: &'a Product, wanted: &str) -> Option<&'a ProductVariant> {
    product
        .variants
        .iter()
        .find(|v| v.id.as_str() == wanted || v.color.eq_ignore_ascii_case(wanted))
}

/// Cart payload for `product`, priced for `variant` when given.
#[must_use]
pub fn cart_input(product: &Product, variant: Option<&ProductVariant>) -> CartItemInput {
    CartItemInput {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        product_slug: product.slug.to_string(),
        product_image: product.image_url().map(str::to_owned),
        variant_id: variant.map(|v| v.id.clone()),
        variant_color: variant.map(|v| v.color.clone()),
        variant_sku: variant.map(|v| {
            v.variant_part_code
                .clone()
                .unwrap_or_else(|| v.ean_code.clone())
        }),
        price: product.price_for(variant.map(|v| &v.id)),
    }
}

/// Wishlist payload for `product` at its base price.
#[must_use]
pub fn wishlist_input(product: &Product) -> WishlistItemInput {
    WishlistItemInput {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        product_slug: product.slug.to_string(),
        product_image: product.image_url().map(str::to_owned),
        price: product.base_price,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
pub(crate) mod tests {
    use rust_decimal::Decimal;

    use super::*;

    pub(crate) const CATALOG: &str = r#"{
        "categories": [{"id": "cat-audio", "name": "Audio", "slug": "audio"}],
        "products": [
            {
                "id": "p-buds", "name": "Moxie Wireless Earbuds", "slug": "moxie-wireless-earbuds",
                "category": "cat-audio", "basePrice": "2499",
                "featuredImage": {"id": "m1", "url": "https://cdn.example/buds.jpg"},
                "variants": [
                    {"id": "v-black", "color": "Black", "eanCode": "8901", "stock": 5},
                    {"id": "v-white", "color": "White", "eanCode": "8902", "variantPartCode": "MX-W", "price": "2699", "stock": 0, "available": false}
                ],
                "createdAt": "2026-03-01T00:00:00Z"
            },
            {
                "id": "p-bank", "name": "Volt Power Bank", "slug": "volt-power-bank",
                "category": "cat-power", "basePrice": "1299",
                "createdAt": "2026-01-01T00:00:00Z"
            }
        ]
    }"#;

    pub(crate) fn lookup() -> ProductLookup {
        ProductLookup::from_json(CATALOG).unwrap()
    }

    #[test]
    fn test_by_slug() {
        let lookup = lookup();
        assert_eq!(
            lookup.by_slug("volt-power-bank").unwrap().name,
            "Volt Power Bank"
        );
        assert!(lookup.by_slug("nope").is_none());
    }

    #[test]
    fn test_find_variant_by_id_or_colour() {
        let lookup = lookup();
        let buds = lookup.by_slug("moxie-wireless-earbuds").unwrap();
        assert_eq!(find_variant(buds, "v-black").unwrap().color, "Black");
        assert_eq!(find_variant(buds, "white").unwrap().id.as_str(), "v-white");
        assert!(find_variant(buds, "red").is_none());
    }

    #[test]
    fn test_cart_input_uses_variant_price_and_part_code() {
        let lookup = lookup();
        let buds = lookup.by_slug("moxie-wireless-earbuds").unwrap();

        let base = cart_input(buds, None);
        assert_eq!(base.price, Decimal::new(2499, 0));
        assert_eq!(base.variant_id, None);
        assert_eq!(
            base.product_image.as_deref(),
            Some("https://cdn.example/buds.jpg")
        );

        let white = cart_input(buds, find_variant(buds, "v-white"));
        assert_eq!(white.price, Decimal::new(2699, 0));
        assert_eq!(white.variant_sku.as_deref(), Some("MX-W"));

        let black = cart_input(buds, find_variant(buds, "v-black"));
        assert_eq!(black.price, Decimal::new(2499, 0));
        assert_eq!(black.variant_sku.as_deref(), Some("8901"));
    }

    #[test]
    fn test_missing_file() {
        let err = ProductLookup::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, CatalogError::Io { .. }));
    }
}
