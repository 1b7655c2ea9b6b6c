//! Catalogue documents as served by the content source.
//!
//! Field names serialize in camelCase to match the documents the content
//! management system publishes.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, MediaId, ProductId, SeriesId, VariantId};
use super::slug::Slug;
use super::status::{ProductStatus, SeriesTier};

/// Reference to an uploaded media asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    pub id: MediaId,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
}

/// A technical specification row (e.g., "Battery Life" / "15 hours").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Specification {
    pub label: String,
    pub value: String,
}

/// A color/style option of a product with optional price override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: VariantId,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color_hex: Option<String>,
    pub ean_code: String,
    /// SKU, e.g. `HC000004/AUD/HP/P10/SLV`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant_part_code: Option<String>,
    /// Price override; `None` means the product's base price applies.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub stock: u32,
    #[serde(default = "default_true")]
    pub available: bool,
}

impl ProductVariant {
    /// The variant's own price, falling back to the product base price.
    #[must_use]
    pub fn effective_price(&self, base_price: Decimal) -> Decimal {
        self.price.unwrap_or(base_price)
    }
}

/// A catalogue product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<String>,
    pub category: CategoryId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub series: Option<SeriesId>,
    pub base_price: Decimal,
    #[serde(default)]
    pub variants: Vec<ProductVariant>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<MediaRef>,
    #[serde(default)]
    pub gallery: Vec<MediaRef>,
    #[serde(default)]
    pub features: Vec<String>,
    #[serde(default)]
    pub specifications: Vec<Specification>,
    #[serde(default)]
    pub featured: bool,
    #[serde(default)]
    pub sort_order: i32,
    pub created_at: DateTime<Utc>,
}

impl Product {
    /// Look up a variant by ID.
    #[must_use]
    pub fn variant(&self, id: &VariantId) -> Option<&ProductVariant> {
        self.variants.iter().find(|v| &v.id == id)
    }

    /// Price of the given variant, or the base price when no variant applies.
    #[must_use]
    pub fn price_for(&self, variant: Option<&VariantId>) -> Decimal {
        variant
            .and_then(|id| self.variant(id))
            .map_or(self.base_price, |v| v.effective_price(self.base_price))
    }

    /// URL of the featured image, if any.
    #[must_use]
    pub fn image_url(&self) -> Option<&str> {
        self.featured_image.as_ref().map(|m| m.url.as_str())
    }
}

/// A product category. Categories may nest one level via `parent`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: Slug,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<CategoryId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<MediaRef>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default)]
    pub featured: bool,
}

/// A product series (e.g. "Moxie", "Suono").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSeries {
    pub id: SeriesId,
    pub name: String,
    pub slug: Slug,
    #[serde(default)]
    pub tier: SeriesTier,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logo: Option<MediaRef>,
    #[serde(default)]
    pub sort_order: i32,
}

const fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn variant(id: &str, price: Option<Decimal>) -> ProductVariant {
        ProductVariant {
            id: VariantId::new(id),
            color: "Silver".to_string(),
            color_hex: None,
            ean_code: "8901234567890".to_string(),
            variant_part_code: None,
            price,
            stock: 3,
            available: true,
        }
    }

    #[test]
    fn test_effective_price_falls_back_to_base() {
        let base = Decimal::new(1999, 0);
        assert_eq!(variant("v1", None).effective_price(base), base);
        assert_eq!(
            variant("v1", Some(Decimal::new(2499, 0))).effective_price(base),
            Decimal::new(2499, 0)
        );
    }

    #[test]
    fn test_product_deserializes_with_defaults() {
        let json = r#"{
            "id": "p1",
            "name": "Suono P10",
            "slug": "suono-p10",
            "category": "c1",
            "basePrice": "1999",
            "createdAt": "2025-01-01T00:00:00Z",
            "variants": [
                {"id": "v1", "color": "Gold", "eanCode": "123", "price": "2199"}
            ]
        }"#;
        let product: Product = serde_json::from_str(json).expect("deserialize");
        assert_eq!(product.status, ProductStatus::Active);
        assert!(product.variants[0].available);
        assert_eq!(
            product.price_for(Some(&VariantId::new("v1"))),
            Decimal::new(2199, 0)
        );
        assert_eq!(
            product.price_for(Some(&VariantId::new("missing"))),
            Decimal::new(1999, 0)
        );
        assert_eq!(product.price_for(None), Decimal::new(1999, 0));
    }
}
