//! Status enums for catalogue entities.

use serde::{Deserialize, Serialize};

/// Product lifecycle status.
///
/// Discontinued products stay in the catalogue but are hidden from listings
/// unless explicitly requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ProductStatus {
    New,
    #[default]
    Active,
    Discontinued,
    ComingSoon,
}

impl ProductStatus {
    /// Wire value used in query strings and documents.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Active => "active",
            Self::Discontinued => "discontinued",
            Self::ComingSoon => "coming-soon",
        }
    }

    /// Parse from a wire value.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new" => Some(Self::New),
            "active" => Some(Self::Active),
            "discontinued" => Some(Self::Discontinued),
            "coming-soon" => Some(Self::ComingSoon),
            _ => None,
        }
    }
}

/// Series pricing/quality tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SeriesTier {
    Premium,
    #[default]
    Standard,
    Value,
}
