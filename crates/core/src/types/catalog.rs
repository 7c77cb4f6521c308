//! Catalog and storefront content enums.

use serde::{Deserialize, Serialize};

/// Promotional badge shown on a product card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "product_badge", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum Badge {
    Sale,
    New,
    Hot,
}

/// Showcase brand grouping on the home page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "brand_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum BrandType {
    Accessories,
    Gadgets,
}

impl std::str::FromStr for BrandType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "accessories" => Ok(Self::Accessories),
            "gadgets" => Ok(Self::Gadgets),
            _ => Err(format!("invalid brand type: {s}")),
        }
    }
}

/// Display style of a site notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "notification_type", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum NotificationType {
    #[default]
    Banner,
    Alert,
    Promo,
}
