//! Delivery areas and their shipping surcharges.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Delivery zone chosen at direct checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "postgres", derive(sqlx::Type))]
#[cfg_attr(
    feature = "postgres",
    sqlx(type_name = "delivery_area", rename_all = "lowercase")
)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryArea {
    /// Inside Dhaka City.
    Inside,
    /// Outside Dhaka City.
    Outside,
}

impl DeliveryArea {
    /// Wire value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Inside => "inside",
            Self::Outside => "outside",
        }
    }

    /// Human-readable label.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Inside => "Inside Dhaka City",
            Self::Outside => "Outside Dhaka City",
        }
    }
}

impl std::fmt::Display for DeliveryArea {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DeliveryArea {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "inside" => Ok(Self::Inside),
            "outside" => Ok(Self::Outside),
            other => Err(format!("invalid delivery area: {other}")),
        }
    }
}

/// Flat shipping surcharge per delivery area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShippingRates {
    /// Surcharge for [`DeliveryArea::Inside`].
    pub inside: Decimal,
    /// Surcharge for [`DeliveryArea::Outside`].
    pub outside: Decimal,
}

impl ShippingRates {
    /// Surcharge for the given area.
    #[must_use]
    pub const fn surcharge(&self, area: DeliveryArea) -> Decimal {
        match area {
            DeliveryArea::Inside => self.inside,
            DeliveryArea::Outside => self.outside,
        }
    }
}

impl Default for ShippingRates {
    /// 40.00 inside the city, 150.00 outside.
    fn default() -> Self {
        Self {
            inside: Decimal::new(4000, 2),
            outside: Decimal::new(15000, 2),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_default_rates() {
        let rates = ShippingRates::default();
        assert_eq!(rates.surcharge(DeliveryArea::Inside).to_string(), "40.00");
        assert_eq!(rates.surcharge(DeliveryArea::Outside).to_string(), "150.00");
    }

    #[test]
    fn test_parse_area() {
        assert_eq!(
            "inside".parse::<DeliveryArea>().unwrap(),
            DeliveryArea::Inside
        );
        assert_eq!(
            " outside ".parse::<DeliveryArea>().unwrap(),
            DeliveryArea::Outside
        );
        assert!("Inside".parse::<DeliveryArea>().is_err());
        assert!("".parse::<DeliveryArea>().is_err());
    }
}
