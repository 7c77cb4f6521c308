//! Checkout input validation.
//!
//! Runs before any transaction is opened. Request bodies are deserialized
//! leniently (every field optional) so missing or blank values surface as
//! field errors rather than extractor rejections.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use gadzilla_core::{DeliveryArea, Email, Phone, ProductId};

use super::LineRequest;

/// Field name → messages.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<String, Vec<String>>);

impl ValidationErrors {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A single error on one field.
    #[must_use]
    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_owned())
            .or_default()
            .push(message.into());
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Messages recorded for `field`.
    #[must_use]
    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    /// `Ok(value)` when no errors were recorded.
    ///
    /// # Errors
    ///
    /// Returns `self` when at least one error was recorded.
    pub fn into_result<T>(self, value: T) -> Result<T, Self> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fields: Vec<&str> = self.0.keys().map(String::as_str).collect();
        write!(f, "invalid fields: {}", fields.join(", "))
    }
}

impl std::error::Error for ValidationErrors {}

const REQUIRED: &str = "Required.";

/// Trimmed non-blank value, or a `Required.` error on `field`.
fn required(errors: &mut ValidationErrors, field: &str, value: Option<&str>) -> String {
    let value = value.map(str::trim).unwrap_or_default();
    if value.is_empty() {
        errors.add(field, REQUIRED);
    }
    value.to_owned()
}

fn optional(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

// =============================================================================
// Cart checkout
// =============================================================================

/// `POST /api/orders` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CartCheckoutRequest {
    pub email: Option<String>,
    pub shipping_name: Option<String>,
    pub shipping_address: Option<String>,
}

/// Validated cart checkout details.
#[derive(Debug, Clone)]
pub struct CartCheckout {
    pub email: Email,
    pub shipping_name: String,
    pub shipping_address: String,
}

impl CartCheckoutRequest {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> Result<CartCheckout, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let email = match optional(self.email.as_deref()) {
            None => {
                errors.add("email", REQUIRED);
                None
            }
            Some(raw) => Email::parse(raw)
                .map_err(|_| errors.add("email", "Enter a valid email address."))
                .ok(),
        };
        let shipping_name = required(&mut errors, "shipping_name", self.shipping_name.as_deref());
        let shipping_address =
            required(&mut errors, "shipping_address", self.shipping_address.as_deref());

        match email {
            Some(email) if errors.is_empty() => Ok(CartCheckout {
                email,
                shipping_name,
                shipping_address,
            }),
            _ => Err(errors),
        }
    }
}

// =============================================================================
// Direct checkout
// =============================================================================

/// `POST /api/orders/direct` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DirectCheckoutRequest {
    pub shipping_name: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub shipping_address: Option<String>,
    pub district: Option<String>,
    pub delivery_area: Option<String>,
    pub products: Option<Vec<Value>>,
}

/// Validated direct ("buy now") checkout details.
#[derive(Debug, Clone)]
pub struct DirectCheckout {
    pub shipping_name: String,
    pub phone: Phone,
    pub email: Option<Email>,
    pub shipping_address: String,
    pub district: String,
    pub delivery_area: DeliveryArea,
    pub lines: Vec<LineRequest>,
}

impl DirectCheckoutRequest {
    /// Validate and normalize.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> Result<DirectCheckout, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let shipping_name = required(&mut errors, "shipping_name", self.shipping_name.as_deref());
        let shipping_address =
            required(&mut errors, "shipping_address", self.shipping_address.as_deref());

        let phone = match optional(self.phone.as_deref()) {
            None => {
                errors.add("phone", REQUIRED);
                None
            }
            Some(raw) => Phone::parse(raw)
                .map_err(|_| {
                    errors.add("phone", "Enter an 11-digit phone number starting with 01.");
                })
                .ok(),
        };

        let email = optional(self.email.as_deref()).and_then(|raw| {
            Email::parse(raw)
                .map_err(|_| errors.add("email", "Enter a valid email address."))
                .ok()
        });

        let delivery_area = match optional(self.delivery_area.as_deref()) {
            None => {
                errors.add("delivery_area", REQUIRED);
                None
            }
            Some(raw) => raw
                .parse::<DeliveryArea>()
                .map_err(|_| errors.add("delivery_area", "Must be \"inside\" or \"outside\"."))
                .ok(),
        };

        let lines = parse_lines(&mut errors, self.products.as_deref());

        match (phone, delivery_area) {
            (Some(phone), Some(delivery_area)) if errors.is_empty() => Ok(DirectCheckout {
                shipping_name,
                phone,
                email,
                shipping_address,
                district: optional(self.district.as_deref())
                    .unwrap_or_default()
                    .to_owned(),
                delivery_area,
                lines,
            }),
            _ => Err(errors),
        }
    }
}

/// Parse `[{id, quantity, size?}]`, recording errors under `products`.
fn parse_lines(errors: &mut ValidationErrors, products: Option<&[Value]>) -> Vec<LineRequest> {
    let items = products.unwrap_or_default();
    if items.is_empty() {
        errors.add("products", "At least one product is required.");
        return Vec::new();
    }

    let mut lines = Vec::with_capacity(items.len());
    for (index, item) in items.iter().enumerate() {
        let position = index + 1;
        let Some(object) = item.as_object() else {
            errors.add("products", format!("Item {position}: must be an object."));
            continue;
        };

        let id = object
            .get("id")
            .and_then(Value::as_str)
            .and_then(|raw| raw.parse::<ProductId>().ok());
        let quantity = object.get("quantity").and_then(positive_quantity);

        if id.is_none() {
            errors.add("products", format!("Item {position}: a valid product id is required."));
        }
        if quantity.is_none() {
            errors.add(
                "products",
                format!("Item {position}: quantity must be a positive integer."),
            );
        }

        if let (Some(product_id), Some(quantity)) = (id, quantity) {
            let size = object
                .get("size")
                .and_then(Value::as_str)
                .map(str::trim)
                .unwrap_or_default()
                .to_owned();
            lines.push(LineRequest {
                product_id,
                quantity,
                size,
                name: None,
            });
        }
    }
    lines
}

/// Accept a positive integer given as a JSON number or numeric string.
#[must_use]
pub fn positive_quantity(value: &Value) -> Option<i32> {
    let quantity = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }?;
    i32::try_from(quantity).ok().filter(|q| *q >= 1)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    const PRODUCT: &str = "6f1c1f0e-7d43-4a51-9a3b-1d2f3e4a5b6c";

    fn direct(body: Value) -> Result<DirectCheckout, ValidationErrors> {
        serde_json::from_value::<DirectCheckoutRequest>(body)
            .unwrap()
            .validate()
    }

    #[test]
    fn test_cart_checkout_trims_fields() {
        let checkout = CartCheckoutRequest {
            email: Some(" buyer@example.com ".to_owned()),
            shipping_name: Some("  Rahim ".to_owned()),
            shipping_address: Some(" Dhanmondi ".to_owned()),
        }
        .validate()
        .unwrap();

        assert_eq!(checkout.email.as_str(), "buyer@example.com");
        assert_eq!(checkout.shipping_name, "Rahim");
        assert_eq!(checkout.shipping_address, "Dhanmondi");
    }

    #[test]
    fn test_cart_checkout_reports_every_field() {
        let errors = CartCheckoutRequest {
            email: Some("not-an-email".to_owned()),
            shipping_name: Some("   ".to_owned()),
            shipping_address: None,
        }
        .validate()
        .unwrap_err();

        assert_eq!(errors.field("email").unwrap(), ["Enter a valid email address."]);
        assert_eq!(errors.field("shipping_name").unwrap(), ["Required."]);
        assert_eq!(errors.field("shipping_address").unwrap(), ["Required."]);
    }

    #[test]
    fn test_direct_checkout_accepts_valid_body() {
        let checkout = direct(json!({
            "shipping_name": "Karim",
            "phone": "01712345678",
            "shipping_address": "Mirpur 10",
            "delivery_area": "inside",
            "products": [{"id": PRODUCT, "quantity": 2, "size": "M"}]
        }))
        .unwrap();

        assert_eq!(checkout.phone.as_str(), "01712345678");
        assert_eq!(checkout.delivery_area, DeliveryArea::Inside);
        assert!(checkout.email.is_none());
        assert_eq!(checkout.district, "");
        assert_eq!(checkout.lines.len(), 1);
        assert_eq!(checkout.lines.first().unwrap().quantity, 2);
        assert_eq!(checkout.lines.first().unwrap().size, "M");
    }

    #[test]
    fn test_direct_checkout_rejects_international_phone() {
        let errors = direct(json!({
            "shipping_name": "Karim",
            "phone": "+880171234567",
            "shipping_address": "Mirpur 10",
            "delivery_area": "inside",
            "products": [{"id": PRODUCT, "quantity": 1}]
        }))
        .unwrap_err();

        assert!(errors.field("phone").is_some());
        assert!(errors.field("products").is_none());
    }

    #[test]
    fn test_direct_checkout_requires_products() {
        let errors = direct(json!({
            "shipping_name": "Karim",
            "phone": "01712345678",
            "shipping_address": "Mirpur 10",
            "delivery_area": "inside",
            "products": []
        }))
        .unwrap_err();

        assert_eq!(
            errors.field("products").unwrap(),
            ["At least one product is required."]
        );
    }

    #[test]
    fn test_direct_checkout_rejects_bad_lines_and_area() {
        let errors = direct(json!({
            "shipping_name": "Karim",
            "phone": "01712345678",
            "shipping_address": "Mirpur 10",
            "delivery_area": "abroad",
            "products": [{"id": "nope", "quantity": 1}, {"id": PRODUCT, "quantity": 0}]
        }))
        .unwrap_err();

        assert_eq!(errors.field("products").unwrap().len(), 2);
        assert!(errors.field("delivery_area").is_some());
    }

    #[test]
    fn test_quantity_accepts_numeric_strings() {
        assert_eq!(positive_quantity(&json!("3")), Some(3));
        assert_eq!(positive_quantity(&json!(1)), Some(1));
        assert_eq!(positive_quantity(&json!(-1)), None);
        assert_eq!(positive_quantity(&json!(1.5)), None);
        assert_eq!(positive_quantity(&json!(null)), None);
    }

    #[test]
    fn test_validation_errors_serialize_as_map() {
        let errors = ValidationErrors::single("quantity", "Must be a positive integer.");
        assert_eq!(
            serde_json::to_value(&errors).unwrap(),
            json!({"quantity": ["Must be a positive integer."]})
        );
    }
}
