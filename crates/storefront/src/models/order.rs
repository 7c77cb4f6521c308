//! Order models and the order projection.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use gadzilla_core::{DeliveryArea, Email, OrderId, OrderItemId, OrderStatus, UserId};

use super::{MediaUrls, Product, ProductSummary};

/// A placed order with its line items.
#[derive(Debug, Clone)]
pub struct Order {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub email: String,
    pub status: OrderStatus,
    pub total: Decimal,
    pub shipping_cost: Decimal,
    pub shipping_name: String,
    pub shipping_address: String,
    pub phone: String,
    pub delivery_area: Option<DeliveryArea>,
    pub district: String,
    pub tracking_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItem>,
}

/// An order line. `price` is the unit price at the time of ordering.
#[derive(Debug, Clone)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub product: Product,
    pub quantity: i32,
    pub size: String,
    pub price: Decimal,
}

impl OrderItem {
    /// `price * quantity`.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

impl Order {
    /// Whether `caller` may read this order.
    ///
    /// Account orders are visible to their owner only. Guest orders need the
    /// order email, compared trimmed and case-insensitively; a blank email
    /// never matches.
    #[must_use]
    pub fn visible_to(&self, caller: Option<UserId>, email: Option<&str>) -> bool {
        match self.user_id {
            Some(owner) => caller == Some(owner),
            None => {
                let supplied = email.map(str::trim).unwrap_or_default();
                !supplied.is_empty()
                    && Email::parse(&self.email).is_ok_and(|stored| stored.eq_ignore_case(supplied))
            }
        }
    }

    /// Sum of line totals (the total before shipping).
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }
}

/// Order line as returned to the frontend.
#[derive(Debug, Serialize)]
pub struct OrderItemView {
    pub id: OrderItemId,
    pub product: ProductSummary,
    pub quantity: i32,
    pub size: String,
    pub price: Decimal,
}

/// Order projection.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: OrderId,
    pub email: String,
    pub status: OrderStatus,
    pub total: Decimal,
    pub shipping_cost: Decimal,
    pub shipping_name: String,
    pub shipping_address: String,
    pub phone: String,
    pub delivery_area: Option<DeliveryArea>,
    pub district: String,
    pub tracking_number: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub items: Vec<OrderItemView>,
}

impl OrderView {
    #[must_use]
    pub fn new(order: &Order, media: &MediaUrls) -> Self {
        Self {
            id: order.id,
            email: order.email.clone(),
            status: order.status,
            total: order.total,
            shipping_cost: order.shipping_cost,
            shipping_name: order.shipping_name.clone(),
            shipping_address: order.shipping_address.clone(),
            phone: order.phone.clone(),
            delivery_area: order.delivery_area,
            district: order.district.clone(),
            tracking_number: order.tracking_number.clone(),
            created_at: order.created_at,
            updated_at: order.updated_at,
            items: order
                .items
                .iter()
                .map(|item| OrderItemView {
                    id: item.id,
                    product: ProductSummary::new(&item.product, media),
                    quantity: item.quantity,
                    size: item.size.clone(),
                    price: item.price,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::catalog::tests::sample_product;

    pub(crate) fn sample_order(user_id: Option<UserId>, email: &str) -> Order {
        Order {
            id: OrderId::generate(),
            user_id,
            email: email.to_owned(),
            status: OrderStatus::Pending,
            total: Decimal::new(14000, 2),
            shipping_cost: Decimal::new(4000, 2),
            shipping_name: "Rahim Uddin".to_owned(),
            shipping_address: "House 4, Road 7, Dhanmondi".to_owned(),
            phone: "01712345678".to_owned(),
            delivery_area: Some(DeliveryArea::Inside),
            district: "Dhaka".to_owned(),
            tracking_number: String::new(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            items: vec![OrderItem {
                id: OrderItemId::new(1),
                product: sample_product(),
                quantity: 1,
                size: String::new(),
                price: Decimal::new(10000, 2),
            }],
        }
    }

    #[test]
    fn test_account_order_visible_to_owner_only() {
        let order = sample_order(Some(UserId::new(4)), "owner@example.com");
        assert!(order.visible_to(Some(UserId::new(4)), None));
        assert!(!order.visible_to(Some(UserId::new(5)), None));
        assert!(!order.visible_to(None, Some("owner@example.com")));
    }

    #[test]
    fn test_guest_order_requires_matching_email() {
        let order = sample_order(None, "Guest@Example.com");
        assert!(order.visible_to(None, Some("  guest@example.COM ")));
        assert!(order.visible_to(Some(UserId::new(9)), Some("guest@example.com")));
        assert!(!order.visible_to(None, Some("other@example.com")));
        assert!(!order.visible_to(None, Some("")));
        assert!(!order.visible_to(None, None));
    }

    #[test]
    fn test_guest_order_without_email_never_matches() {
        let order = sample_order(None, "");
        assert!(!order.visible_to(None, Some("")));
        assert!(!order.visible_to(None, Some("   ")));
        assert!(!order.visible_to(None, Some("guest@example.com")));
    }

    #[test]
    fn test_subtotal_and_line_total() {
        let order = sample_order(None, "a@b.co");
        assert_eq!(order.subtotal(), Decimal::new(10000, 2));
        assert_eq!(order.items.first().map(OrderItem::line_total), Some(Decimal::new(10000, 2)));
    }
}
