//! Side effects of a committed order.
//!
//! Runs after the checkout transaction has committed. Nothing here can fail
//! the order: errors are logged and dropped.

use crate::models::Order;
use crate::services::conversions::{self, ConversionEvent, HashedCustomer};
use crate::state::AppState;

/// Send the admin email and track the purchase, both in the background.
pub fn order_placed(state: &AppState, order: &Order) {
    conversions::dispatch(state.conversions(), purchase_event(order));

    let Some(admin_email) = state.config().admin_email.clone() else {
        tracing::warn!(order_id = %order.id, "ADMIN_EMAIL not set, skipping order notification");
        return;
    };
    let Some(email) = state.email().cloned() else {
        tracing::debug!(order_id = %order.id, "SMTP not configured, skipping order notification");
        return;
    };

    let order = order.clone();
    tokio::spawn(async move {
        if let Err(e) = email.send_order_notification(&admin_email, &order).await {
            tracing::error!(order_id = %order.id, error = %e, "Failed to send order notification");
        }
    });
}

/// `Purchase` event for a placed order.
#[must_use]
pub fn purchase_event(order: &Order) -> ConversionEvent {
    ConversionEvent::Purchase {
        order_id: order.id,
        value: order.total,
        content_ids: order.items.iter().map(|i| i.product.id).collect(),
        num_items: order.items.iter().map(|i| i.quantity).sum(),
        customer: HashedCustomer::new(Some(&order.email), Some(&order.phone)),
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::models::order::tests::sample_order;
    use crate::services::conversions::hash_identifier;

    #[test]
    fn test_purchase_event_carries_totals_and_hashes() {
        let order = sample_order(None, "Guest@Example.com");
        let ConversionEvent::Purchase {
            order_id,
            value,
            content_ids,
            num_items,
            customer,
        } = purchase_event(&order)
        else {
            panic!("expected a purchase event");
        };

        assert_eq!(order_id, order.id);
        assert_eq!(value, Decimal::new(14000, 2));
        assert_eq!(content_ids.len(), 1);
        assert_eq!(num_items, 1);
        assert_eq!(customer.email, hash_identifier("guest@example.com"));
        assert_eq!(customer.phone, hash_identifier("01712345678"));
    }
}
