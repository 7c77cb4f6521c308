//! Staff dashboard and contact inbox.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Query, State},
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use crate::db::contact::ContactRepository;
use crate::db::orders::{OrderRepository, OrderStats};
use crate::db::products::ProductRepository;
use crate::error::Result;
use crate::middleware::RequireStaff;
use crate::models::{ContactSubmission, Page, PageQuery, ProductSummary};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OrderSummary {
    pub total: i64,
    pub by_status: BTreeMap<&'static str, i64>,
    pub revenue: Decimal,
}

impl From<OrderStats> for OrderSummary {
    fn from(stats: OrderStats) -> Self {
        Self {
            total: stats.total_orders,
            by_status: stats
                .by_status
                .into_iter()
                .map(|(status, n)| (status.as_str(), n))
                .collect(),
            revenue: stats.revenue,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Dashboard {
    pub orders: OrderSummary,
    pub low_stock_threshold: i32,
    pub low_stock: Vec<ProductSummary>,
    pub recent_contacts: Vec<ContactSubmission>,
    pub contact_count: i64,
}

/// Order counts, revenue, low-stock products and the newest messages.
#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
pub async fn overview(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
) -> Result<Json<Dashboard>> {
    let threshold = state.config().low_stock_threshold;
    let stats = OrderRepository::new(state.pool()).stats().await?;
    let low_stock = ProductRepository::new(state.pool())
        .low_stock(threshold)
        .await?;
    let (recent_contacts, contact_count) = ContactRepository::new(state.pool())
        .list(&PageQuery::default())
        .await?;

    let media = state.media();
    Ok(Json(Dashboard {
        orders: stats.into(),
        low_stock_threshold: threshold,
        low_stock: low_stock
            .iter()
            .map(|p| ProductSummary::new(p, media))
            .collect(),
        recent_contacts,
        contact_count,
    }))
}

/// Contact form messages, newest first.
#[instrument(skip(state, _staff))]
pub async fn contact_messages(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<ContactSubmission>>> {
    let (messages, count) = ContactRepository::new(state.pool()).list(&page).await?;
    Ok(Json(Page::new(messages, count, &page)))
}

#[cfg(test)]
mod tests {
    use gadzilla_core::OrderStatus;

    use super::*;

    #[test]
    fn test_order_summary_keys_by_wire_status() {
        let summary = OrderSummary::from(OrderStats {
            by_status: vec![(OrderStatus::Pending, 3), (OrderStatus::Cancelled, 1)],
            total_orders: 4,
            revenue: Decimal::new(25000, 2),
        });
        assert_eq!(summary.total, 4);
        assert_eq!(summary.by_status.get("pending"), Some(&3));
        assert_eq!(summary.by_status.get("cancelled"), Some(&1));
    }
}
