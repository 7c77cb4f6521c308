//! Staff order management.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use gadzilla_core::{OrderId, OrderStatus};

use crate::checkout::ValidationErrors;
use crate::db::orders::{OrderFilter, OrderRepository};
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::{OrderView, Page, PageQuery};
use crate::state::AppState;

const MAX_TRACKING_LEN: usize = 100;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct OrderListQuery {
    pub status: Option<String>,
    pub q: Option<String>,
}

impl OrderListQuery {
    /// Unknown statuses and blank searches are ignored.
    fn into_filter(self) -> OrderFilter {
        OrderFilter {
            status: self.status.as_deref().and_then(|s| s.parse().ok()),
            search: self
                .q
                .map(|q| q.trim().to_owned())
                .filter(|q| !q.is_empty()),
        }
    }
}

/// All orders, newest first.
#[instrument(skip(state, _staff))]
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(query): Query<OrderListQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<OrderView>>> {
    let (orders, count) = OrderRepository::new(state.pool())
        .list(&query.into_filter(), &page)
        .await?;
    let media = state.media();
    Ok(Json(
        Page::new(orders, count, &page).map(|o| OrderView::new(&o, media)),
    ))
}

fn parse_order_id(raw: &str) -> Result<OrderId> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// One order with its items.
#[instrument(skip(state, _staff))]
pub async fn detail(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Path(id): Path<String>,
) -> Result<Json<OrderView>> {
    let order = OrderRepository::new(state.pool())
        .get(parse_order_id(&id)?)
        .await?
        .ok_or(AppError::NotFound)?;
    Ok(Json(OrderView::new(&order, state.media())))
}

/// `PATCH /api/admin/orders/{id}` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateOrderRequest {
    pub status: Option<String>,
    pub tracking_number: Option<String>,
}

/// Validated fulfillment edit.
#[derive(Debug, PartialEq, Eq)]
pub struct FulfillmentUpdate {
    pub status: Option<OrderStatus>,
    pub tracking_number: Option<String>,
}

impl UpdateOrderRequest {
    /// # Errors
    ///
    /// Returns field errors for an unknown status or an overlong tracking number.
    pub fn validate(self) -> std::result::Result<FulfillmentUpdate, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let status = match self.status.as_deref().map(str::trim) {
            None => None,
            Some(raw) => match raw.parse::<OrderStatus>() {
                Ok(status) => Some(status),
                Err(_) => {
                    errors.add("status", format!("\"{raw}\" is not a valid choice."));
                    None
                }
            },
        };

        let tracking_number = self.tracking_number.map(|t| t.trim().to_owned());
        if tracking_number
            .as_deref()
            .is_some_and(|t| t.chars().count() > MAX_TRACKING_LEN)
        {
            errors.add(
                "tracking_number",
                format!("Ensure this field has no more than {MAX_TRACKING_LEN} characters."),
            );
        }

        errors.into_result(FulfillmentUpdate {
            status,
            tracking_number,
        })
    }
}

/// Change an order's status and/or tracking number.
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<UpdateOrderRequest>,
) -> Result<Json<OrderView>> {
    let id = parse_order_id(&id)?;
    let update = body.validate()?;

    let orders = OrderRepository::new(state.pool());
    orders
        .update_fulfillment(id, update.status, update.tracking_number.as_deref())
        .await?;
    tracing::info!(order_id = %id, status = ?update.status, "Order updated by staff");

    let order = orders.get(id).await?.ok_or(AppError::NotFound)?;
    Ok(Json(OrderView::new(&order, state.media())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_update_parses_status() {
        let update = UpdateOrderRequest {
            status: Some("shipped".to_owned()),
            tracking_number: Some(" TRK-1 ".to_owned()),
        }
        .validate()
        .unwrap();
        assert_eq!(
            update,
            FulfillmentUpdate {
                status: Some(OrderStatus::Shipped),
                tracking_number: Some("TRK-1".to_owned()),
            }
        );
    }

    #[test]
    fn test_update_rejects_unknown_status() {
        let errors = UpdateOrderRequest {
            status: Some("lost".to_owned()),
            tracking_number: None,
        }
        .validate()
        .unwrap_err();
        assert_eq!(
            errors.field("status").unwrap(),
            ["\"lost\" is not a valid choice."]
        );
    }

    #[test]
    fn test_list_query_ignores_unknown_status_and_blank_search() {
        let filter = OrderListQuery {
            status: Some("bogus".to_owned()),
            q: Some("  ".to_owned()),
        }
        .into_filter();
        assert_eq!(filter.status, None);
        assert_eq!(filter.search, None);

        let filter = OrderListQuery {
            status: Some("pending".to_owned()),
            q: Some(" 0171 ".to_owned()),
        }
        .into_filter();
        assert_eq!(filter.status, Some(OrderStatus::Pending));
        assert_eq!(filter.search.as_deref(), Some("0171"));
    }
}
