//! Order placement and order lookup handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower_sessions::Session;
use tracing::instrument;

use gadzilla_core::OrderId;

use crate::checkout::{CartCheckoutRequest, Checkout, DirectCheckoutRequest};
use crate::db::carts::CartRepository;
use crate::db::orders::OrderRepository;
use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, cart_owner};
use crate::models::{Order, OrderView, Page, PageQuery};
use crate::services::conversions::{self, ConversionEvent, HashedCustomer};
use crate::services::notify;
use crate::state::AppState;

/// Fire the side effects of a committed order and build the response.
///
/// `order` was read inside the checkout transaction, so nothing here can
/// turn a committed order into an error response.
fn placed_response(state: &AppState, order: &Order) -> (StatusCode, Json<OrderView>) {
    notify::order_placed(state, order);
    add_breadcrumb(
        "checkout",
        "Order placed",
        Some(&[("order_id", &order.id.to_string())]),
    );

    (StatusCode::CREATED, Json(OrderView::new(order, state.media())))
}

/// Place an order from the caller's cart.
#[instrument(skip(state, session, auth, body))]
pub async fn create_from_cart(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    ApiJson(body): ApiJson<CartCheckoutRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let details = body.validate()?;

    let owner = cart_owner(&session, auth.0.as_ref()).await?;
    let cart = CartRepository::new(state.pool())
        .get_or_create(&owner)
        .await?;

    let placed = Checkout::new(state.checkout(), state.config().shipping)
        .place_cart_order(cart.id, auth.0.as_ref().map(|u| u.id), details)
        .await?;

    Ok(placed_response(&state, &placed.order))
}

/// Place an order from a submitted product list ("buy now").
#[instrument(skip(state, auth, body))]
pub async fn create_direct(
    State(state): State<AppState>,
    auth: OptionalAuth,
    ApiJson(body): ApiJson<DirectCheckoutRequest>,
) -> Result<(StatusCode, Json<OrderView>)> {
    let details = body.validate()?;

    let placed = Checkout::new(state.checkout(), state.config().shipping)
        .place_direct_order(auth.0.as_ref().map(|u| u.id), details)
        .await?;

    Ok(placed_response(&state, &placed.order))
}

/// Customer details known when checkout starts. Every field is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct InitiateCheckoutRequest {
    pub email: Option<String>,
    pub phone: Option<String>,
    pub shipping_name: Option<String>,
}

impl InitiateCheckoutRequest {
    fn has_payment_info(&self) -> bool {
        [&self.email, &self.phone, &self.shipping_name]
            .into_iter()
            .flatten()
            .any(|v| !v.trim().is_empty())
    }
}

/// Funnel events for a checkout start: always `InitiateCheckout`, plus
/// `AddPaymentInfo` once the customer has typed any detail.
fn checkout_events(
    body: &InitiateCheckoutRequest,
    account_email: Option<&str>,
) -> Vec<ConversionEvent> {
    let email = body
        .email
        .as_deref()
        .filter(|e| !e.trim().is_empty())
        .or(account_email);
    let customer = HashedCustomer::new(email, body.phone.as_deref());

    let mut events = vec![ConversionEvent::InitiateCheckout {
        customer: customer.clone(),
    }];
    if body.has_payment_info() {
        let customer = customer.with_name(body.shipping_name.as_deref().unwrap_or_default());
        events.push(ConversionEvent::AddPaymentInfo { customer });
    }
    events
}

/// Report that the caller opened checkout. An empty body is allowed.
#[instrument(skip(state, auth, body))]
pub async fn initiate_checkout(
    State(state): State<AppState>,
    auth: OptionalAuth,
    body: Bytes,
) -> Result<Json<Value>> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        InitiateCheckoutRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|e| AppError::field("non_field_errors", format!("Invalid JSON: {e}")))?
    };

    let account_email = auth.0.as_ref().map(|u| u.email.as_str());
    for event in checkout_events(&request, account_email) {
        conversions::dispatch(state.conversions(), event);
    }

    Ok(Json(json!({ "status": "ok" })))
}

#[derive(Debug, Deserialize)]
pub struct OrderLookupQuery {
    /// Required for guest orders.
    pub email: Option<String>,
}

/// One order, if the caller may see it.
///
/// Unknown ids, foreign account orders and guest orders with a wrong email
/// all answer 404 alike.
#[instrument(skip(state, auth, query))]
pub async fn detail(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Path(id): Path<String>,
    Query(query): Query<OrderLookupQuery>,
) -> Result<Json<OrderView>> {
    let id: OrderId = id.parse().map_err(|_| AppError::NotFound)?;
    let order = OrderRepository::new(state.pool())
        .get(id)
        .await?
        .filter(|o| o.visible_to(auth.0.as_ref().map(|u| u.id), query.email.as_deref()))
        .ok_or(AppError::NotFound)?;

    Ok(Json(OrderView::new(&order, state.media())))
}

/// The caller's orders, newest first. Anonymous callers get an empty page.
#[instrument(skip(state, auth))]
pub async fn mine(
    State(state): State<AppState>,
    auth: OptionalAuth,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<OrderView>>> {
    let Some(user) = auth.0 else {
        return Ok(Json(Page::empty()));
    };

    let (orders, count) = OrderRepository::new(state.pool())
        .list_for_user(user.id, &page)
        .await?;

    let media = state.media();
    Ok(Json(
        Page::new(orders, count, &page).map(|o| OrderView::new(&o, media)),
    ))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::services::conversions::hash_identifier;

    #[test]
    fn test_empty_start_only_initiates() {
        let events = checkout_events(&InitiateCheckoutRequest::default(), None);

        assert_eq!(events.len(), 1);
        assert_eq!(
            events[0],
            ConversionEvent::InitiateCheckout {
                customer: HashedCustomer::default()
            }
        );
    }

    #[test]
    fn test_account_email_fills_in_for_blank_body() {
        let body = InitiateCheckoutRequest {
            email: Some("   ".into()),
            ..InitiateCheckoutRequest::default()
        };
        let events = checkout_events(&body, Some("Buyer@Example.com"));

        assert_eq!(events.len(), 1);
        let ConversionEvent::InitiateCheckout { customer } = &events[0] else {
            panic!("expected InitiateCheckout, got {:?}", events[0]);
        };
        assert_eq!(customer.email, hash_identifier("buyer@example.com"));
    }

    #[test]
    fn test_typed_details_add_payment_info() {
        let body = InitiateCheckoutRequest {
            email: None,
            phone: Some("01712345678".into()),
            shipping_name: Some("Rahim Uddin".into()),
        };
        let events = checkout_events(&body, None);

        let names: Vec<&str> = events.iter().map(ConversionEvent::name).collect();
        assert_eq!(names, ["InitiateCheckout", "AddPaymentInfo"]);
        let ConversionEvent::AddPaymentInfo { customer } = &events[1] else {
            panic!("expected AddPaymentInfo, got {:?}", events[1]);
        };
        assert_eq!(customer.phone, hash_identifier("01712345678"));
        assert_eq!(customer.first_name, hash_identifier("rahim"));
        assert_eq!(customer.last_name, hash_identifier("uddin"));
    }
}
