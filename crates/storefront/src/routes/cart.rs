//! Cart route handlers.
//!
//! Every handler works on the caller's own cart: the account cart when
//! logged in, otherwise the anonymous cart bound to the session.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tower_sessions::Session;
use tracing::instrument;

use gadzilla_core::{CartItemId, ProductId};

use crate::checkout::{ValidationErrors, positive_quantity};
use crate::db::carts::CartRepository;
use crate::db::products::ProductRepository;
use crate::error::{ApiJson, AppError, Result, add_breadcrumb};
use crate::middleware::{OptionalAuth, cart_owner};
use crate::models::{Cart, CartItemView, CartView};
use crate::services::conversions::{self, ConversionEvent};
use crate::state::AppState;

/// Longest accepted size label.
const MAX_SIZE_LEN: usize = 20;

async fn current_cart(state: &AppState, session: &Session, auth: &OptionalAuth) -> Result<Cart> {
    let owner = cart_owner(session, auth.0.as_ref()).await?;
    Ok(CartRepository::new(state.pool()).get_or_create(&owner).await?)
}

/// The caller's cart with its lines.
#[instrument(skip(state, session, auth))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
) -> Result<Json<CartView>> {
    let cart = current_cart(&state, &session, &auth).await?;
    let items = CartRepository::new(state.pool()).items(cart.id).await?;
    Ok(Json(CartView::new(&cart, &items, state.media())))
}

/// `POST /api/cart/add` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddToCartRequest {
    pub product_id: Option<String>,
    pub quantity: Option<Value>,
    pub size: Option<String>,
}

/// Validated add-to-cart input.
#[derive(Debug, PartialEq, Eq)]
pub struct AddToCart {
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: String,
}

impl AddToCartRequest {
    /// Validate shape only; product existence is checked against the database.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn validate(self) -> std::result::Result<AddToCart, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let product_id = self
            .product_id
            .as_deref()
            .and_then(|raw| raw.parse::<ProductId>().ok());
        if product_id.is_none() {
            errors.add("product_id", "Must be a valid UUID.");
        }

        let quantity = match &self.quantity {
            None | Some(Value::Null) => Some(1),
            Some(value) => positive_quantity(value),
        };
        if quantity.is_none() {
            errors.add("quantity", "Must be a positive integer.");
        }

        let size = self.size.as_deref().map(str::trim).unwrap_or_default();
        if size.chars().count() > MAX_SIZE_LEN {
            errors.add(
                "size",
                format!("Ensure this field has no more than {MAX_SIZE_LEN} characters."),
            );
        }

        match (product_id, quantity) {
            (Some(product_id), Some(quantity)) if errors.is_empty() => Ok(AddToCart {
                product_id,
                quantity,
                size: size.to_owned(),
            }),
            _ => Err(errors),
        }
    }
}

/// Set the quantity of a (product, size) line, creating it if needed.
#[instrument(skip(state, session, auth))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<(StatusCode, Json<CartItemView>)> {
    let input = body.validate()?;

    if !ProductRepository::new(state.pool())
        .is_active(input.product_id)
        .await?
    {
        return Err(AppError::field("product_id", "Product not found."));
    }

    let cart = current_cart(&state, &session, &auth).await?;
    let item = CartRepository::new(state.pool())
        .set_item(cart.id, input.product_id, input.quantity, &input.size)
        .await?;

    add_breadcrumb(
        "cart",
        "Added to cart",
        Some(&[("product_id", &input.product_id.to_string())]),
    );
    conversions::dispatch(
        state.conversions(),
        ConversionEvent::AddToCart {
            product_id: item.product.id,
            value: item.product.price * rust_decimal::Decimal::from(item.quantity),
            quantity: item.quantity,
        },
    );

    Ok((
        StatusCode::CREATED,
        Json(CartItemView::new(&item, state.media())),
    ))
}

/// Line ids that are not integers name no line.
fn parse_item_id(raw: &str) -> Result<CartItemId> {
    raw.trim()
        .parse::<i32>()
        .map(CartItemId::new)
        .map_err(|_| AppError::NotFound)
}

/// `PATCH /api/cart/items/{id}/update` body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UpdateQuantityRequest {
    pub quantity: Option<Value>,
}

/// Change the quantity of one of the caller's lines.
#[instrument(skip(state, session, auth))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Path(item_id): Path<String>,
    ApiJson(body): ApiJson<UpdateQuantityRequest>,
) -> Result<Json<CartItemView>> {
    let item_id = parse_item_id(&item_id)?;
    // Only real JSON integers count here.
    let quantity = body
        .quantity
        .as_ref()
        .filter(|v| v.is_i64())
        .and_then(positive_quantity)
        .ok_or_else(|| AppError::field("quantity", "Must be a positive integer."))?;

    let cart = current_cart(&state, &session, &auth).await?;
    let item = CartRepository::new(state.pool())
        .update_quantity(cart.id, item_id, quantity)
        .await?;

    Ok(Json(CartItemView::new(&item, state.media())))
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub status: &'static str,
    pub deleted: bool,
}

/// Remove one of the caller's lines. Removing a missing line is not an error.
#[instrument(skip(state, session, auth))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    auth: OptionalAuth,
    Path(item_id): Path<String>,
) -> Result<Json<RemoveResponse>> {
    let item_id = parse_item_id(&item_id)?;
    let cart = current_cart(&state, &session, &auth).await?;
    let deleted = CartRepository::new(state.pool())
        .remove_item(cart.id, item_id)
        .await?;

    Ok(Json(RemoveResponse {
        status: "removed",
        deleted,
    }))
}
