//! Wishlist route handlers. All require login.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use gadzilla_core::{ProductId, WishlistItemId};

use crate::db::products::ProductRepository;
use crate::db::wishlist::WishlistRepository;
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireAuth;
use crate::models::ProductSummary;
use crate::services::conversions::{self, ConversionEvent};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WishlistItemView {
    pub id: WishlistItemId,
    pub product: ProductSummary,
    pub created_at: DateTime<Utc>,
}

/// The caller's wishlist, newest first.
#[instrument(skip(state, user))]
pub async fn list(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<Vec<WishlistItemView>>> {
    let entries = WishlistRepository::new(state.pool()).list(user.id).await?;
    let media = state.media();
    Ok(Json(
        entries
            .into_iter()
            .map(|e| WishlistItemView {
                id: e.id,
                product: ProductSummary::new(&e.product, media),
                created_at: e.created_at,
            })
            .collect(),
    ))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AddToWishlistRequest {
    pub product_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AddedResponse {
    pub status: &'static str,
    pub created: bool,
}

/// Add a product. Adding it twice is not an error.
#[instrument(skip(state, user))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    ApiJson(body): ApiJson<AddToWishlistRequest>,
) -> Result<(StatusCode, Json<AddedResponse>)> {
    let product_id: ProductId = body
        .product_id
        .as_deref()
        .and_then(|raw| raw.parse().ok())
        .ok_or_else(|| AppError::field("product_id", "Must be a valid UUID."))?;

    let products = ProductRepository::new(state.pool());
    let product = products
        .get(product_id)
        .await?
        .filter(|p| p.is_active)
        .ok_or_else(|| AppError::field("product_id", "Product not found."))?;

    let created = WishlistRepository::new(state.pool())
        .add(user.id, product_id)
        .await?;

    if created {
        conversions::dispatch(
            state.conversions(),
            ConversionEvent::AddToWishlist {
                product_id,
                value: product.price,
            },
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(AddedResponse {
            status: "added",
            created,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct RemovedResponse {
    pub status: &'static str,
    pub deleted: bool,
}

/// Remove a product from the wishlist.
#[instrument(skip(state, user))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    Path(product_id): Path<String>,
) -> Result<Json<RemovedResponse>> {
    let deleted = match product_id.parse::<ProductId>() {
        Ok(product_id) => {
            WishlistRepository::new(state.pool())
                .remove(user.id, product_id)
                .await?
        }
        Err(_) => false,
    };

    Ok(Json(RemovedResponse {
        status: "removed",
        deleted,
    }))
}
