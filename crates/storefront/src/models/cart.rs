//! Cart models.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gadzilla_core::{CartId, CartItemId, UserId};

use super::{MediaUrls, Product, ProductSummary};

/// A shopping cart owned by an account or an anonymous session.
#[derive(Debug, Clone)]
pub struct Cart {
    pub id: CartId,
    pub user_id: Option<UserId>,
    pub session_key: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One (product, size) line in a cart.
#[derive(Debug, Clone)]
pub struct CartItem {
    pub id: CartItemId,
    pub cart_id: CartId,
    pub product: Product,
    pub quantity: i32,
    pub size: String,
    pub created_at: DateTime<Utc>,
}

/// Cart line as returned to the frontend.
#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: CartItemId,
    pub product: ProductSummary,
    pub quantity: i32,
    pub size: String,
    pub created_at: DateTime<Utc>,
}

impl CartItemView {
    #[must_use]
    pub fn new(item: &CartItem, media: &MediaUrls) -> Self {
        Self {
            id: item.id,
            product: ProductSummary::new(&item.product, media),
            quantity: item.quantity,
            size: item.size.clone(),
            created_at: item.created_at,
        }
    }
}

/// Whole cart as returned to the frontend.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: CartId,
    pub items: Vec<CartItemView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartView {
    #[must_use]
    pub fn new(cart: &Cart, items: &[CartItem], media: &MediaUrls) -> Self {
        Self {
            id: cart.id,
            items: items.iter().map(|i| CartItemView::new(i, media)).collect(),
            created_at: cart.created_at,
            updated_at: cart.updated_at,
        }
    }
}
