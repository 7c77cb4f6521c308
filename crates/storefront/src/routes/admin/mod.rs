//! Staff JSON API under `/api/admin`.
//!
//! Every handler takes [`RequireStaff`](crate::middleware::RequireStaff):
//! anonymous callers get 401, logged-in customers 403.
//!
//! ```text
//! GET    /dashboard                 - Order stats, low stock, recent messages
//! GET    /orders?status=&q=&page=   - Order list
//! GET    /orders/{id}               - Order detail
//! PATCH  /orders/{id}               - Status / tracking number
//! GET    /products?q=&page=         - All products, inactive included
//! POST   /products                  - Create product
//! PATCH  /products/{id}             - Edit product
//! PATCH  /products/{id}/stock       - Set stock
//! GET    /contact?page=             - Contact form messages
//! GET    /notifications             - All notifications
//! POST   /notifications             - Create notification
//! PATCH  /notifications/{id}        - Edit notification
//! DELETE /notifications/{id}        - Delete notification
//! ```

pub mod dashboard;
pub mod notifications;
pub mod orders;
pub mod products;

use axum::{
    Router,
    routing::{get, patch},
};
use serde::{Deserialize, Deserializer};

use crate::state::AppState;

/// Staff routes, to be nested under `/api/admin`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard::overview))
        .route("/orders", get(orders::list))
        .route("/orders/{id}", get(orders::detail).patch(orders::update))
        .route("/products", get(products::list).post(products::create))
        .route("/products/{id}", patch(products::update))
        .route("/products/{id}/stock", patch(products::set_stock))
        .route("/contact", get(dashboard::contact_messages))
        .route(
            "/notifications",
            get(notifications::list).post(notifications::create),
        )
        .route(
            "/notifications/{id}",
            patch(notifications::update).delete(notifications::delete),
        )
}

/// Deserialize a nullable field so that `null` (clear) and absent (keep)
/// differ: absent is `None`, `null` is `Some(None)`.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
