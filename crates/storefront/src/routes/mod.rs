//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Readiness (database)
//!
//! # Catalog
//! GET  /api/products                        - Filtered, paginated list
//! GET  /api/products/search?q=              - Name/brand/description search
//! GET  /api/products/{identifier}           - Detail by UUID or slug
//! GET  /api/products/{identifier}/related   - Same category
//! GET  /api/navbar-categories[/{slug}]      - Taxonomy with subcategories
//! GET  /api/categories[/{slug}]             - Subcategories
//! GET  /api/categories/{slug}/subcategories - Children of a navbar category
//! GET  /api/brands?category=                - Distinct brand names
//! GET  /api/brand-showcase?type=            - Home page brands
//!
//! # Cart
//! GET  /api/cart                            - Current cart
//! POST /api/cart/add                        - Add or overwrite a line
//! PATCH /api/cart/items/{id}/update         - Change quantity
//! POST /api/cart/items/{id}/remove          - Remove a line
//!
//! # Orders
//! POST /api/orders                          - Checkout the cart
//! POST /api/orders/direct                   - Checkout an explicit line list
//! POST /api/orders/initiate-checkout        - Report a checkout start
//! GET  /api/orders/my                       - Caller's orders
//! GET  /api/orders/{id}?email=              - One order
//!
//! # Account
//! POST /api/auth/register | login | logout
//! GET  /api/auth/me
//! GET  /api/wishlist
//! POST /api/wishlist/add
//! POST /api/wishlist/remove/{product_id}
//!
//! # Site
//! POST /api/contact
//! GET  /api/notifications/active
//! GET  /api/verify-admin-path?path=
//!
//! # Staff
//! /api/admin/...                            - See [`admin`]
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod categories;
pub mod contact;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod products;
pub mod wishlist;

use std::time::Duration;

use axum::{
    Router,
    http::{HeaderName, HeaderValue, Method, Request, Response, header},
    middleware::from_fn,
    routing::{get, patch, post},
};
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::{
    REQUEST_ID_HEADER, create_session_layer, request_id_middleware, session_store,
};
use crate::state::AppState;

/// Catalog routes.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/products", get(products::list))
        .route("/products/search", get(products::search))
        .route("/products/{identifier}", get(products::detail))
        .route("/products/{identifier}/related", get(products::related))
        .route("/navbar-categories", get(categories::navbar_categories))
        .route("/navbar-categories/{slug}", get(categories::navbar_category))
        .route("/categories", get(categories::categories))
        .route("/categories/{slug}", get(categories::category))
        .route(
            "/categories/{parent_slug}/subcategories",
            get(categories::subcategories),
        )
        .route("/brands", get(products::brand_names))
        .route("/brand-showcase", get(categories::brand_showcase))
}

/// Cart routes, nested under `/api/cart`.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/items/{item_id}/update", patch(cart::update))
        .route("/items/{item_id}/remove", post(cart::remove))
}

/// Order routes, nested under `/api/orders`.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(orders::create_from_cart))
        .route("/direct", post(orders::create_direct))
        .route("/initiate-checkout", post(orders::initiate_checkout))
        .route("/my", get(orders::mine))
        .route("/{id}", get(orders::detail))
}

/// Account routes, nested under `/api/auth`.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me))
}

/// Wishlist routes, nested under `/api/wishlist`.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::list))
        .route("/add", post(wishlist::add))
        .route("/remove/{product_id}", post(wishlist::remove))
}

/// Everything under `/api`.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(catalog_routes())
        .nest("/cart", cart_routes())
        .nest("/orders", order_routes())
        .nest("/auth", auth_routes())
        .nest("/wishlist", wishlist_routes())
        .route("/contact", post(contact::submit))
        .route("/notifications/active", get(notifications::active))
        .route("/verify-admin-path", get(auth::verify_admin_path))
        .nest("/admin", admin::routes())
}

/// CORS for the storefront frontend: configured origins only, with cookies.
fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(%origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::ACCEPT,
            HeaderName::from_static(REQUEST_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(REQUEST_ID_HEADER)])
        .max_age(Duration::from_secs(60 * 60))
}

/// The complete application router with sessions, CORS, tracing and
/// request ids. Sentry layers and trailing-slash normalization are added by
/// the binary around this.
pub fn app(state: AppState) -> Router {
    let session_layer = create_session_layer(session_store(state.pool()), state.config());
    let cors = cors_layer(&state.config().cors_allowed_origins);

    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", api_routes())
        .layer(session_layer)
        .layer(cors)
        .layer(from_fn(request_id_middleware))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        path = %request.uri().path(),
                        request_id = tracing::field::Empty,
                        status = tracing::field::Empty,
                        latency_ms = tracing::field::Empty,
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, span: &Span| {
                    span.record("status", response.status().as_u16());
                    span.record(
                        "latency_ms",
                        u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                    );
                    DefaultOnResponse::default().on_response(response, latency, span);
                }),
        )
        .with_state(state)
}
