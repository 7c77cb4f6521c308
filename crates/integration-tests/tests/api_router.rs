//! Router-level tests that never touch the database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tower::ServiceExt;

use gadzilla_integration_tests::{ADMIN_PATH, get, lazy_app, post_json, send};

#[tokio::test]
async fn test_health() {
    let app = lazy_app();
    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_echoed_or_generated() {
    let app = lazy_app();

    let request = Request::get("/health")
        .header("x-request-id", "edge-1234")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.headers()["x-request-id"], "edge-1234");

    let response = app.oneshot(get("/health")).await.unwrap();
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert_eq!(generated.len(), 36);
}

#[tokio::test]
async fn test_verify_admin_path() {
    let app = lazy_app();

    let (status, body) = send(&app, get(&format!("/api/verify-admin-path?path=/{ADMIN_PATH}/"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "valid": true }));

    let (_, body) = send(&app, get("/api/verify-admin-path?path=admin")).await;
    assert_eq!(body, json!({ "valid": false }));

    let (_, body) = send(&app, get("/api/verify-admin-path")).await;
    assert_eq!(body, json!({ "valid": false }));
}

#[tokio::test]
async fn test_direct_order_rejects_international_phone() {
    let app = lazy_app();
    let body = json!({
        "shipping_name": "Rahim Uddin",
        "phone": "+880171234567",
        "shipping_address": "House 1, Road 2, Dhanmondi",
        "delivery_area": "inside",
        "products": [{ "id": "6f1c1f0e-7d43-4a51-9a3b-1d2f3e4a5b6c", "quantity": 1 }],
    });

    let (status, body) = send(&app, post_json("/api/orders/direct", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid input.");
    assert!(body["fields"]["phone"].is_array());
}

#[tokio::test]
async fn test_direct_order_reports_every_missing_field() {
    let app = lazy_app();
    let (status, body) = send(&app, post_json("/api/orders/direct", &json!({}))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["fields"].as_object().unwrap();
    for field in ["shipping_name", "phone", "shipping_address", "delivery_area", "products"] {
        assert!(fields.contains_key(field), "missing error for {field}: {body}");
    }
}

#[tokio::test]
async fn test_cart_order_rejects_bad_email_before_touching_cart() {
    let app = lazy_app();
    let body = json!({
        "email": "not-an-email",
        "shipping_name": "Karim",
        "shipping_address": "Mirpur 10",
    });

    let (status, body) = send(&app, post_json("/api/orders", &body)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["email"].is_array());
}

#[tokio::test]
async fn test_malformed_json_uses_error_shape() {
    let app = lazy_app();
    let request = Request::post("/api/orders/direct")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Invalid input.");
    assert!(body["fields"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_initiate_checkout_accepts_empty_and_filled_bodies() {
    let app = lazy_app();
    let empty = Request::post("/api/orders/initiate-checkout")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, empty).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));

    let filled = post_json(
        "/api/orders/initiate-checkout",
        &json!({ "phone": "01712345678", "shipping_name": "Rahim Uddin" }),
    );
    let (status, body) = send(&app, filled).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "status": "ok" }));
}

#[tokio::test]
async fn test_initiate_checkout_rejects_malformed_json() {
    let app = lazy_app();
    let request = Request::post("/api/orders/initiate-checkout")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["non_field_errors"].is_array());
}

#[tokio::test]
async fn test_order_lookup_with_garbage_id_is_not_found() {
    let app = lazy_app();
    let (status, body) = send(&app, get("/api/orders/not-a-uuid?email=a@b.co")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not found." }));
}

#[tokio::test]
async fn test_my_orders_is_empty_for_anonymous() {
    let app = lazy_app();
    let (status, body) = send(&app, get("/api/orders/my")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 0);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_login_required_routes() {
    let app = lazy_app();

    for request in [
        get("/api/wishlist"),
        post_json("/api/wishlist/add", &json!({ "product_id": "x" })),
        get("/api/auth/me"),
        get("/api/admin/dashboard"),
        get("/api/admin/orders"),
        post_json("/api/admin/products", &json!({})),
    ] {
        let path = request.uri().to_string();
        let (status, body) = send(&app, request).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{path}");
        assert_eq!(
            body["detail"],
            "Authentication credentials were not provided.",
            "{path}"
        );
    }
}

#[tokio::test]
async fn test_contact_validation() {
    let app = lazy_app();
    let (status, body) = send(
        &app,
        post_json("/api/contact", &json!({ "email": "nope", "phone": "0".repeat(21) })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["fields"].as_object().unwrap();
    for field in ["name", "message", "email", "phone"] {
        assert!(fields.contains_key(field), "missing error for {field}");
    }
}

#[tokio::test]
async fn test_cors_preflight_allows_configured_origin_with_credentials() {
    let app = lazy_app();
    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/cart/add")
        .header(header::ORIGIN, "http://localhost:5173")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let headers = response.headers();
    assert_eq!(
        headers[header::ACCESS_CONTROL_ALLOW_ORIGIN],
        "http://localhost:5173"
    );
    assert_eq!(headers[header::ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");

    let request = Request::builder()
        .method(Method::OPTIONS)
        .uri("/api/cart/add")
        .header(header::ORIGIN, "https://evil.example")
        .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .is_none()
    );
}

#[tokio::test]
async fn test_unknown_route_is_404() {
    let app = lazy_app();
    let (status, body) = send(&app, get("/api/nope")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, Value::Null);
}

#[tokio::test]
async fn test_cart_line_with_non_integer_id_is_not_found() {
    let app = lazy_app();

    let request = Request::patch("/api/cart/items/abc/update")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "quantity": 2 }).to_string()))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not found." }));

    let (status, body) = send(&app, post_json("/api/cart/items/abc/remove", &json!({}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "detail": "Not found." }));
}
