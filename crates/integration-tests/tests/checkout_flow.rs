//! Checkout from raw request bodies down to the in-memory store.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;

use gadzilla_core::{CartId, ProductId, ShippingRates};
use gadzilla_storefront::checkout::memory::MemoryCheckoutStore;
use gadzilla_storefront::checkout::{
    CartCheckoutRequest, Checkout, CheckoutError, DirectCheckoutRequest, LineRequest,
    LockedProduct,
};

fn money(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Store holding the given `(name, price in cents, stock)` products.
async fn store_with(products: &[(&str, i64, i32)]) -> (MemoryCheckoutStore, Vec<ProductId>) {
    let store = MemoryCheckoutStore::new();
    let mut ids = Vec::new();
    for &(name, price, stock) in products {
        let id = ProductId::generate();
        store
            .insert_product(LockedProduct {
                id,
                name: name.to_owned(),
                price: money(price),
                stock,
            })
            .await;
        ids.push(id);
    }
    (store, ids)
}

fn direct_body(area: &str, products: serde_json::Value) -> DirectCheckoutRequest {
    serde_json::from_value(json!({
        "shipping_name": "  Rahim Uddin ",
        "phone": "01712345678",
        "shipping_address": "House 1, Road 2, Dhanmondi",
        "district": "Dhaka",
        "delivery_area": area,
        "products": products,
    }))
    .unwrap()
}

#[tokio::test]
async fn test_cart_checkout_from_request_body() {
    let (store, ids) = store_with(&[("Pixel Buds", 1000, 5), ("Cable", 500, 10)]).await;
    let cart = CartId::new(1);
    store
        .set_cart(
            cart,
            vec![
                LineRequest {
                    product_id: ids[0],
                    quantity: 2,
                    size: String::new(),
                    name: Some("Pixel Buds".to_owned()),
                },
                LineRequest {
                    product_id: ids[1],
                    quantity: 1,
                    size: "1m".to_owned(),
                    name: Some("Cable".to_owned()),
                },
            ],
        )
        .await;

    let request: CartCheckoutRequest = serde_json::from_value(json!({
        "email": " Buyer@Example.com ",
        "shipping_name": "Karim",
        "shipping_address": "Mirpur 10",
    }))
    .unwrap();
    let details = request.validate().unwrap();

    let placed = Checkout::new(&store, ShippingRates::default())
        .place_cart_order(cart, None, details)
        .await
        .unwrap();

    assert_eq!(placed.total, money(2500));
    assert_eq!(placed.shipping_cost, Decimal::ZERO);

    let state = store.snapshot().await;
    assert!(state.cart(cart).is_empty());
    assert_eq!(state.stock(ids[0]), Some(3));
    assert_eq!(state.stock(ids[1]), Some(9));

    let stored = &state.orders[0];
    assert_eq!(stored.order.phone, "");
    assert_eq!(stored.order.delivery_area, None);
    assert_eq!(stored.items[1].size, "1m");
}

#[tokio::test]
async fn test_direct_checkout_from_request_body() {
    let (store, ids) = store_with(&[("Smart Watch", 10000, 3)]).await;
    let details = direct_body("inside", json!([{ "id": ids[0], "quantity": "1" }]))
        .validate()
        .unwrap();

    let placed = Checkout::new(&store, ShippingRates::default())
        .place_direct_order(None, details)
        .await
        .unwrap();

    assert_eq!(placed.subtotal, money(10000));
    assert_eq!(placed.shipping_cost, money(4000));
    assert_eq!(placed.total, money(14000));

    let state = store.snapshot().await;
    let stored = &state.orders[0];
    assert_eq!(stored.order.shipping_name, "Rahim Uddin");
    assert_eq!(stored.order.phone, "01712345678");
    assert_eq!(stored.order.email, "");
    assert_eq!(stored.total, money(14000));
}

#[tokio::test]
async fn test_outside_dhaka_uses_configured_rate() {
    let (store, ids) = store_with(&[("Smart Watch", 10000, 3)]).await;
    let rates = ShippingRates {
        inside: money(6000),
        outside: money(12000),
    };
    let details = direct_body("outside", json!([{ "id": ids[0], "quantity": 2 }]))
        .validate()
        .unwrap();

    let placed = Checkout::new(&store, rates)
        .place_direct_order(None, details)
        .await
        .unwrap();

    assert_eq!(placed.total, money(32000));
}

#[tokio::test]
async fn test_direct_checkout_reports_every_stock_problem() {
    let (store, ids) = store_with(&[("Pixel Buds", 1000, 1), ("Cable", 500, 4)]).await;
    let missing = ProductId::generate();
    let details = direct_body(
        "inside",
        json!([
            { "id": ids[0], "quantity": 2 },
            { "id": missing, "quantity": 1 },
            { "id": ids[1], "quantity": 3 },
            { "id": ids[1], "quantity": 3 },
        ]),
    )
    .validate()
    .unwrap();

    let err = Checkout::new(&store, ShippingRates::default())
        .place_direct_order(None, details)
        .await
        .unwrap_err();

    let CheckoutError::Stock(messages) = err else {
        panic!("expected stock error, got {err:?}");
    };
    assert_eq!(
        messages,
        vec![
            "Insufficient stock for Pixel Buds. Available: 1, Requested: 2".to_owned(),
            format!("Product {missing} not found."),
            "Insufficient stock for Cable. Available: 1, Requested: 3".to_owned(),
        ]
    );

    let state = store.snapshot().await;
    assert!(state.orders.is_empty());
    assert_eq!(state.stock(ids[0]), Some(1));
    assert_eq!(state.stock(ids[1]), Some(4));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallel_direct_orders_sell_exactly_the_stock() {
    let (store, ids) = store_with(&[("Power Bank", 2500, 4)]).await;
    let store = Arc::new(store);
    let product = ids[0];

    let handles: Vec<_> = (0..10)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let details = direct_body("outside", json!([{ "id": product, "quantity": 1 }]))
                    .validate()
                    .unwrap();
                Checkout::new(store.as_ref(), ShippingRates::default())
                    .place_direct_order(None, details)
                    .await
                    .is_ok()
            })
        })
        .collect();

    let mut placed = 0;
    for handle in handles {
        if handle.await.unwrap() {
            placed += 1;
        }
    }

    let state = store.snapshot().await;
    assert_eq!(placed, 4);
    assert_eq!(state.orders.len(), 4);
    assert_eq!(state.stock(product), Some(0));
}
