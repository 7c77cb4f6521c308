//! Checkout against a real database.
//!
//! Skipped unless `TEST_DATABASE_URL` points at a scratch database.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use std::sync::Arc;

use rust_decimal::Decimal;
use serde_json::json;
use sqlx::PgPool;
use uuid::Uuid;

use gadzilla_core::{Email, ProductId, ShippingRates};
use gadzilla_storefront::checkout::postgres::PgCheckoutStore;
use gadzilla_storefront::checkout::{
    CartCheckout, Checkout, CheckoutError, DirectCheckoutRequest,
};
use gadzilla_storefront::db::carts::{CartOwner, CartRepository};
use gadzilla_storefront::db::orders::OrderRepository;
use gadzilla_storefront::db::products::{ProductRepository, ProductWrite};
use gadzilla_integration_tests::test_database;

async fn create_product(pool: &PgPool, name: &str, price: Decimal, stock: i32) -> ProductId {
    let suffix = Uuid::new_v4().simple().to_string();
    ProductRepository::new(pool)
        .create(&ProductWrite {
            name: name.to_owned(),
            brand: "Gadzilla".to_owned(),
            slug: format!("test-{suffix}"),
            price,
            original_price: None,
            image: None,
            badge: None,
            category_id: None,
            sub_category_id: None,
            description: String::new(),
            is_featured: false,
            is_active: true,
            stock,
        })
        .await
        .unwrap()
}

async fn stock_of(pool: &PgPool, id: ProductId) -> i32 {
    ProductRepository::new(pool)
        .get(id)
        .await
        .unwrap()
        .unwrap()
        .stock
}

fn buyer() -> CartCheckout {
    CartCheckout {
        email: Email::parse("buyer@example.com").unwrap(),
        shipping_name: "Karim".to_owned(),
        shipping_address: "Mirpur 10".to_owned(),
    }
}

#[tokio::test]
async fn test_cart_order_commits_everything() {
    let Some(pool) = test_database().await else {
        return;
    };
    let buds = create_product(&pool, "Pixel Buds", Decimal::new(1000, 2), 5).await;
    let cable = create_product(&pool, "Cable", Decimal::new(500, 2), 10).await;

    let carts = CartRepository::new(&pool);
    let owner = CartOwner::Session(Uuid::new_v4().to_string());
    let cart = carts.get_or_create(&owner).await.unwrap();
    carts.set_item(cart.id, buds, 2, "").await.unwrap();
    carts.set_item(cart.id, cable, 1, "").await.unwrap();

    let store = PgCheckoutStore::new(pool.clone());
    let placed = Checkout::new(&store, ShippingRates::default())
        .place_cart_order(cart.id, None, buyer())
        .await
        .unwrap();
    assert_eq!(placed.order.id, placed.id);
    assert_eq!(placed.order.total, Decimal::new(2500, 2));
    assert_eq!(placed.order.items.len(), 2);

    assert_eq!(placed.total, Decimal::new(2500, 2));
    assert!(carts.items(cart.id).await.unwrap().is_empty());
    assert_eq!(stock_of(&pool, buds).await, 3);
    assert_eq!(stock_of(&pool, cable).await, 9);

    let order = OrderRepository::new(&pool)
        .get(placed.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(order.total, Decimal::new(2500, 2));
    assert_eq!(order.shipping_cost, Decimal::ZERO);
    assert_eq!(order.delivery_area, None);
    assert_eq!(order.items.len(), 2);

    // The emptied cart is still the owner's cart and takes new lines.
    let again = carts.get_or_create(&owner).await.unwrap();
    assert_eq!(again.id, cart.id);
    carts.set_item(again.id, cable, 1, "").await.unwrap();
    assert_eq!(carts.items(again.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_short_stock_rolls_back_cart_order() {
    let Some(pool) = test_database().await else {
        return;
    };
    let buds = create_product(&pool, "Pixel Buds", Decimal::new(1000, 2), 1).await;
    let cable = create_product(&pool, "Cable", Decimal::new(500, 2), 10).await;

    let carts = CartRepository::new(&pool);
    let cart = carts
        .get_or_create(&CartOwner::Session(Uuid::new_v4().to_string()))
        .await
        .unwrap();
    carts.set_item(cart.id, cable, 1, "").await.unwrap();
    carts.set_item(cart.id, buds, 2, "").await.unwrap();

    let store = PgCheckoutStore::new(pool.clone());
    let err = Checkout::new(&store, ShippingRates::default())
        .place_cart_order(cart.id, None, buyer())
        .await
        .unwrap_err();

    let CheckoutError::Stock(messages) = err else {
        panic!("expected stock error, got {err:?}");
    };
    assert_eq!(
        messages,
        vec!["Insufficient stock for Pixel Buds. Available: 1, Requested: 2".to_owned()]
    );
    assert_eq!(carts.items(cart.id).await.unwrap().len(), 2);
    assert_eq!(stock_of(&pool, buds).await, 1);
    assert_eq!(stock_of(&pool, cable).await, 10);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_direct_orders_conserve_stock() {
    let Some(pool) = test_database().await else {
        return;
    };
    let bank = create_product(&pool, "Power Bank", Decimal::new(2500, 2), 3).await;
    let store = Arc::new(PgCheckoutStore::new(pool.clone()));

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let store = Arc::clone(&store);
            tokio::spawn(async move {
                let request: DirectCheckoutRequest = serde_json::from_value(json!({
                    "shipping_name": "Rahim Uddin",
                    "phone": "01712345678",
                    "shipping_address": "House 1, Road 2",
                    "delivery_area": "outside",
                    "products": [{ "id": bank, "quantity": 1 }],
                }))
                .unwrap();
                Checkout::new(store.as_ref(), ShippingRates::default())
                    .place_direct_order(None, request.validate().unwrap())
                    .await
            })
        })
        .collect();

    let mut placed = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(order) => placed.push(order),
            Err(CheckoutError::Stock(_)) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(placed.len(), 3);
    assert_eq!(stock_of(&pool, bank).await, 0);
    for order in placed {
        assert_eq!(order.total, Decimal::new(17500, 2));
    }
}
