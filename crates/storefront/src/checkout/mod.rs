//! Order placement.
//!
//! [`Checkout`] turns a cart (or a client-submitted product list) into exactly
//! one order inside a single transaction:
//!
//! 1. Lock every referenced product row, in id order.
//! 2. Check stock for every line, collecting all failures. Demand for a
//!    product listed on several lines accumulates.
//! 3. Insert the order, then each line with the product's current price as a
//!    snapshot, decrementing stock as it goes.
//! 4. Clear the cart (cart checkout) or add the delivery surcharge (direct
//!    checkout) and write the final total.
//! 5. Read the finished order back through the transaction, then commit.
//!
//! Any error before commit drops the transaction, which rolls it back.
//! The storage side is the [`CheckoutStore`] seam: [`postgres`] for the
//! application and [`memory`] for tests.

pub mod memory;
pub mod postgres;
mod validation;

use std::collections::{BTreeSet, HashMap};
use std::future::Future;

use rust_decimal::Decimal;
use thiserror::Error;
use tracing::instrument;

use gadzilla_core::{CartId, DeliveryArea, OrderId, ProductId, ShippingRates, UserId};

use crate::db::RepositoryError;

pub use validation::{
    CartCheckout, CartCheckoutRequest, DirectCheckout, DirectCheckoutRequest, ValidationErrors,
    positive_quantity,
};

/// One requested line: a product, a positive quantity and an optional size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRequest {
    pub product_id: ProductId,
    pub quantity: i32,
    /// Empty when the product has no size.
    pub size: String,
    /// Display name when already known (cart lines), used in error messages.
    pub name: Option<String>,
}

impl LineRequest {
    fn label(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.product_id.to_string())
    }
}

/// A product row held under lock for the rest of the transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockedProduct {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    pub stock: i32,
}

/// Order header written at the start of placement. The total is filled in
/// by [`CheckoutTx::finalize_order`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrder {
    pub id: OrderId,
    pub user_id: Option<UserId>,
    pub email: String,
    pub shipping_name: String,
    pub shipping_address: String,
    pub phone: String,
    pub delivery_area: Option<DeliveryArea>,
    pub district: String,
}

/// Order line with its price snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewOrderItem {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    pub size: String,
    pub price: Decimal,
}

/// Outcome of a committed checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedOrder<R> {
    pub id: OrderId,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
    pub lines: usize,
    /// The order as read inside the transaction just before commit.
    pub order: R,
}

/// What a store's checkout returns.
pub type Placed<S> = PlacedOrder<<<S as CheckoutStore>::Tx as CheckoutTx>::Receipt>;

/// Errors that can occur while placing an order.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// Malformed input, rejected before any lock was taken.
    #[error("{0}")]
    Invalid(#[from] ValidationErrors),

    /// The cart had no lines.
    #[error("cart is empty")]
    EmptyCart,

    /// Unknown products or short stock; nothing was written.
    #[error("stock validation failed: {}", .0.join("; "))]
    Stock(Vec<String>),

    /// Storage failure; the transaction was rolled back.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Opens checkout transactions.
pub trait CheckoutStore: Send + Sync {
    type Tx: CheckoutTx;

    /// Start a transaction.
    fn begin(&self) -> impl Future<Output = Result<Self::Tx, RepositoryError>> + Send;
}

/// One open checkout transaction. Dropping it without [`commit`] rolls back.
///
/// [`commit`]: CheckoutTx::commit
pub trait CheckoutTx: Send {
    /// The stored order as the store reports it back.
    type Receipt: Send;

    /// Lock the cart and read its lines in insertion order.
    fn cart_lines(
        &mut self,
        cart: CartId,
    ) -> impl Future<Output = Result<Vec<LineRequest>, RepositoryError>> + Send;

    /// Lock the given products (`FOR UPDATE`, ordered by id). Unknown ids are
    /// simply absent from the result.
    fn lock_products(
        &mut self,
        ids: &[ProductId],
    ) -> impl Future<Output = Result<Vec<LockedProduct>, RepositoryError>> + Send;

    fn insert_order(
        &mut self,
        order: &NewOrder,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    fn insert_item(
        &mut self,
        item: &NewOrderItem,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Subtract `quantity` from a locked product's stock.
    fn decrement_stock(
        &mut self,
        product: ProductId,
        quantity: i32,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Delete every line of the cart; the cart itself stays.
    fn clear_cart(
        &mut self,
        cart: CartId,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Write the computed total and shipping cost.
    fn finalize_order(
        &mut self,
        order: OrderId,
        total: Decimal,
        shipping_cost: Decimal,
    ) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    /// Read a finalized order back before commit.
    fn load_order(
        &mut self,
        order: OrderId,
    ) -> impl Future<Output = Result<Self::Receipt, RepositoryError>> + Send;

    fn commit(self) -> impl Future<Output = Result<(), RepositoryError>> + Send;
}

/// Order placement coordinator.
pub struct Checkout<'a, S> {
    store: &'a S,
    rates: ShippingRates,
}

impl<'a, S: CheckoutStore> Checkout<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, rates: ShippingRates) -> Self {
        Self { store, rates }
    }

    /// Place an order from the cart's current lines and empty the cart.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::EmptyCart` if the cart has no lines,
    /// `CheckoutError::Stock` with every unknown-product or short-stock
    /// message, or `CheckoutError::Repository` if storage fails. Nothing is
    /// persisted on error.
    #[instrument(skip(self, details), fields(cart_id = %cart))]
    pub async fn place_cart_order(
        &self,
        cart: CartId,
        user: Option<UserId>,
        details: CartCheckout,
    ) -> Result<Placed<S>, CheckoutError> {
        let mut tx = self.store.begin().await?;

        let lines = tx.cart_lines(cart).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }

        let order = NewOrder {
            id: OrderId::generate(),
            user_id: user,
            email: details.email.into_inner(),
            shipping_name: details.shipping_name,
            shipping_address: details.shipping_address,
            phone: String::new(),
            delivery_area: None,
            district: String::new(),
        };

        let placed = place(&mut tx, order, &lines, Decimal::new(0, 2), Some(cart)).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %placed.id,
            lines = placed.lines,
            total = %placed.total,
            "Cart order placed"
        );
        Ok(placed)
    }

    /// Place an order from a client-submitted product list.
    ///
    /// # Errors
    ///
    /// Returns `CheckoutError::Invalid` if the list is empty,
    /// `CheckoutError::Stock` with every unknown-product or short-stock
    /// message, or `CheckoutError::Repository` if storage fails. Nothing is
    /// persisted on error.
    #[instrument(skip(self, details), fields(area = %details.delivery_area))]
    pub async fn place_direct_order(
        &self,
        user: Option<UserId>,
        details: DirectCheckout,
    ) -> Result<Placed<S>, CheckoutError> {
        if details.lines.is_empty() {
            let errors = ValidationErrors::single("products", "At least one product is required.");
            return Err(errors.into());
        }

        let shipping_cost = self.rates.surcharge(details.delivery_area);
        let order = NewOrder {
            id: OrderId::generate(),
            user_id: user,
            email: details.email.map(|e| e.into_inner()).unwrap_or_default(),
            shipping_name: details.shipping_name,
            shipping_address: details.shipping_address,
            phone: details.phone.into_inner(),
            delivery_area: Some(details.delivery_area),
            district: details.district,
        };

        let mut tx = self.store.begin().await?;
        let placed = place(&mut tx, order, &details.lines, shipping_cost, None).await?;
        tx.commit().await?;

        tracing::info!(
            order_id = %placed.id,
            lines = placed.lines,
            total = %placed.total,
            "Direct order placed"
        );
        Ok(placed)
    }
}

/// Steps 1-5 shared by both variants, short of the commit.
async fn place<T: CheckoutTx>(
    tx: &mut T,
    order: NewOrder,
    lines: &[LineRequest],
    shipping_cost: Decimal,
    cart: Option<CartId>,
) -> Result<PlacedOrder<T::Receipt>, CheckoutError> {
    let ids: Vec<ProductId> = lines
        .iter()
        .map(|l| l.product_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let products: HashMap<ProductId, LockedProduct> = tx
        .lock_products(&ids)
        .await?
        .into_iter()
        .map(|p| (p.id, p))
        .collect();

    check_stock(lines, &products).map_err(CheckoutError::Stock)?;

    tx.insert_order(&order).await?;

    let mut subtotal = Decimal::new(0, 2);
    for line in lines {
        let product = products.get(&line.product_id).ok_or_else(|| {
            RepositoryError::DataCorruption(format!("product {} not locked", line.product_id))
        })?;

        tx.insert_item(&NewOrderItem {
            order_id: order.id,
            product_id: product.id,
            quantity: line.quantity,
            size: line.size.clone(),
            price: product.price,
        })
        .await?;
        tx.decrement_stock(product.id, line.quantity).await?;

        subtotal += product.price * Decimal::from(line.quantity);
    }

    if let Some(cart) = cart {
        tx.clear_cart(cart).await?;
    }

    let total = subtotal + shipping_cost;
    tx.finalize_order(order.id, total, shipping_cost).await?;
    let receipt = tx.load_order(order.id).await?;

    Ok(PlacedOrder {
        id: order.id,
        subtotal,
        shipping_cost,
        total,
        lines: lines.len(),
        order: receipt,
    })
}

/// Verify every line against the locked stock.
///
/// Returns all messages, in line order, when any line fails.
fn check_stock(
    lines: &[LineRequest],
    products: &HashMap<ProductId, LockedProduct>,
) -> Result<(), Vec<String>> {
    let mut remaining: HashMap<ProductId, i32> =
        products.values().map(|p| (p.id, p.stock)).collect();
    let mut errors = Vec::new();

    for line in lines {
        let (Some(product), Some(available)) = (
            products.get(&line.product_id),
            remaining.get_mut(&line.product_id),
        ) else {
            errors.push(format!("Product {} not found.", line.label()));
            continue;
        };

        if *available < line.quantity {
            errors.push(format!(
                "Insufficient stock for {}. Available: {}, Requested: {}",
                product.name, available, line.quantity
            ));
        } else {
            *available -= line.quantity;
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use gadzilla_core::{Email, Phone};

    use super::memory::{FailPoint, MemoryCheckoutStore};
    use super::*;

    fn product(name: &str, price: i64, stock: i32) -> LockedProduct {
        LockedProduct {
            id: ProductId::generate(),
            name: name.to_owned(),
            price: Decimal::new(price, 2),
            stock,
        }
    }

    fn line(product: &LockedProduct, quantity: i32) -> LineRequest {
        LineRequest {
            product_id: product.id,
            quantity,
            size: String::new(),
            name: None,
        }
    }

    fn cart_details() -> CartCheckout {
        CartCheckout {
            email: Email::parse("buyer@example.com").unwrap(),
            shipping_name: "Rahim".to_owned(),
            shipping_address: "Dhanmondi".to_owned(),
        }
    }

    fn direct_details(lines: Vec<LineRequest>) -> DirectCheckout {
        DirectCheckout {
            shipping_name: "Karim".to_owned(),
            phone: Phone::parse("01712345678").unwrap(),
            email: None,
            shipping_address: "Mirpur 10".to_owned(),
            district: "Dhaka".to_owned(),
            delivery_area: DeliveryArea::Inside,
            lines,
        }
    }

    #[test]
    fn test_check_stock_collects_every_error() {
        let a = product("Cable", 500, 1);
        let b = product("Charger", 900, 5);
        let missing = LineRequest {
            product_id: ProductId::generate(),
            quantity: 1,
            size: String::new(),
            name: Some("Ghost".to_owned()),
        };
        let products = HashMap::from([(a.id, a.clone()), (b.id, b.clone())]);

        let errors = check_stock(&[line(&a, 2), missing, line(&b, 5)], &products).unwrap_err();

        assert_eq!(
            errors,
            vec![
                "Insufficient stock for Cable. Available: 1, Requested: 2".to_owned(),
                "Product Ghost not found.".to_owned(),
            ]
        );
    }

    #[test]
    fn test_check_stock_accumulates_duplicate_lines() {
        let a = product("Cable", 500, 3);
        let products = HashMap::from([(a.id, a.clone())]);

        assert!(check_stock(&[line(&a, 2), line(&a, 1)], &products).is_ok());
        let errors = check_stock(&[line(&a, 2), line(&a, 2)], &products).unwrap_err();
        assert_eq!(
            errors,
            vec!["Insufficient stock for Cable. Available: 1, Requested: 2".to_owned()]
        );
    }

    #[tokio::test]
    async fn test_cart_order_totals_and_clears_cart() {
        let a = product("Cable", 1000, 10);
        let b = product("Sticker", 250, 10);
        let store = MemoryCheckoutStore::new();
        store.insert_product(a.clone()).await;
        store.insert_product(b.clone()).await;
        let cart = CartId::new(1);
        store.set_cart(cart, vec![line(&a, 2), line(&b, 2)]).await;

        let placed = Checkout::new(&store, ShippingRates::default())
            .place_cart_order(cart, None, cart_details())
            .await
            .unwrap();

        assert_eq!(placed.total.to_string(), "25.00");
        assert_eq!(placed.shipping_cost, Decimal::ZERO);
        let state = store.snapshot().await;
        assert!(state.cart(cart).is_empty());
        assert_eq!(state.stock(a.id), Some(8));
        assert_eq!(state.stock(b.id), Some(8));
        assert_eq!(state.orders.len(), 1);
        assert_eq!(state.orders[0].items.len(), 2);
        assert_eq!(state.orders[0].order.delivery_area, None);
        assert_eq!(placed.order, state.orders[0]);
    }

    #[tokio::test]
    async fn test_cart_accepts_new_lines_after_checkout() {
        let a = product("Cable", 1000, 5);
        let store = MemoryCheckoutStore::new();
        store.insert_product(a.clone()).await;
        let cart = CartId::new(1);
        store.set_cart(cart, vec![line(&a, 1)]).await;
        let checkout = Checkout::new(&store, ShippingRates::default());

        checkout
            .place_cart_order(cart, None, cart_details())
            .await
            .unwrap();
        let state = store.snapshot().await;
        assert!(state.carts.contains_key(&cart));
        assert!(state.cart(cart).is_empty());

        store.set_cart(cart, vec![line(&a, 2)]).await;
        let second = checkout
            .place_cart_order(cart, None, cart_details())
            .await
            .unwrap();

        assert_eq!(second.order.items[0].quantity, 2);
        let state = store.snapshot().await;
        assert_eq!(state.orders.len(), 2);
        assert_eq!(state.stock(a.id), Some(2));
    }

    #[tokio::test]
    async fn test_read_back_failure_commits_nothing() {
        let a = product("Cable", 1000, 5);
        let store = MemoryCheckoutStore::new().fail_at(FailPoint::LoadOrder);
        store.insert_product(a.clone()).await;

        let err = Checkout::new(&store, ShippingRates::default())
            .place_direct_order(None, direct_details(vec![line(&a, 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Repository(_)));
        let state = store.snapshot().await;
        assert_eq!(state.stock(a.id), Some(5));
        assert!(state.orders.is_empty());
    }

    #[tokio::test]
    async fn test_direct_order_adds_inside_surcharge() {
        let a = product("Earbuds", 10_000, 3);
        let store = MemoryCheckoutStore::new();
        store.insert_product(a.clone()).await;

        let placed = Checkout::new(&store, ShippingRates::default())
            .place_direct_order(None, direct_details(vec![line(&a, 1)]))
            .await
            .unwrap();

        assert_eq!(placed.total.to_string(), "140.00");
        assert_eq!(placed.shipping_cost.to_string(), "40.00");
        let state = store.snapshot().await;
        assert_eq!(state.stock(a.id), Some(2));
        let stored = &state.orders[0];
        assert_eq!(stored.order.phone, "01712345678");
        assert_eq!(stored.total, placed.total);
        assert_eq!(stored.shipping_cost, placed.shipping_cost);
        assert_eq!(placed.order.total, placed.total);
    }

    #[tokio::test]
    async fn test_empty_cart_writes_nothing() {
        let store = MemoryCheckoutStore::new();
        let err = Checkout::new(&store, ShippingRates::default())
            .place_cart_order(CartId::new(7), None, cart_details())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::EmptyCart));
        assert!(store.snapshot().await.orders.is_empty());
    }

    #[tokio::test]
    async fn test_stock_failure_is_all_or_nothing() {
        let a = product("Cable", 1000, 5);
        let b = product("Charger", 2000, 1);
        let store = MemoryCheckoutStore::new();
        store.insert_product(a.clone()).await;
        store.insert_product(b.clone()).await;

        let err = Checkout::new(&store, ShippingRates::default())
            .place_direct_order(None, direct_details(vec![line(&a, 2), line(&b, 2)]))
            .await
            .unwrap_err();

        let CheckoutError::Stock(errors) = err else {
            panic!("expected stock error, got {err:?}");
        };
        assert_eq!(errors.len(), 1);
        let state = store.snapshot().await;
        assert_eq!(state.stock(a.id), Some(5));
        assert_eq!(state.stock(b.id), Some(1));
        assert!(state.orders.is_empty());
    }

    #[tokio::test]
    async fn test_failure_after_writes_rolls_back() {
        let a = product("Cable", 1000, 5);
        let store = MemoryCheckoutStore::new().fail_at(FailPoint::Finalize);
        store.insert_product(a.clone()).await;
        let cart = CartId::new(1);
        store.set_cart(cart, vec![line(&a, 2)]).await;

        let err = Checkout::new(&store, ShippingRates::default())
            .place_cart_order(cart, None, cart_details())
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Repository(_)));
        let state = store.snapshot().await;
        assert_eq!(state.stock(a.id), Some(5));
        assert_eq!(state.cart(cart).len(), 1);
        assert!(state.orders.is_empty());
    }

    #[tokio::test]
    async fn test_price_snapshot_survives_price_change() {
        let a = product("Cable", 1000, 5);
        let store = MemoryCheckoutStore::new();
        store.insert_product(a.clone()).await;

        Checkout::new(&store, ShippingRates::default())
            .place_direct_order(None, direct_details(vec![line(&a, 1)]))
            .await
            .unwrap();
        store.set_price(a.id, Decimal::new(9999, 2)).await;

        let state = store.snapshot().await;
        assert_eq!(state.orders[0].items[0].price, Decimal::new(1000, 2));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_checkouts_never_oversell() {
        let a = product("Last unit", 5000, 1);
        let store = Arc::new(MemoryCheckoutStore::new());
        store.insert_product(a.clone()).await;

        let mut handles = Vec::new();
        for _ in 0..8 {
            let store = Arc::clone(&store);
            let lines = vec![line(&a, 1)];
            handles.push(tokio::spawn(async move {
                Checkout::new(store.as_ref(), ShippingRates::default())
                    .place_direct_order(None, direct_details(lines))
                    .await
            }));
        }

        let mut placed = 0;
        let mut rejected = Vec::new();
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => placed += 1,
                Err(CheckoutError::Stock(errors)) => rejected.extend(errors),
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!(placed, 1);
        assert_eq!(rejected.len(), 7);
        assert!(
            rejected
                .iter()
                .all(|e| e == "Insufficient stock for Last unit. Available: 0, Requested: 1")
        );
        assert_eq!(store.snapshot().await.stock(a.id), Some(0));
    }
}
