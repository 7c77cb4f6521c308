//! In-memory checkout store.
//!
//! One mutex guards the whole state and is held for the lifetime of a
//! transaction, so checkouts serialize the way row locks serialize them in
//! `PostgreSQL`. A transaction edits a private copy that replaces the shared
//! state only on commit; dropping it discards the copy.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use gadzilla_core::{CartId, OrderId, ProductId};

use super::{CheckoutStore, CheckoutTx, LineRequest, LockedProduct, NewOrder, NewOrderItem};
use crate::db::RepositoryError;

/// A stored order with its lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredOrder {
    pub order: NewOrder,
    pub items: Vec<NewOrderItem>,
    pub total: Decimal,
    pub shipping_cost: Decimal,
}

/// Everything the in-memory store holds.
#[derive(Debug, Clone, Default)]
pub struct MemoryState {
    pub products: BTreeMap<ProductId, LockedProduct>,
    pub carts: HashMap<CartId, Vec<LineRequest>>,
    pub orders: Vec<StoredOrder>,
}

impl MemoryState {
    #[must_use]
    pub fn stock(&self, product: ProductId) -> Option<i32> {
        self.products.get(&product).map(|p| p.stock)
    }

    #[must_use]
    pub fn cart(&self, cart: CartId) -> &[LineRequest] {
        self.carts.get(&cart).map_or(&[], Vec::as_slice)
    }

    fn order_mut(&mut self, id: OrderId) -> Result<&mut StoredOrder, RepositoryError> {
        self.orders
            .iter_mut()
            .find(|o| o.order.id == id)
            .ok_or(RepositoryError::NotFound)
    }
}

/// Step at which a transaction reports a storage failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailPoint {
    InsertOrder,
    InsertItem,
    DecrementStock,
    ClearCart,
    Finalize,
    LoadOrder,
    Commit,
}

/// Mutex-serialized checkout store.
#[derive(Debug, Clone, Default)]
pub struct MemoryCheckoutStore {
    state: Arc<Mutex<MemoryState>>,
    fail_at: Option<FailPoint>,
}

impl MemoryCheckoutStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every transaction fail at `point`.
    #[must_use]
    pub const fn fail_at(mut self, point: FailPoint) -> Self {
        self.fail_at = Some(point);
        self
    }

    pub async fn insert_product(&self, product: LockedProduct) {
        self.state.lock().await.products.insert(product.id, product);
    }

    /// Change a product's current price.
    pub async fn set_price(&self, product: ProductId, price: Decimal) {
        if let Some(p) = self.state.lock().await.products.get_mut(&product) {
            p.price = price;
        }
    }

    pub async fn set_cart(&self, cart: CartId, lines: Vec<LineRequest>) {
        self.state.lock().await.carts.insert(cart, lines);
    }

    /// Copy of the committed state.
    pub async fn snapshot(&self) -> MemoryState {
        self.state.lock().await.clone()
    }
}

impl CheckoutStore for MemoryCheckoutStore {
    type Tx = MemoryCheckoutTx;

    async fn begin(&self) -> Result<MemoryCheckoutTx, RepositoryError> {
        let guard = Arc::clone(&self.state).lock_owned().await;
        let working = guard.clone();
        Ok(MemoryCheckoutTx {
            guard,
            working,
            fail_at: self.fail_at,
        })
    }
}

/// An open in-memory transaction holding the store lock.
pub struct MemoryCheckoutTx {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
    fail_at: Option<FailPoint>,
}

impl MemoryCheckoutTx {
    fn check(&self, point: FailPoint) -> Result<(), RepositoryError> {
        if self.fail_at == Some(point) {
            return Err(RepositoryError::Database(sqlx::Error::Protocol(format!(
                "injected failure at {point:?}"
            ))));
        }
        Ok(())
    }
}

impl CheckoutTx for MemoryCheckoutTx {
    type Receipt = StoredOrder;

    async fn cart_lines(&mut self, cart: CartId) -> Result<Vec<LineRequest>, RepositoryError> {
        Ok(self.working.cart(cart).to_vec())
    }

    async fn lock_products(
        &mut self,
        ids: &[ProductId],
    ) -> Result<Vec<LockedProduct>, RepositoryError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.working.products.get(id).cloned())
            .collect())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<(), RepositoryError> {
        self.check(FailPoint::InsertOrder)?;
        self.working.orders.push(StoredOrder {
            order: order.clone(),
            items: Vec::new(),
            total: Decimal::ZERO,
            shipping_cost: Decimal::ZERO,
        });
        Ok(())
    }

    async fn insert_item(&mut self, item: &NewOrderItem) -> Result<(), RepositoryError> {
        self.check(FailPoint::InsertItem)?;
        self.working.order_mut(item.order_id)?.items.push(item.clone());
        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        self.check(FailPoint::DecrementStock)?;
        let product = self
            .working
            .products
            .get_mut(&product)
            .ok_or(RepositoryError::NotFound)?;
        if product.stock < quantity {
            return Err(RepositoryError::Conflict(format!(
                "stock of {} would go negative",
                product.id
            )));
        }
        product.stock -= quantity;
        Ok(())
    }

    async fn clear_cart(&mut self, cart: CartId) -> Result<(), RepositoryError> {
        self.check(FailPoint::ClearCart)?;
        if let Some(lines) = self.working.carts.get_mut(&cart) {
            lines.clear();
        }
        Ok(())
    }

    async fn finalize_order(
        &mut self,
        order: OrderId,
        total: Decimal,
        shipping_cost: Decimal,
    ) -> Result<(), RepositoryError> {
        self.check(FailPoint::Finalize)?;
        let stored = self.working.order_mut(order)?;
        stored.total = total;
        stored.shipping_cost = shipping_cost;
        Ok(())
    }

    async fn load_order(&mut self, order: OrderId) -> Result<StoredOrder, RepositoryError> {
        self.check(FailPoint::LoadOrder)?;
        self.working.order_mut(order).cloned()
    }

    async fn commit(mut self) -> Result<(), RepositoryError> {
        self.check(FailPoint::Commit)?;
        *self.guard = self.working;
        Ok(())
    }
}
