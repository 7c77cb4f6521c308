//! `PostgreSQL` checkout store backed by an sqlx transaction.

use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use gadzilla_core::{CartId, OrderId, ProductId};

use super::{CheckoutStore, CheckoutTx, LineRequest, LockedProduct, NewOrder, NewOrderItem};
use crate::db::RepositoryError;
use crate::db::orders;
use crate::models::Order;

/// Opens checkout transactions on the shop database.
#[derive(Clone)]
pub struct PgCheckoutStore {
    pool: PgPool,
}

impl PgCheckoutStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl CheckoutStore for PgCheckoutStore {
    type Tx = PgCheckoutTx;

    async fn begin(&self) -> Result<PgCheckoutTx, RepositoryError> {
        Ok(PgCheckoutTx {
            tx: self.pool.begin().await?,
        })
    }
}

/// An open checkout transaction. sqlx rolls it back on drop.
pub struct PgCheckoutTx {
    tx: Transaction<'static, Postgres>,
}

#[derive(sqlx::FromRow)]
struct CartLineRow {
    product_id: ProductId,
    quantity: i32,
    size: String,
    name: String,
}

#[derive(sqlx::FromRow)]
struct LockedRow {
    id: ProductId,
    name: String,
    price: Decimal,
    stock: i32,
}

impl CheckoutTx for PgCheckoutTx {
    type Receipt = Order;

    async fn cart_lines(&mut self, cart: CartId) -> Result<Vec<LineRequest>, RepositoryError> {
        // Serializes concurrent submits of the same cart; the second one
        // sees the cart already emptied.
        sqlx::query("SELECT id FROM carts WHERE id = $1 FOR UPDATE")
            .bind(cart)
            .fetch_optional(&mut *self.tx)
            .await?;

        let rows = sqlx::query_as::<_, CartLineRow>(
            r"
            SELECT ci.product_id, ci.quantity, ci.size, p.name
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            WHERE ci.cart_id = $1
            ORDER BY ci.created_at, ci.id
            ",
        )
        .bind(cart)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LineRequest {
                product_id: r.product_id,
                quantity: r.quantity,
                size: r.size,
                name: Some(r.name),
            })
            .collect())
    }

    async fn lock_products(
        &mut self,
        ids: &[ProductId],
    ) -> Result<Vec<LockedProduct>, RepositoryError> {
        let uuids: Vec<Uuid> = ids.iter().map(ProductId::as_uuid).collect();
        let rows = sqlx::query_as::<_, LockedRow>(
            r"
            SELECT id, name, price, stock
            FROM products
            WHERE id = ANY($1)
            ORDER BY id
            FOR UPDATE
            ",
        )
        .bind(uuids)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| LockedProduct {
                id: r.id,
                name: r.name,
                price: r.price,
                stock: r.stock,
            })
            .collect())
    }

    async fn insert_order(&mut self, order: &NewOrder) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO orders (
                id, user_id, email, status, total, shipping_cost, shipping_name,
                shipping_address, phone, delivery_area, district
            )
            VALUES ($1, $2, $3, 'pending', 0, 0, $4, $5, $6, $7, $8)
            ",
        )
        .bind(order.id)
        .bind(order.user_id)
        .bind(&order.email)
        .bind(&order.shipping_name)
        .bind(&order.shipping_address)
        .bind(&order.phone)
        .bind(order.delivery_area)
        .bind(&order.district)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn insert_item(&mut self, item: &NewOrderItem) -> Result<(), RepositoryError> {
        sqlx::query(
            r"
            INSERT INTO order_items (order_id, product_id, quantity, size, price)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(item.order_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(&item.size)
        .bind(item.price)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn decrement_stock(
        &mut self,
        product: ProductId,
        quantity: i32,
    ) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE products SET stock = stock - $2, updated_at = NOW() WHERE id = $1")
            .bind(product)
            .bind(quantity)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn clear_cart(&mut self, cart: CartId) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM cart_items WHERE cart_id = $1")
            .bind(cart)
            .execute(&mut *self.tx)
            .await?;
        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart)
            .execute(&mut *self.tx)
            .await?;

        Ok(())
    }

    async fn finalize_order(
        &mut self,
        order: OrderId,
        total: Decimal,
        shipping_cost: Decimal,
    ) -> Result<(), RepositoryError> {
        sqlx::query(
            "UPDATE orders SET total = $2, shipping_cost = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(order)
        .bind(total)
        .bind(shipping_cost)
        .execute(&mut *self.tx)
        .await?;

        Ok(())
    }

    async fn load_order(&mut self, order: OrderId) -> Result<Order, RepositoryError> {
        orders::load_order(&mut *self.tx, order)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }
}
