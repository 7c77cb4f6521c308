//! Cart repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gadzilla_core::{CartId, CartItemId, ProductId, UserId};

use super::RepositoryError;
use super::products::{ProductRow, product_columns, product_joins};
use crate::models::{Cart, CartItem, Product};

#[derive(sqlx::FromRow)]
struct CartRow {
    id: CartId,
    user_id: Option<UserId>,
    session_key: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CartRow> for Cart {
    fn from(r: CartRow) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            session_key: r.session_key,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CartItemRow {
    item_id: CartItemId,
    cart_id: CartId,
    quantity: i32,
    size: String,
    item_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: ProductRow,
}

impl From<CartItemRow> for CartItem {
    fn from(r: CartItemRow) -> Self {
        Self {
            id: r.item_id,
            cart_id: r.cart_id,
            product: Product::from(r.product),
            quantity: r.quantity,
            size: r.size,
            created_at: r.item_created_at,
        }
    }
}

const CART_ITEM_SELECT: &str = concat!(
    "SELECT ci.id AS item_id, ci.cart_id, ci.quantity, ci.size, ci.created_at AS item_created_at, ",
    product_columns!(),
    " FROM cart_items ci JOIN products p ON p.id = ci.product_id ",
    product_joins!()
);

/// Who a cart belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartOwner {
    User(UserId),
    /// Anonymous cart keyed by the token stored in the session.
    Session(String),
}

/// Repository for carts and their line items.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Fetch the owner's cart, creating it on first use.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_or_create(&self, owner: &CartOwner) -> Result<Cart, RepositoryError> {
        let row = match owner {
            CartOwner::User(user_id) => {
                sqlx::query_as::<_, CartRow>(
                    r"
                    INSERT INTO carts (user_id) VALUES ($1)
                    ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id
                    RETURNING id, user_id, session_key, created_at, updated_at
                    ",
                )
                .bind(user_id)
                .fetch_one(self.pool)
                .await?
            }
            CartOwner::Session(key) => {
                sqlx::query_as::<_, CartRow>(
                    r"
                    INSERT INTO carts (session_key) VALUES ($1)
                    ON CONFLICT (session_key) DO UPDATE SET session_key = EXCLUDED.session_key
                    RETURNING id, user_id, session_key, created_at, updated_at
                    ",
                )
                .bind(key)
                .fetch_one(self.pool)
                .await?
            }
        };

        Ok(row.into())
    }

    /// Line items with their products, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, cart_id: CartId) -> Result<Vec<CartItem>, RepositoryError> {
        let sql = format!("{CART_ITEM_SELECT} WHERE ci.cart_id = $1 ORDER BY ci.created_at, ci.id");
        let rows = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(cart_id)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(CartItem::from).collect())
    }

    /// Set the quantity of the (product, size) line, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    /// Returns `RepositoryError::NotFound` if the line vanished concurrently.
    pub async fn set_item(
        &self,
        cart_id: CartId,
        product_id: ProductId,
        quantity: i32,
        size: &str,
    ) -> Result<CartItem, RepositoryError> {
        let item_id: CartItemId = sqlx::query_scalar(
            r"
            INSERT INTO cart_items (cart_id, product_id, quantity, size)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (cart_id, product_id, size) DO UPDATE
            SET quantity = EXCLUDED.quantity, updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(cart_id)
        .bind(product_id)
        .bind(quantity)
        .bind(size)
        .fetch_one(self.pool)
        .await?;

        self.touch(cart_id).await?;
        self.item(cart_id, item_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// A single line of this cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<Option<CartItem>, RepositoryError> {
        let sql = format!("{CART_ITEM_SELECT} WHERE ci.cart_id = $1 AND ci.id = $2");
        let row = sqlx::query_as::<_, CartItemRow>(&sql)
            .bind(cart_id)
            .bind(item_id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(CartItem::from))
    }

    /// Change a line's quantity. Lines of other carts are never touched.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the line is not in this cart.
    pub async fn update_quantity(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
        quantity: i32,
    ) -> Result<CartItem, RepositoryError> {
        let result = sqlx::query(
            "UPDATE cart_items SET quantity = $3, updated_at = NOW() WHERE cart_id = $1 AND id = $2",
        )
        .bind(cart_id)
        .bind(item_id)
        .bind(quantity)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.touch(cart_id).await?;
        self.item(cart_id, item_id)
            .await?
            .ok_or(RepositoryError::NotFound)
    }

    /// Remove a line. Returns whether a row was deleted.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove_item(
        &self,
        cart_id: CartId,
        item_id: CartItemId,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart_items WHERE cart_id = $1 AND id = $2")
            .bind(cart_id)
            .bind(item_id)
            .execute(self.pool)
            .await?;

        if result.rows_affected() > 0 {
            self.touch(cart_id).await?;
        }
        Ok(result.rows_affected() > 0)
    }

    async fn touch(&self, cart_id: CartId) -> Result<(), RepositoryError> {
        sqlx::query("UPDATE carts SET updated_at = NOW() WHERE id = $1")
            .bind(cart_id)
            .execute(self.pool)
            .await?;
        Ok(())
    }
}
