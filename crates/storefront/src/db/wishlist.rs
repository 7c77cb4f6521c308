//! Wishlist repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gadzilla_core::{ProductId, UserId, WishlistItemId};

use super::RepositoryError;
use super::products::{ProductRow, product_columns, product_joins};
use crate::models::Product;

/// A saved product.
#[derive(Debug, Clone)]
pub struct WishlistEntry {
    pub id: WishlistItemId,
    pub product: Product,
    pub created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct WishlistRow {
    item_id: WishlistItemId,
    item_created_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: ProductRow,
}

/// Repository for per-user wishlists.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// The user's saved products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<WishlistEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, WishlistRow>(concat!(
            "SELECT w.id AS item_id, w.created_at AS item_created_at, ",
            product_columns!(),
            " FROM wishlist_items w JOIN products p ON p.id = w.product_id ",
            product_joins!(),
            " WHERE w.user_id = $1 ORDER BY w.created_at DESC, w.id DESC"
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|r| WishlistEntry {
                id: r.item_id,
                product: Product::from(r.product),
                created_at: r.item_created_at,
            })
            .collect())
    }

    /// Save a product. Returns `true` if it was not saved before.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn add(&self, user_id: UserId, product_id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO wishlist_items (user_id, product_id) VALUES ($1, $2)
            ON CONFLICT (user_id, product_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(product_id)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Forget a product. Returns whether it was saved.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<bool, RepositoryError> {
        let result =
            sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_id = $2")
                .bind(user_id)
                .bind(product_id)
                .execute(self.pool)
                .await?;

        Ok(result.rows_affected() > 0)
    }
}
