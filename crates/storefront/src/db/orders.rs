//! Order repository (reads and staff edits).
//!
//! Orders are written only by the checkout transaction in
//! [`crate::checkout::postgres`].

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use gadzilla_core::{DeliveryArea, OrderId, OrderItemId, OrderStatus, UserId};

use super::RepositoryError;
use super::products::{ProductRow, like_pattern, product_columns, product_joins};
use crate::models::{Order, OrderItem, PageQuery, Product};

#[derive(sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: Option<UserId>,
    email: String,
    status: OrderStatus,
    total: Decimal,
    shipping_cost: Decimal,
    shipping_name: String,
    shipping_address: String,
    phone: String,
    delivery_area: Option<DeliveryArea>,
    district: String,
    tracking_number: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl OrderRow {
    fn into_order(self, items: Vec<OrderItem>) -> Order {
        Order {
            id: self.id,
            user_id: self.user_id,
            email: self.email,
            status: self.status,
            total: self.total,
            shipping_cost: self.shipping_cost,
            shipping_name: self.shipping_name,
            shipping_address: self.shipping_address,
            phone: self.phone,
            delivery_area: self.delivery_area,
            district: self.district,
            tracking_number: self.tracking_number,
            created_at: self.created_at,
            updated_at: self.updated_at,
            items,
        }
    }
}

#[derive(sqlx::FromRow)]
struct OrderItemRow {
    item_id: OrderItemId,
    order_id: OrderId,
    quantity: i32,
    size: String,
    item_price: Decimal,
    #[sqlx(flatten)]
    product: ProductRow,
}

const ORDER_SELECT: &str = r"
    SELECT id, user_id, email, status, total, shipping_cost, shipping_name,
           shipping_address, phone, delivery_area, district, tracking_number,
           created_at, updated_at
    FROM orders
";

const ORDER_ITEM_SELECT: &str = concat!(
    "SELECT oi.id AS item_id, oi.order_id, oi.quantity, oi.size, oi.price AS item_price, ",
    product_columns!(),
    " FROM order_items oi JOIN products p ON p.id = oi.product_id ",
    product_joins!()
);

/// Order counts and revenue for the staff dashboard.
#[derive(Debug, Clone, Default, serde::Serialize)]
pub struct OrderStats {
    /// Count per status, every status present.
    pub by_status: Vec<(OrderStatus, i64)>,
    pub total_orders: i64,
    /// Sum of totals over non-cancelled orders.
    pub revenue: Decimal,
}

/// Staff order list filters.
#[derive(Debug, Default, Clone)]
pub struct OrderFilter {
    pub status: Option<OrderStatus>,
    /// Matches phone, email or shipping name (case-insensitive contains).
    pub search: Option<String>,
}

/// Repository for order reads and staff edits.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load one order with its items.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn get(&self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        load_order(&mut conn, id).await
    }

    /// A user's orders, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_for_user(
        &self,
        user_id: UserId,
        page: &PageQuery,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE user_id = $1")
            .bind(user_id)
            .fetch_one(self.pool)
            .await?;

        let sql = format!(
            "{ORDER_SELECT} WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2 OFFSET $3"
        );
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(user_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((self.attach_items(rows).await?, count))
    }

    /// All orders matching `filter`, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &OrderFilter,
        page: &PageQuery,
    ) -> Result<(Vec<Order>, i64), RepositoryError> {
        const WHERE: &str = r"
            WHERE ($1::order_status IS NULL OR status = $1)
              AND ($2::text IS NULL
                   OR phone ILIKE $2 OR email ILIKE $2 OR shipping_name ILIKE $2)
        ";
        let pattern = filter.search.as_deref().map(like_pattern);

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM orders {WHERE}"))
            .bind(filter.status)
            .bind(&pattern)
            .fetch_one(self.pool)
            .await?;

        let sql = format!("{ORDER_SELECT} {WHERE} ORDER BY created_at DESC LIMIT $3 OFFSET $4");
        let rows = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(filter.status)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((self.attach_items(rows).await?, count))
    }

    /// Change status and/or tracking number.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order does not exist.
    pub async fn update_fulfillment(
        &self,
        id: OrderId,
        status: Option<OrderStatus>,
        tracking_number: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE orders
            SET status = COALESCE($2, status),
                tracking_number = COALESCE($3, tracking_number),
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(status)
        .bind(tracking_number)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Counts by status and revenue of non-cancelled orders.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn stats(&self) -> Result<OrderStats, RepositoryError> {
        let counts: Vec<(OrderStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM orders GROUP BY status")
                .fetch_all(self.pool)
                .await?;

        let revenue: Decimal = sqlx::query_scalar(
            "SELECT COALESCE(SUM(total), 0) FROM orders WHERE status <> 'cancelled'",
        )
        .fetch_one(self.pool)
        .await?;

        let by_status: Vec<(OrderStatus, i64)> = OrderStatus::ALL
            .iter()
            .map(|status| {
                let n = counts
                    .iter()
                    .find(|(s, _)| s == status)
                    .map_or(0, |(_, n)| *n);
                (*status, n)
            })
            .collect();

        Ok(OrderStats {
            total_orders: by_status.iter().map(|(_, n)| n).sum(),
            by_status,
            revenue,
        })
    }

    async fn attach_items(&self, rows: Vec<OrderRow>) -> Result<Vec<Order>, RepositoryError> {
        let ids: Vec<OrderId> = rows.iter().map(|r| r.id).collect();
        let mut items = items_for(self.pool, &ids).await?;

        Ok(rows
            .into_iter()
            .map(|row| {
                let lines = items.remove(&row.id).unwrap_or_default();
                row.into_order(lines)
            })
            .collect())
    }
}

/// Load one order with its items on `conn`, which may be inside an open
/// transaction.
pub(crate) async fn load_order(
    conn: &mut PgConnection,
    id: OrderId,
) -> Result<Option<Order>, RepositoryError> {
    let sql = format!("{ORDER_SELECT} WHERE id = $1");
    let Some(row) = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
    else {
        return Ok(None);
    };

    let mut items = items_for(&mut *conn, &[id]).await?;
    let items = items.remove(&id).unwrap_or_default();
    Ok(Some(row.into_order(items)))
}

async fn items_for<'e, E: PgExecutor<'e>>(
    executor: E,
    ids: &[OrderId],
) -> Result<HashMap<OrderId, Vec<OrderItem>>, RepositoryError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let uuids: Vec<Uuid> = ids.iter().map(OrderId::as_uuid).collect();
    let sql = format!("{ORDER_ITEM_SELECT} WHERE oi.order_id = ANY($1) ORDER BY oi.id");
    let rows = sqlx::query_as::<_, OrderItemRow>(&sql)
        .bind(&uuids)
        .fetch_all(executor)
        .await?;

    let mut grouped: HashMap<OrderId, Vec<OrderItem>> = HashMap::new();
    for row in rows {
        grouped.entry(row.order_id).or_default().push(OrderItem {
            id: row.item_id,
            product: Product::from(row.product),
            quantity: row.quantity,
            size: row.size,
            price: row.item_price,
        });
    }
    Ok(grouped)
}
