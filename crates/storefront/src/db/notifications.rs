//! Site notification repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gadzilla_core::{NotificationId, NotificationType};

use super::RepositoryError;
use crate::models::Notification;

#[derive(sqlx::FromRow)]
struct NotificationRow {
    id: NotificationId,
    text: String,
    notification_type: NotificationType,
    is_active: bool,
    link: Option<String>,
    link_text: String,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
    display_order: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<NotificationRow> for Notification {
    fn from(r: NotificationRow) -> Self {
        Self {
            id: r.id,
            text: r.text,
            notification_type: r.notification_type,
            is_active: r.is_active,
            link: r.link,
            link_text: r.link_text,
            start_date: r.start_date,
            end_date: r.end_date,
            display_order: r.display_order,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// Editable notification fields.
#[derive(Debug, Clone)]
pub struct NotificationWrite {
    pub text: String,
    pub notification_type: NotificationType,
    pub is_active: bool,
    pub link: Option<String>,
    pub link_text: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub display_order: i32,
}

impl From<&Notification> for NotificationWrite {
    fn from(n: &Notification) -> Self {
        Self {
            text: n.text.clone(),
            notification_type: n.notification_type,
            is_active: n.is_active,
            link: n.link.clone(),
            link_text: n.link_text.clone(),
            start_date: n.start_date,
            end_date: n.end_date,
            display_order: n.display_order,
        }
    }
}

const NOTIFICATION_SELECT: &str = r"
    SELECT id, text, notification_type, is_active, link, link_text,
           start_date, end_date, display_order, created_at, updated_at
    FROM notifications
";

/// Repository for banner/alert/promo notifications.
pub struct NotificationRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> NotificationRepository<'a> {
    /// Create a new notification repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Notifications flagged active and inside their schedule at `now`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn active(&self, now: DateTime<Utc>) -> Result<Vec<Notification>, RepositoryError> {
        let sql = format!(
            "{NOTIFICATION_SELECT} WHERE is_active \
             AND (start_date IS NULL OR start_date <= $1) \
             AND (end_date IS NULL OR end_date >= $1) \
             ORDER BY display_order, created_at DESC"
        );
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(now)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// Every notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Notification>, RepositoryError> {
        let sql = format!("{NOTIFICATION_SELECT} ORDER BY display_order, created_at DESC");
        let rows = sqlx::query_as::<_, NotificationRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Notification::from).collect())
    }

    /// One notification by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: NotificationId) -> Result<Option<Notification>, RepositoryError> {
        let sql = format!("{NOTIFICATION_SELECT} WHERE id = $1");
        let row = sqlx::query_as::<_, NotificationRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Notification::from))
    }

    /// Insert a notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, n: &NotificationWrite) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r"
            INSERT INTO notifications (
                text, notification_type, is_active, link, link_text,
                start_date, end_date, display_order
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, text, notification_type, is_active, link, link_text,
                      start_date, end_date, display_order, created_at, updated_at
            ",
        )
        .bind(&n.text)
        .bind(n.notification_type)
        .bind(n.is_active)
        .bind(&n.link)
        .bind(&n.link_text)
        .bind(n.start_date)
        .bind(n.end_date)
        .bind(n.display_order)
        .fetch_one(self.pool)
        .await?;

        Ok(row.into())
    }

    /// Overwrite a notification.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if it does not exist.
    pub async fn update(
        &self,
        id: NotificationId,
        n: &NotificationWrite,
    ) -> Result<Notification, RepositoryError> {
        let row = sqlx::query_as::<_, NotificationRow>(
            r"
            UPDATE notifications
            SET text = $2, notification_type = $3, is_active = $4, link = $5,
                link_text = $6, start_date = $7, end_date = $8, display_order = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, text, notification_type, is_active, link, link_text,
                      start_date, end_date, display_order, created_at, updated_at
            ",
        )
        .bind(id)
        .bind(&n.text)
        .bind(n.notification_type)
        .bind(n.is_active)
        .bind(&n.link)
        .bind(&n.link_text)
        .bind(n.start_date)
        .bind(n.end_date)
        .bind(n.display_order)
        .fetch_optional(self.pool)
        .await?;

        row.map(Notification::from).ok_or(RepositoryError::NotFound)
    }

    /// Delete a notification. Returns whether it existed.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: NotificationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM notifications WHERE id = $1")
            .bind(id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
