//! Contact form repository.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use gadzilla_core::ContactSubmissionId;

use super::RepositoryError;
use crate::models::{ContactSubmission, PageQuery};

#[derive(sqlx::FromRow)]
struct ContactRow {
    id: ContactSubmissionId,
    name: String,
    phone: String,
    email: String,
    message: String,
    created_at: DateTime<Utc>,
}

impl From<ContactRow> for ContactSubmission {
    fn from(r: ContactRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            phone: r.phone,
            email: r.email,
            message: r.message,
            created_at: r.created_at,
        }
    }
}

/// A validated contact form message.
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
}

/// Repository for contact form submissions.
pub struct ContactRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ContactRepository<'a> {
    /// Create a new contact repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Store a submission.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, contact: &NewContact) -> Result<ContactSubmissionId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO contact_submissions (name, phone, email, message)
            VALUES ($1, $2, $3, $4)
            RETURNING id
            ",
        )
        .bind(&contact.name)
        .bind(&contact.phone)
        .bind(&contact.email)
        .bind(&contact.message)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Submissions, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        page: &PageQuery,
    ) -> Result<(Vec<ContactSubmission>, i64), RepositoryError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM contact_submissions")
            .fetch_one(self.pool)
            .await?;

        let rows = sqlx::query_as::<_, ContactRow>(
            r"
            SELECT id, name, phone, email, message, created_at
            FROM contact_submissions
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            ",
        )
        .bind(page.limit())
        .bind(page.offset())
        .fetch_all(self.pool)
        .await?;

        Ok((rows.into_iter().map(ContactSubmission::from).collect(), count))
    }
}
