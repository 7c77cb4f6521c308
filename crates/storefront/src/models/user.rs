//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gadzilla_core::{Email, UserId};

/// A shop account.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Lowercased email address.
    pub email: Email,
    /// Staff accounts may use the admin API.
    pub is_staff: bool,
    /// When the user was created.
    pub created_at: DateTime<Utc>,
}
