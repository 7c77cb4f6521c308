//! Staff notification management.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::instrument;

use gadzilla_core::{NotificationId, NotificationType};

use super::nullable;
use crate::checkout::ValidationErrors;
use crate::db::notifications::{NotificationRepository, NotificationWrite};
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::Notification;
use crate::state::AppState;

const MAX_TEXT_LEN: usize = 500;
const MAX_LINK_TEXT_LEN: usize = 100;

/// Every notification, active or not, in display order.
#[instrument(skip(state, _staff))]
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
) -> Result<Json<Vec<Notification>>> {
    Ok(Json(NotificationRepository::new(state.pool()).list().await?))
}

/// Create and edit body. On edit, absent fields keep their value.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NotificationRequest {
    pub text: Option<String>,
    pub notification_type: Option<NotificationType>,
    pub is_active: Option<bool>,
    #[serde(deserialize_with = "nullable")]
    pub link: Option<Option<String>>,
    pub link_text: Option<String>,
    #[serde(deserialize_with = "nullable")]
    pub start_date: Option<Option<DateTime<Utc>>>,
    #[serde(deserialize_with = "nullable")]
    pub end_date: Option<Option<DateTime<Utc>>>,
    pub display_order: Option<i32>,
}

impl NotificationRequest {
    /// Merge onto `existing` (edit) or onto defaults (create).
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn into_write(
        self,
        existing: Option<&Notification>,
    ) -> std::result::Result<NotificationWrite, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let mut write = existing.map_or_else(blank_write, NotificationWrite::from);

        match self.text.map(|t| t.trim().to_owned()) {
            Some(text) if text.is_empty() => errors.add("text", "Required."),
            Some(text) if text.chars().count() > MAX_TEXT_LEN => errors.add(
                "text",
                format!("Ensure this field has no more than {MAX_TEXT_LEN} characters."),
            ),
            Some(text) => write.text = text,
            None if existing.is_none() => errors.add("text", "Required."),
            None => {}
        }

        if let Some(kind) = self.notification_type {
            write.notification_type = kind;
        }
        if let Some(is_active) = self.is_active {
            write.is_active = is_active;
        }

        if let Some(link) = self.link {
            let link = link.map(|l| l.trim().to_owned()).filter(|l| !l.is_empty());
            if let Some(raw) = link.as_deref()
                && url::Url::parse(raw).is_err()
            {
                errors.add("link", "Enter a valid URL.");
            }
            write.link = link;
        }

        if let Some(link_text) = self.link_text {
            let link_text = link_text.trim().to_owned();
            if link_text.chars().count() > MAX_LINK_TEXT_LEN {
                errors.add(
                    "link_text",
                    format!("Ensure this field has no more than {MAX_LINK_TEXT_LEN} characters."),
                );
            }
            write.link_text = link_text;
        }

        if let Some(start) = self.start_date {
            write.start_date = start;
        }
        if let Some(end) = self.end_date {
            write.end_date = end;
        }
        if let (Some(start), Some(end)) = (write.start_date, write.end_date)
            && end < start
        {
            errors.add("end_date", "End date must be after start date.");
        }

        if let Some(order) = self.display_order {
            if order < 0 {
                errors.add(
                    "display_order",
                    "Ensure this value is greater than or equal to 0.",
                );
            }
            write.display_order = order;
        }

        errors.into_result(write)
    }
}

fn blank_write() -> NotificationWrite {
    NotificationWrite {
        text: String::new(),
        notification_type: NotificationType::default(),
        is_active: true,
        link: None,
        link_text: String::new(),
        start_date: None,
        end_date: None,
        display_order: 0,
    }
}

/// Create a notification.
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ApiJson(body): ApiJson<NotificationRequest>,
) -> Result<(StatusCode, Json<Notification>)> {
    let write = body.into_write(None)?;
    let notification = NotificationRepository::new(state.pool())
        .create(&write)
        .await?;
    tracing::info!(notification_id = %notification.id, "Notification created");
    Ok((StatusCode::CREATED, Json(notification)))
}

/// Edit a notification.
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<NotificationId>,
    ApiJson(body): ApiJson<NotificationRequest>,
) -> Result<Json<Notification>> {
    let repo = NotificationRepository::new(state.pool());
    let existing = repo.get(id).await?.ok_or(AppError::NotFound)?;
    let write = body.into_write(Some(&existing))?;
    Ok(Json(repo.update(id, &write).await?))
}

/// Delete a notification.
#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<NotificationId>,
) -> Result<StatusCode> {
    if !NotificationRepository::new(state.pool()).delete(id).await? {
        return Err(AppError::NotFound);
    }
    tracing::info!(notification_id = %id, "Notification deleted");
    Ok(StatusCode::NO_CONTENT)
}
