//! Site notification handlers.

use axum::{Json, extract::State};
use chrono::Utc;
use tracing::instrument;

use crate::db::notifications::NotificationRepository;
use crate::error::Result;
use crate::models::NotificationView;
use crate::state::AppState;

/// Notifications that are active and inside their schedule.
#[instrument(skip(state))]
pub async fn active(State(state): State<AppState>) -> Result<Json<Vec<NotificationView>>> {
    let now = Utc::now();
    let notifications = NotificationRepository::new(state.pool()).active(now).await?;
    Ok(Json(
        notifications
            .iter()
            .map(|n| NotificationView::new(n, now))
            .collect(),
    ))
}
