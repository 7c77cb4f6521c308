//! Site content: notifications and contact submissions.

use chrono::{DateTime, Utc};
use serde::Serialize;

use gadzilla_core::{ContactSubmissionId, NotificationId, NotificationType};

/// A banner, alert or promo message with an optional schedule.
#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub id: NotificationId,
    pub text: String,
    pub notification_type: NotificationType,
    pub is_active: bool,
    pub link: Option<String>,
    pub link_text: String,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Active and inside the optional `[start_date, end_date]` window.
    #[must_use]
    pub fn is_currently_active(&self, now: DateTime<Utc>) -> bool {
        self.is_active
            && self.start_date.is_none_or(|start| now >= start)
            && self.end_date.is_none_or(|end| now <= end)
    }
}

/// Notification as shown by the storefront banner.
#[derive(Debug, Serialize)]
pub struct NotificationView {
    pub id: NotificationId,
    pub text: String,
    #[serde(rename = "notificationType")]
    pub notification_type: NotificationType,
    #[serde(rename = "isCurrentlyActive")]
    pub is_currently_active: bool,
    pub link: Option<String>,
    pub link_text: String,
    pub order: i32,
    pub created_at: DateTime<Utc>,
}

impl NotificationView {
    #[must_use]
    pub fn new(notification: &Notification, now: DateTime<Utc>) -> Self {
        Self {
            id: notification.id,
            text: notification.text.clone(),
            notification_type: notification.notification_type,
            is_currently_active: notification.is_currently_active(now),
            link: notification.link.clone(),
            link_text: notification.link_text.clone(),
            order: notification.display_order,
            created_at: notification.created_at,
        }
    }
}

/// A message sent through the contact form.
#[derive(Debug, Clone, Serialize)]
pub struct ContactSubmission {
    pub id: ContactSubmissionId,
    pub name: String,
    pub phone: String,
    pub email: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn notification(
        is_active: bool,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> Notification {
        Notification {
            id: NotificationId::new(1),
            text: "Eid sale".to_owned(),
            notification_type: NotificationType::Promo,
            is_active,
            link: None,
            link_text: String::new(),
            start_date: start,
            end_date: end,
            display_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_unscheduled_follows_flag() {
        let now = Utc::now();
        assert!(notification(true, None, None).is_currently_active(now));
        assert!(!notification(false, None, None).is_currently_active(now));
    }

    #[test]
    fn test_schedule_window() {
        let now = Utc::now();
        let hour = Duration::hours(1);
        assert!(notification(true, Some(now - hour), Some(now + hour)).is_currently_active(now));
        assert!(!notification(true, Some(now + hour), None).is_currently_active(now));
        assert!(!notification(true, None, Some(now - hour)).is_currently_active(now));
        assert!(notification(true, Some(now), Some(now)).is_currently_active(now));
    }
}
