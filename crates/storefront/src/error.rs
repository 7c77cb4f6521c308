//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Every error body is JSON with a `detail` message. Validation errors add a
//! `fields` map, stock failures an `errors` list.

use axum::{
    Json,
    extract::{
        FromRequest,
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::checkout::{CheckoutError, ValidationErrors};
use crate::db::RepositoryError;
use crate::services::auth::AuthError;

/// Application-level error type for the shop API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Field-level input errors.
    #[error("Invalid input: {0}")]
    Validation(ValidationErrors),

    /// Unknown products or short stock at checkout.
    #[error("Stock validation failed: {}", .0.join("; "))]
    Stock(Vec<String>),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Resource not found, or not visible to the caller.
    #[error("Not found")]
    NotFound,

    /// User is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// User is authenticated but not allowed.
    #[error("Forbidden")]
    Forbidden,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Write collides with existing data.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Validation error on a single field.
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, message))
    }

    const fn is_server_error(&self) -> bool {
        matches!(
            self,
            Self::Database(_)
                | Self::Internal(_)
                | Self::Auth(AuthError::Repository(_) | AuthError::PasswordHash)
        )
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            other => Self::Database(other),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Invalid(errors) => Self::Validation(errors),
            CheckoutError::EmptyCart => Self::BadRequest("Cart is empty.".to_owned()),
            CheckoutError::Stock(errors) => Self::Stock(errors),
            CheckoutError::Repository(err) => Self::Database(err),
        }
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session: {err}"))
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::field("non_field_errors", rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::field("non_field_errors", rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let (status, body) = match self {
            Self::Validation(fields) => (
                StatusCode::BAD_REQUEST,
                json!({ "detail": "Invalid input.", "fields": fields }),
            ),
            Self::Stock(errors) => (
                StatusCode::BAD_REQUEST,
                json!({ "detail": "Stock validation failed.", "errors": errors }),
            ),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "detail": msg })),
            Self::NotFound => (StatusCode::NOT_FOUND, json!({ "detail": "Not found." })),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                json!({ "detail": "Authentication credentials were not provided." }),
            ),
            Self::Forbidden => (
                StatusCode::FORBIDDEN,
                json!({ "detail": "You do not have permission to perform this action." }),
            ),
            Self::Conflict(msg) => (StatusCode::CONFLICT, json!({ "detail": msg })),
            Self::Auth(err) => auth_response(err),
            // Don't expose internal error details to clients
            Self::Database(_) | Self::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "detail": "Internal server error" }),
            ),
        };

        (status, Json(body)).into_response()
    }
}

fn auth_response(err: AuthError) -> (StatusCode, serde_json::Value) {
    match err {
        AuthError::InvalidCredentials | AuthError::UserNotFound => (
            StatusCode::UNAUTHORIZED,
            json!({ "detail": "Invalid email or password." }),
        ),
        AuthError::UserAlreadyExists => (
            StatusCode::BAD_REQUEST,
            json!({
                "detail": "Invalid input.",
                "fields": { "email": ["An account with this email already exists."] },
            }),
        ),
        AuthError::InvalidEmail(_) => (
            StatusCode::BAD_REQUEST,
            json!({
                "detail": "Invalid input.",
                "fields": { "email": ["Enter a valid email address."] },
            }),
        ),
        AuthError::WeakPassword(msg) => (
            StatusCode::BAD_REQUEST,
            json!({ "detail": "Invalid input.", "fields": { "password": [msg] } }),
        ),
        AuthError::Repository(_) | AuthError::PasswordHash => (
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "detail": "Internal server error" }),
        ),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// JSON body extractor whose rejections use the API's error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::to_bytes;
    use serde_json::Value;

    use super::*;

    async fn render(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
        assert_eq!(AppError::NotFound.to_string(), "Not found");
    }

    #[tokio::test]
    async fn test_app_error_status_codes() {
        assert_eq!(render(AppError::NotFound).await.0, StatusCode::NOT_FOUND);
        assert_eq!(
            render(AppError::Unauthorized).await.0,
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(render(AppError::Forbidden).await.0, StatusCode::FORBIDDEN);
        assert_eq!(
            render(AppError::Conflict("slug".to_owned())).await.0,
            StatusCode::CONFLICT
        );
        assert_eq!(
            render(AppError::Internal("boom".to_owned())).await.0,
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_stock_error_body() {
        let err: AppError = CheckoutError::Stock(vec![
            "Insufficient stock for Pixel Buds. Available: 1, Requested: 2".to_owned(),
        ])
        .into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Stock validation failed.");
        assert_eq!(
            body["errors"][0],
            "Insufficient stock for Pixel Buds. Available: 1, Requested: 2"
        );
    }

    #[tokio::test]
    async fn test_empty_cart_body() {
        let (status, body) = render(CheckoutError::EmptyCart.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "detail": "Cart is empty." }));
    }

    #[tokio::test]
    async fn test_validation_body_lists_fields() {
        let (status, body) = render(AppError::field("phone", "Required.")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["detail"], "Invalid input.");
        assert_eq!(body["fields"]["phone"][0], "Required.");
    }

    #[tokio::test]
    async fn test_database_error_hides_internals() {
        let err: AppError =
            RepositoryError::Database(sqlx::Error::Protocol("secret detail".to_owned())).into();
        let (status, body) = render(err).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "detail": "Internal server error" }));
    }

    #[tokio::test]
    async fn test_repository_not_found_maps_to_404() {
        let (status, body) = render(RepositoryError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["detail"], "Not found.");
    }

    #[tokio::test]
    async fn test_auth_errors() {
        let (status, _) = render(AuthError::InvalidCredentials.into()).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = render(AuthError::UserAlreadyExists.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body["fields"]["email"][0],
            "An account with this email already exists."
        );
    }
}
