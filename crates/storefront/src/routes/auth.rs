//! Account route handlers: register, login, logout and the current user.

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{ApiJson, Result, add_breadcrumb};
use crate::middleware::{RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::services::auth::AuthService;
use crate::state::AppState;

/// Register and login body.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CredentialsRequest {
    pub email: String,
    pub password: String,
}

/// Create an account and log it in.
#[instrument(skip(state, session, body))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<User>)> {
    let user = AuthService::new(state.pool())
        .register(&body.email, &body.password)
        .await?;
    log_in(&session, &user).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

/// Log in with email and password.
#[instrument(skip(state, session, body))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(body): ApiJson<CredentialsRequest>,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool())
        .login(&body.email, &body.password)
        .await?;
    log_in(&session, &user).await?;
    add_breadcrumb("auth", "Logged in", None);
    tracing::info!(user_id = %user.id, "User logged in");
    Ok(Json(user))
}

async fn log_in(session: &Session, user: &User) -> Result<()> {
    let current = CurrentUser {
        id: user.id,
        email: user.email.clone(),
        is_staff: user.is_staff,
    };
    set_current_user(session, &current).await?;
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
}

/// Log out. Succeeds for anonymous callers too.
#[instrument(skip(session))]
pub async fn logout(session: Session) -> Result<Json<StatusResponse>> {
    clear_current_user(&session).await?;
    Ok(Json(StatusResponse {
        status: "logged_out",
    }))
}

/// The logged-in user, re-read from the database.
#[instrument(skip(state, user))]
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
) -> Result<Json<User>> {
    let user = AuthService::new(state.pool()).get_user(user.id).await?;
    Ok(Json(user))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AdminPathQuery {
    pub path: String,
}

#[derive(Debug, Serialize)]
pub struct AdminPathResponse {
    pub valid: bool,
}

/// Check a candidate against the configured admin URL path.
#[instrument(skip_all)]
pub async fn verify_admin_path(
    State(state): State<AppState>,
    Query(query): Query<AdminPathQuery>,
) -> Json<AdminPathResponse> {
    Json(AdminPathResponse {
        valid: state.config().is_admin_path(&query.path),
    })
}
