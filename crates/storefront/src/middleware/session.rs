//! Session middleware configuration.
//!
//! Sets up `PostgreSQL`-backed sessions using tower-sessions, and resolves
//! which cart a request is shopping with.

use sqlx::PgPool;
use tower_sessions::cookie::SameSite;
use tower_sessions::{Expiry, Session, SessionManagerLayer};
use tower_sessions_sqlx_store::PostgresStore;
use uuid::Uuid;

use crate::config::StorefrontConfig;
use crate::db::carts::CartOwner;
use crate::models::{CurrentUser, session_keys};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "gz_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Session store on the shop database.
#[must_use]
pub fn session_store(pool: &PgPool) -> PostgresStore {
    PostgresStore::new(pool.clone())
}

/// Create the session layer with `PostgreSQL` store.
///
/// Behind HTTPS the cookie is `Secure` and `SameSite=None` so the storefront
/// frontend on another origin can send it; otherwise it is `Lax`.
#[must_use]
pub fn create_session_layer(
    store: PostgresStore,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    let is_secure = config.is_https();
    let same_site = if is_secure {
        SameSite::None
    } else {
        SameSite::Lax
    };

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(same_site)
        .with_http_only(true)
        .with_path("/")
}

/// The cart this request shops with.
///
/// Logged-in users own one cart by account. Anonymous visitors get a random
/// cart token stored in their session on first use.
///
/// # Errors
///
/// Returns an error if the session cannot be read or written.
pub async fn cart_owner(
    session: &Session,
    user: Option<&CurrentUser>,
) -> Result<CartOwner, tower_sessions::session::Error> {
    if let Some(user) = user {
        return Ok(CartOwner::User(user.id));
    }

    if let Some(token) = session.get::<String>(session_keys::CART_TOKEN).await? {
        return Ok(CartOwner::Session(token));
    }

    let token = Uuid::new_v4().simple().to_string();
    session.insert(session_keys::CART_TOKEN, &token).await?;
    Ok(CartOwner::Session(token))
}
