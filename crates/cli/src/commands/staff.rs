//! Staff account management.

use gadzilla_storefront::services::auth::AuthService;

use super::{CommandError, connect};

/// Create a staff account, or promote an existing account and reset its
/// password.
pub async fn create(email: &str, password: &str) -> Result<(), CommandError> {
    let pool = connect().await?;

    let user = AuthService::new(&pool)
        .provision_staff(email, password)
        .await?;

    tracing::info!(user_id = %user.id, email = %user.email, "Staff account ready");
    Ok(())
}
