//! Database migration command.
//!
//! Migrations live in `crates/storefront/migrations/` and are embedded in the
//! storefront library, so this binary always applies the set it was built
//! with.

use gadzilla_storefront::db;

use super::{CommandError, connect};

/// Apply all pending migrations.
pub async fn run() -> Result<(), CommandError> {
    let pool = connect().await?;

    tracing::info!("Running migrations...");
    db::run_migrations(&pool).await?;

    tracing::info!("Migrations complete!");
    Ok(())
}
