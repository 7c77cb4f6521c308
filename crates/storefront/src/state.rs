//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;

use crate::checkout::postgres::PgCheckoutStore;
use crate::config::StorefrontConfig;
use crate::models::MediaUrls;
use crate::services::catalog_cache::CatalogCache;
use crate::services::conversions::{ConversionTracker, LogTracker};
use crate::services::email::EmailService;

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc` and provides access to
/// shared resources like database connections and configuration.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    pool: PgPool,
    checkout: PgCheckoutStore,
    media: MediaUrls,
    email: Option<EmailService>,
    conversions: Arc<dyn ConversionTracker>,
    catalog: CatalogCache,
}

impl AppState {
    /// Create a new application state with the logging conversion tracker.
    ///
    /// Email stays disabled when SMTP is not configured or the transport
    /// cannot be built; the failure is logged.
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool) -> Self {
        Self::with_tracker(config, pool, Arc::new(LogTracker))
    }

    /// Create a new application state with a custom conversion tracker.
    #[must_use]
    pub fn with_tracker(
        config: StorefrontConfig,
        pool: PgPool,
        conversions: Arc<dyn ConversionTracker>,
    ) -> Self {
        let email = config
            .email
            .as_ref()
            .and_then(|email_config| match EmailService::new(email_config) {
                Ok(service) => Some(service),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create SMTP transport, email disabled");
                    None
                }
            });

        Self {
            inner: Arc::new(AppStateInner {
                media: MediaUrls::new(&config.media_base_url),
                checkout: PgCheckoutStore::new(pool.clone()),
                config,
                pool,
                email,
                conversions,
                catalog: CatalogCache::default(),
            }),
        }
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Checkout transaction store.
    #[must_use]
    pub fn checkout(&self) -> &PgCheckoutStore {
        &self.inner.checkout
    }

    /// Media URL resolver.
    #[must_use]
    pub fn media(&self) -> &MediaUrls {
        &self.inner.media
    }

    /// Email service, when SMTP is configured.
    #[must_use]
    pub fn email(&self) -> Option<&EmailService> {
        self.inner.email.as_ref()
    }

    /// Conversion tracker.
    #[must_use]
    pub fn conversions(&self) -> &Arc<dyn ConversionTracker> {
        &self.inner.conversions
    }

    /// Cached catalog taxonomy.
    #[must_use]
    pub fn catalog(&self) -> &CatalogCache {
        &self.inner.catalog
    }
}
