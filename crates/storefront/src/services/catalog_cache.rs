//! Cached catalog taxonomy.
//!
//! Navbar categories, their subcategories and the brand showcase change only
//! through seeding, so they are cached with `moka` (5-minute TTL) instead of
//! being queried on every page load.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use sqlx::PgPool;

use gadzilla_core::BrandType;

use crate::db::RepositoryError;
use crate::db::catalog::CatalogRepository;
use crate::models::{Brand, Category, NavbarCategory};

/// Active navbar categories and all their active subcategories.
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    pub navbar: Vec<NavbarCategory>,
    pub categories: Vec<Category>,
}

impl Taxonomy {
    /// Subcategories of one navbar slug, or all of them.
    #[must_use]
    pub fn categories_of(&self, navbar_slug: Option<&str>) -> Vec<Category> {
        self.categories
            .iter()
            .filter(|c| navbar_slug.is_none_or(|slug| c.navbar_category_slug == slug))
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn navbar_by_slug(&self, slug: &str) -> Option<&NavbarCategory> {
        self.navbar.iter().find(|n| n.slug == slug)
    }

    #[must_use]
    pub fn category_by_slug(&self, slug: &str) -> Option<&Category> {
        self.categories.iter().find(|c| c.slug == slug)
    }
}

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Taxonomy,
    Brands(Option<BrandType>),
}

#[derive(Debug, Clone)]
enum CacheValue {
    Taxonomy(Arc<Taxonomy>),
    Brands(Arc<Vec<Brand>>),
}

/// Read-through cache over [`CatalogRepository`].
#[derive(Clone)]
pub struct CatalogCache {
    cache: Cache<CacheKey, CacheValue>,
}

impl Default for CatalogCache {
    fn default() -> Self {
        Self::new(Duration::from_secs(300))
    }
}

impl CatalogCache {
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: Cache::builder().max_capacity(16).time_to_live(ttl).build(),
        }
    }

    /// Active taxonomy.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if loading a cache miss fails.
    pub async fn taxonomy(&self, pool: &PgPool) -> Result<Arc<Taxonomy>, RepositoryError> {
        if let Some(CacheValue::Taxonomy(taxonomy)) = self.cache.get(&CacheKey::Taxonomy).await {
            return Ok(taxonomy);
        }

        let repo = CatalogRepository::new(pool);
        let taxonomy = Arc::new(Taxonomy {
            navbar: repo.navbar_categories().await?,
            categories: repo.categories(None).await?,
        });
        tracing::debug!(
            navbar = taxonomy.navbar.len(),
            categories = taxonomy.categories.len(),
            "Loaded catalog taxonomy"
        );

        self.cache
            .insert(CacheKey::Taxonomy, CacheValue::Taxonomy(Arc::clone(&taxonomy)))
            .await;
        Ok(taxonomy)
    }

    /// Active showcase brands, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if loading a cache miss fails.
    pub async fn brands(
        &self,
        pool: &PgPool,
        brand_type: Option<BrandType>,
    ) -> Result<Arc<Vec<Brand>>, RepositoryError> {
        let key = CacheKey::Brands(brand_type);
        if let Some(CacheValue::Brands(brands)) = self.cache.get(&key).await {
            return Ok(brands);
        }

        let brands = Arc::new(CatalogRepository::new(pool).brands(brand_type).await?);
        self.cache
            .insert(key, CacheValue::Brands(Arc::clone(&brands)))
            .await;
        Ok(brands)
    }

    /// Drop everything, e.g. after the taxonomy was edited.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }
}

#[cfg(test)]
mod tests {
    use gadzilla_core::{CategoryId, NavbarCategoryId};

    use super::*;

    fn category(id: i32, parent: &str) -> Category {
        Category {
            id: CategoryId::new(id),
            name: format!("Sub {id}"),
            slug: format!("sub-{id}"),
            image: None,
            navbar_category_id: NavbarCategoryId::new(1),
            navbar_category_slug: parent.to_owned(),
            display_order: 0,
            is_active: true,
        }
    }

    #[test]
    fn test_categories_of_filters_by_parent() {
        let taxonomy = Taxonomy {
            navbar: Vec::new(),
            categories: vec![category(1, "audio"), category(2, "phones"), category(3, "audio")],
        };
        assert_eq!(taxonomy.categories_of(None).len(), 3);
        assert_eq!(taxonomy.categories_of(Some("audio")).len(), 2);
        assert!(taxonomy.categories_of(Some("watches")).is_empty());
        assert!(taxonomy.category_by_slug("sub-2").is_some());
        assert!(taxonomy.navbar_by_slug("audio").is_none());
    }
}
