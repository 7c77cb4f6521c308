//! Taxonomy and brand showcase repository.

use sqlx::PgPool;

use gadzilla_core::{BrandId, BrandType, CategoryId, NavbarCategoryId};

use super::RepositoryError;
use crate::models::{Brand, Category, NavbarCategory};

#[derive(sqlx::FromRow)]
struct NavbarCategoryRow {
    id: NavbarCategoryId,
    name: String,
    slug: String,
    description: String,
    image: Option<String>,
    display_order: i32,
    is_active: bool,
}

impl From<NavbarCategoryRow> for NavbarCategory {
    fn from(r: NavbarCategoryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            slug: r.slug,
            description: r.description,
            image: r.image,
            display_order: r.display_order,
            is_active: r.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct CategoryRow {
    id: CategoryId,
    name: String,
    slug: String,
    image: Option<String>,
    navbar_category_id: NavbarCategoryId,
    navbar_category_slug: String,
    display_order: i32,
    is_active: bool,
}

impl From<CategoryRow> for Category {
    fn from(r: CategoryRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            slug: r.slug,
            image: r.image,
            navbar_category_id: r.navbar_category_id,
            navbar_category_slug: r.navbar_category_slug,
            display_order: r.display_order,
            is_active: r.is_active,
        }
    }
}

#[derive(sqlx::FromRow)]
struct BrandRow {
    id: BrandId,
    name: String,
    slug: String,
    image: Option<String>,
    redirect_url: String,
    brand_type: BrandType,
    display_order: i32,
}

impl From<BrandRow> for Brand {
    fn from(r: BrandRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            slug: r.slug,
            image: r.image,
            redirect_url: r.redirect_url,
            brand_type: r.brand_type,
            display_order: r.display_order,
        }
    }
}

const NAVBAR_SELECT: &str =
    "SELECT id, name, slug, description, image, display_order, is_active FROM navbar_categories";

const CATEGORY_SELECT: &str = r"
    SELECT c.id, c.name, c.slug, c.image, c.navbar_category_id,
           nc.slug AS navbar_category_slug, c.display_order, c.is_active
    FROM categories c
    JOIN navbar_categories nc ON nc.id = c.navbar_category_id
";

/// Repository for navbar categories, subcategories and showcase brands.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active navbar categories in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn navbar_categories(&self) -> Result<Vec<NavbarCategory>, RepositoryError> {
        let sql = format!("{NAVBAR_SELECT} WHERE is_active ORDER BY display_order, name");
        let rows = sqlx::query_as::<_, NavbarCategoryRow>(&sql)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(NavbarCategory::from).collect())
    }

    /// Active navbar category by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn navbar_category(
        &self,
        slug: &str,
    ) -> Result<Option<NavbarCategory>, RepositoryError> {
        let sql = format!("{NAVBAR_SELECT} WHERE is_active AND slug = $1");
        let row = sqlx::query_as::<_, NavbarCategoryRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(NavbarCategory::from))
    }

    /// Active subcategories, optionally restricted to one navbar slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn categories(
        &self,
        navbar_slug: Option<&str>,
    ) -> Result<Vec<Category>, RepositoryError> {
        let sql = format!(
            "{CATEGORY_SELECT} WHERE c.is_active AND nc.is_active \
             AND ($1::text IS NULL OR nc.slug = $1) \
             ORDER BY nc.display_order, c.display_order, c.name"
        );
        let rows = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(navbar_slug)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    /// Active subcategory by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn category(&self, slug: &str) -> Result<Option<Category>, RepositoryError> {
        let sql = format!("{CATEGORY_SELECT} WHERE c.is_active AND c.slug = $1");
        let row = sqlx::query_as::<_, CategoryRow>(&sql)
            .bind(slug)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Category::from))
    }

    /// Parent navbar category of a subcategory, regardless of activity.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn parent_of(
        &self,
        category: CategoryId,
    ) -> Result<Option<NavbarCategoryId>, RepositoryError> {
        let parent = sqlx::query_scalar("SELECT navbar_category_id FROM categories WHERE id = $1")
            .bind(category)
            .fetch_optional(self.pool)
            .await?;

        Ok(parent)
    }

    /// Whether a navbar category with this id exists, active or not.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn navbar_category_exists(
        &self,
        id: NavbarCategoryId,
    ) -> Result<bool, RepositoryError> {
        let exists =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM navbar_categories WHERE id = $1)")
                .bind(id)
                .fetch_one(self.pool)
                .await?;

        Ok(exists)
    }

    /// Active showcase brands, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brands(
        &self,
        brand_type: Option<BrandType>,
    ) -> Result<Vec<Brand>, RepositoryError> {
        let rows = sqlx::query_as::<_, BrandRow>(
            r"
            SELECT id, name, slug, image, redirect_url, brand_type, display_order
            FROM brands
            WHERE is_active AND ($1::brand_type IS NULL OR brand_type = $1)
            ORDER BY display_order, name
            ",
        )
        .bind(brand_type)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Brand::from).collect())
    }

    // =========================================================================
    // Seeding
    // =========================================================================

    /// Insert or update a navbar category keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_navbar_category(
        &self,
        name: &str,
        slug: &str,
        description: &str,
        image: Option<&str>,
        display_order: i32,
    ) -> Result<NavbarCategoryId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO navbar_categories (name, slug, description, image, display_order)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name, description = EXCLUDED.description,
                image = EXCLUDED.image, display_order = EXCLUDED.display_order,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(name)
        .bind(slug)
        .bind(description)
        .bind(image)
        .bind(display_order)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Insert or update a subcategory keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_category(
        &self,
        navbar_category_id: NavbarCategoryId,
        name: &str,
        slug: &str,
        image: Option<&str>,
        display_order: i32,
    ) -> Result<CategoryId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO categories (navbar_category_id, name, slug, image, display_order)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (slug) DO UPDATE
            SET navbar_category_id = EXCLUDED.navbar_category_id, name = EXCLUDED.name,
                image = EXCLUDED.image, display_order = EXCLUDED.display_order,
                updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(navbar_category_id)
        .bind(name)
        .bind(slug)
        .bind(image)
        .bind(display_order)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }

    /// Insert or update a showcase brand keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_brand(
        &self,
        name: &str,
        slug: &str,
        image: Option<&str>,
        redirect_url: &str,
        brand_type: BrandType,
        display_order: i32,
    ) -> Result<BrandId, RepositoryError> {
        let id = sqlx::query_scalar(
            r"
            INSERT INTO brands (name, slug, image, redirect_url, brand_type, display_order)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name, image = EXCLUDED.image,
                redirect_url = EXCLUDED.redirect_url, brand_type = EXCLUDED.brand_type,
                display_order = EXCLUDED.display_order
            RETURNING id
            ",
        )
        .bind(name)
        .bind(slug)
        .bind(image)
        .bind(redirect_url)
        .bind(brand_type)
        .bind(display_order)
        .fetch_one(self.pool)
        .await?;

        Ok(id)
    }
}
