//! Product repository.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use gadzilla_core::{Badge, CategoryId, NavbarCategoryId, ProductId};

use super::RepositoryError;
use crate::models::{PageQuery, Product};

/// Product columns (table alias `p`) plus joined category slugs.
macro_rules! product_columns {
    () => {
        "p.id, p.name, p.brand, p.slug, p.price, p.original_price, p.image, p.badge, \
         p.category_id, nc.slug AS category_slug, \
         p.sub_category_id, c.slug AS sub_category_slug, \
         p.description, p.is_featured, p.is_active, p.stock, p.created_at, p.updated_at"
    };
}

/// Joins that supply `category_slug` and `sub_category_slug`.
macro_rules! product_joins {
    () => {
        "LEFT JOIN navbar_categories nc ON nc.id = p.category_id \
         LEFT JOIN categories c ON c.id = p.sub_category_id"
    };
}

pub(super) use {product_columns, product_joins};

const PRODUCT_SELECT: &str = concat!(
    "SELECT ",
    product_columns!(),
    " FROM products p ",
    product_joins!()
);

#[derive(sqlx::FromRow)]
pub(super) struct ProductRow {
    id: ProductId,
    name: String,
    brand: String,
    slug: String,
    price: Decimal,
    original_price: Option<Decimal>,
    image: Option<String>,
    badge: Option<Badge>,
    category_id: Option<NavbarCategoryId>,
    category_slug: Option<String>,
    sub_category_id: Option<CategoryId>,
    sub_category_slug: Option<String>,
    description: String,
    is_featured: bool,
    is_active: bool,
    stock: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Self {
            id: r.id,
            name: r.name,
            brand: r.brand,
            slug: r.slug,
            price: r.price,
            original_price: r.original_price,
            image: r.image,
            badge: r.badge,
            category_id: r.category_id,
            category_slug: r.category_slug,
            sub_category_id: r.sub_category_id,
            sub_category_slug: r.sub_category_slug,
            description: r.description,
            is_featured: r.is_featured,
            is_active: r.is_active,
            stock: r.stock,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

/// How a product is addressed in a URL: by UUID or by slug.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductRef {
    Id(ProductId),
    Slug(String),
}

impl ProductRef {
    /// Anything that parses as a UUID is an id; everything else is a slug.
    #[must_use]
    pub fn parse(identifier: &str) -> Self {
        identifier
            .parse::<ProductId>()
            .map_or_else(|_| Self::Slug(identifier.to_owned()), Self::Id)
    }
}

/// Storefront list filters.
#[derive(Debug, Default, Clone)]
pub struct ProductFilter {
    /// Navbar category slugs (any of).
    pub categories: Vec<String>,
    /// Subcategory slug.
    pub subcategory: Option<String>,
    /// Brand names (any of).
    pub brands: Vec<String>,
    pub featured: bool,
    /// Only products carrying the `sale` badge.
    pub hot_deals: bool,
}

/// Fields written when creating or fully updating a product.
#[derive(Debug, Clone)]
pub struct ProductWrite {
    pub name: String,
    pub brand: String,
    pub slug: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub badge: Option<Badge>,
    pub category_id: Option<NavbarCategoryId>,
    pub sub_category_id: Option<CategoryId>,
    pub description: String,
    pub is_featured: bool,
    pub is_active: bool,
    pub stock: i32,
}

impl From<&Product> for ProductWrite {
    fn from(p: &Product) -> Self {
        Self {
            name: p.name.clone(),
            brand: p.brand.clone(),
            slug: p.slug.clone(),
            price: p.price,
            original_price: p.original_price,
            image: p.image.clone(),
            badge: p.badge,
            category_id: p.category_id,
            sub_category_id: p.sub_category_id,
            description: p.description.clone(),
            is_featured: p.is_featured,
            is_active: p.is_active,
            stock: p.stock,
        }
    }
}

/// Escape `%`, `_` and `\` for use inside an `ILIKE` pattern.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    escaped.push('%');
    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    (!values.is_empty()).then(|| values.to_vec())
}

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Active products matching `filter`, newest first, plus the total count.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list(
        &self,
        filter: &ProductFilter,
        page: &PageQuery,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        const WHERE: &str = r"
            WHERE p.is_active
              AND ($1::text[] IS NULL OR nc.slug = ANY($1))
              AND ($2::text IS NULL OR c.slug = $2)
              AND ($3::text[] IS NULL OR p.brand = ANY($3))
              AND (NOT $4 OR p.is_featured)
              AND (NOT $5 OR p.badge = 'sale')
        ";

        let categories = non_empty(&filter.categories);
        let brands = non_empty(&filter.brands);

        let count_sql = format!(
            concat!("SELECT COUNT(*) FROM products p ", product_joins!(), " {}"),
            WHERE
        );
        let count: i64 = sqlx::query_scalar(&count_sql)
            .bind(&categories)
            .bind(&filter.subcategory)
            .bind(&brands)
            .bind(filter.featured)
            .bind(filter.hot_deals)
            .fetch_one(self.pool)
            .await?;

        let sql = format!("{PRODUCT_SELECT} {WHERE} ORDER BY p.created_at DESC LIMIT $6 OFFSET $7");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&categories)
            .bind(&filter.subcategory)
            .bind(&brands)
            .bind(filter.featured)
            .bind(filter.hot_deals)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows.into_iter().map(Product::from).collect(), count))
    }

    /// Case-insensitive search over name, brand and description, by name.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, term: &str, limit: i64) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE p.is_active \
             AND (p.name ILIKE $1 OR p.brand ILIKE $1 OR p.description ILIKE $1) \
             ORDER BY p.name LIMIT $2"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(like_pattern(term))
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Find an active product by id or slug.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn find_active(&self, product: &ProductRef) -> Result<Option<Product>, RepositoryError> {
        let row = match product {
            ProductRef::Id(id) => {
                let sql = format!("{PRODUCT_SELECT} WHERE p.is_active AND p.id = $1");
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(id)
                    .fetch_optional(self.pool)
                    .await?
            }
            ProductRef::Slug(slug) => {
                let sql = format!("{PRODUCT_SELECT} WHERE p.is_active AND p.slug = $1");
                sqlx::query_as::<_, ProductRow>(&sql)
                    .bind(slug)
                    .fetch_optional(self.pool)
                    .await?
            }
        };

        Ok(row.map(Product::from))
    }

    /// Find any product (active or not) by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let sql = format!("{PRODUCT_SELECT} WHERE p.id = $1");
        let row = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(id)
            .fetch_optional(self.pool)
            .await?;

        Ok(row.map(Product::from))
    }

    /// Whether an active product with this id exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn is_active(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS (SELECT 1 FROM products WHERE id = $1 AND is_active)",
        )
        .bind(id)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Gallery image paths in display order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn images(&self, id: ProductId) -> Result<Vec<String>, RepositoryError> {
        let images = sqlx::query_scalar(
            "SELECT image FROM product_images WHERE product_id = $1 ORDER BY display_order, id",
        )
        .bind(id)
        .fetch_all(self.pool)
        .await?;

        Ok(images)
    }

    /// Other active products in the same navbar category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn related(
        &self,
        product: &Product,
        limit: i64,
    ) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE p.is_active \
             AND p.category_id IS NOT DISTINCT FROM $1 AND p.id <> $2 \
             ORDER BY p.created_at DESC LIMIT $3"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(product.category_id)
            .bind(product.id)
            .bind(limit)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Distinct brand names of active products, alphabetically.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn brand_names(
        &self,
        category_slug: Option<&str>,
    ) -> Result<Vec<String>, RepositoryError> {
        let brands = sqlx::query_scalar(
            r"
            SELECT DISTINCT p.brand
            FROM products p
            LEFT JOIN navbar_categories nc ON nc.id = p.category_id
            WHERE p.is_active AND ($1::text IS NULL OR nc.slug = $1)
            ORDER BY p.brand
            ",
        )
        .bind(category_slug)
        .fetch_all(self.pool)
        .await?;

        Ok(brands)
    }

    // =========================================================================
    // Staff operations
    // =========================================================================

    /// All products (including inactive) matching an optional name, brand or
    /// slug search.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn list_all(
        &self,
        search: Option<&str>,
        page: &PageQuery,
    ) -> Result<(Vec<Product>, i64), RepositoryError> {
        const WHERE: &str =
            "WHERE ($1::text IS NULL OR p.name ILIKE $1 OR p.brand ILIKE $1 OR p.slug ILIKE $1)";
        let pattern = search.map(like_pattern);

        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products p {WHERE}"))
            .bind(&pattern)
            .fetch_one(self.pool)
            .await?;

        let sql = format!("{PRODUCT_SELECT} {WHERE} ORDER BY p.created_at DESC LIMIT $2 OFFSET $3");
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(&pattern)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(self.pool)
            .await?;

        Ok((rows.into_iter().map(Product::from).collect(), count))
    }

    /// Products at or below `threshold` units, lowest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn low_stock(&self, threshold: i32) -> Result<Vec<Product>, RepositoryError> {
        let sql = format!(
            "{PRODUCT_SELECT} WHERE p.is_active AND p.stock <= $1 ORDER BY p.stock, p.name LIMIT 50"
        );
        let rows = sqlx::query_as::<_, ProductRow>(&sql)
            .bind(threshold)
            .fetch_all(self.pool)
            .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    /// Insert a product with a fresh id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the slug is taken.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn create(&self, product: &ProductWrite) -> Result<ProductId, RepositoryError> {
        let id = ProductId::generate();
        sqlx::query(
            r"
            INSERT INTO products (
                id, name, brand, slug, price, original_price, image, badge,
                category_id, sub_category_id, description, is_featured, is_active, stock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ",
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.slug)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.image)
        .bind(product.badge)
        .bind(product.category_id)
        .bind(product.sub_category_id)
        .bind(&product.description)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(product.stock)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product slug"))?;

        Ok(id)
    }

    /// Overwrite every editable column of a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    /// Returns `RepositoryError::Conflict` if the new slug is taken.
    pub async fn update(&self, id: ProductId, product: &ProductWrite) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE products
            SET name = $2, brand = $3, slug = $4, price = $5, original_price = $6,
                image = $7, badge = $8, category_id = $9, sub_category_id = $10,
                description = $11, is_featured = $12, is_active = $13, stock = $14,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.slug)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.image)
        .bind(product.badge)
        .bind(product.category_id)
        .bind(product.sub_category_id)
        .bind(&product.description)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(product.stock)
        .execute(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "product slug"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Set the stock count directly (staff correction or restock).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the product does not exist.
    pub async fn set_stock(&self, id: ProductId, stock: i32) -> Result<(), RepositoryError> {
        let result =
            sqlx::query("UPDATE products SET stock = $2, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .bind(stock)
                .execute(self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    /// Insert or update a product keyed by slug (catalog seeding).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn upsert_by_slug(&self, product: &ProductWrite) -> Result<ProductId, RepositoryError> {
        let id: Uuid = sqlx::query_scalar(
            r"
            INSERT INTO products (
                id, name, brand, slug, price, original_price, image, badge,
                category_id, sub_category_id, description, is_featured, is_active, stock
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            ON CONFLICT (slug) DO UPDATE
            SET name = EXCLUDED.name, brand = EXCLUDED.brand, price = EXCLUDED.price,
                original_price = EXCLUDED.original_price, image = EXCLUDED.image,
                badge = EXCLUDED.badge, category_id = EXCLUDED.category_id,
                sub_category_id = EXCLUDED.sub_category_id,
                description = EXCLUDED.description, is_featured = EXCLUDED.is_featured,
                is_active = EXCLUDED.is_active, stock = EXCLUDED.stock, updated_at = NOW()
            RETURNING id
            ",
        )
        .bind(ProductId::generate())
        .bind(&product.name)
        .bind(&product.brand)
        .bind(&product.slug)
        .bind(product.price)
        .bind(product.original_price)
        .bind(&product.image)
        .bind(product.badge)
        .bind(product.category_id)
        .bind(product.sub_category_id)
        .bind(&product.description)
        .bind(product.is_featured)
        .bind(product.is_active)
        .bind(product.stock)
        .fetch_one(self.pool)
        .await?;

        Ok(ProductId::new(id))
    }

    /// Replace a product's gallery.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    pub async fn replace_images(
        &self,
        id: ProductId,
        images: &[String],
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM product_images WHERE product_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        for (order, image) in images.iter().enumerate() {
            sqlx::query(
                "INSERT INTO product_images (product_id, image, display_order) VALUES ($1, $2, $3)",
            )
            .bind(id)
            .bind(image)
            .bind(i32::try_from(order).unwrap_or(i32::MAX))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_ref_parse() {
        let id = "6f1c1f0e-7d43-4a51-9a3b-1d2f3e4a5b6c";
        assert!(matches!(ProductRef::parse(id), ProductRef::Id(_)));
        assert_eq!(
            ProductRef::parse("galaxy-s24"),
            ProductRef::Slug("galaxy-s24".to_owned())
        );
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("usb"), "%usb%");
        assert_eq!(like_pattern("100%"), "%100\\%%");
        assert_eq!(like_pattern("a_b"), "%a\\_b%");
    }
}
