//! Catalog seeding from YAML.
//!
//! Everything is upserted by slug, so re-running a file updates rows in
//! place. The file is parsed and validated before connecting to the
//! database.
//!
//! ```yaml
//! navbar_categories:
//!   - name: Audio
//!     order: 1
//!     subcategories:
//!       - name: Earbuds
//! brands:
//!   - name: Anker
//!     type: accessories
//!     redirect_url: /accessories?brand=Anker
//! products:
//!   - name: Pixel Buds Pro
//!     brand: Google
//!     price: "18500.00"
//!     category: audio
//!     subcategory: earbuds
//!     stock: 12
//!     images: [products/pixel-buds-1.jpg]
//! ```

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::{error, info};

use gadzilla_core::{Badge, BrandType, CategoryId, NavbarCategoryId};
use gadzilla_storefront::db::catalog::CatalogRepository;
use gadzilla_storefront::db::products::{ProductRepository, ProductWrite};
use gadzilla_storefront::models::catalog::slugify;

use super::{CommandError, connect};

/// Top-level seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSeed {
    pub navbar_categories: Vec<NavbarSeed>,
    pub brands: Vec<BrandSeed>,
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NavbarSeed {
    pub name: String,
    pub slug: Option<String>,
    #[serde(default)]
    pub description: String,
    pub image: Option<String>,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub subcategories: Vec<SubcategorySeed>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SubcategorySeed {
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub order: i32,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BrandSeed {
    pub name: String,
    pub slug: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub redirect_url: String,
    #[serde(rename = "type")]
    pub brand_type: BrandType,
    #[serde(default)]
    pub order: i32,
}

const fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductSeed {
    pub name: String,
    pub brand: String,
    pub slug: Option<String>,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    pub badge: Option<Badge>,
    /// Navbar category slug.
    pub category: Option<String>,
    /// Subcategory slug; must belong to `category`.
    pub subcategory: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub featured: bool,
    #[serde(default = "default_true")]
    pub active: bool,
    #[serde(default)]
    pub stock: i32,
}

fn slug_or_name(slug: Option<&str>, name: &str) -> String {
    slug.map_or_else(|| slugify(name), slugify)
}

impl CatalogSeed {
    /// Problems that would make seeding fail or produce a broken catalog.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        // subcategory slug -> navbar slug
        let mut parents: HashMap<String, String> = HashMap::new();
        let mut navbar_slugs = HashSet::new();
        for navbar in &self.navbar_categories {
            let slug = slug_or_name(navbar.slug.as_deref(), &navbar.name);
            if slug.is_empty() {
                errors.push(format!("navbar category {:?} has an empty slug", navbar.name));
            }
            if !navbar_slugs.insert(slug.clone()) {
                errors.push(format!("duplicate navbar category slug {slug:?}"));
            }
            for sub in &navbar.subcategories {
                let sub_slug = slug_or_name(sub.slug.as_deref(), &sub.name);
                if sub_slug.is_empty() {
                    errors.push(format!("subcategory {:?} has an empty slug", sub.name));
                }
                if parents.insert(sub_slug.clone(), slug.clone()).is_some() {
                    errors.push(format!("duplicate subcategory slug {sub_slug:?}"));
                }
            }
        }

        let mut brand_slugs = HashSet::new();
        for brand in &self.brands {
            let slug = slug_or_name(brand.slug.as_deref(), &brand.name);
            if !brand_slugs.insert(slug.clone()) {
                errors.push(format!("duplicate brand slug {slug:?}"));
            }
        }

        let mut product_slugs = HashSet::new();
        for product in &self.products {
            let slug = slug_or_name(product.slug.as_deref(), &product.name);
            let label = &product.name;
            if slug.is_empty() {
                errors.push(format!("product {label:?} has an empty slug"));
            }
            if !product_slugs.insert(slug.clone()) {
                errors.push(format!("duplicate product slug {slug:?}"));
            }
            if product.price < Decimal::ZERO {
                errors.push(format!("product {label:?} has a negative price"));
            }
            if product.stock < 0 {
                errors.push(format!("product {label:?} has negative stock"));
            }
            if let Some(category) = &product.category
                && !navbar_slugs.contains(category)
            {
                errors.push(format!("product {label:?}: unknown category {category:?}"));
            }
            if let Some(sub) = &product.subcategory {
                match parents.get(sub) {
                    None => errors.push(format!("product {label:?}: unknown subcategory {sub:?}")),
                    Some(parent) if product.category.as_ref() != Some(parent) => errors.push(
                        format!("product {label:?}: subcategory {sub:?} does not belong to its category"),
                    ),
                    Some(_) => {}
                }
            }
        }

        errors
    }
}

/// Counts of upserted rows.
#[derive(Debug, Default)]
pub struct SeedResult {
    pub navbar_categories: usize,
    pub subcategories: usize,
    pub brands: usize,
    pub products: usize,
}

/// Seed the catalog from a YAML file.
pub async fn catalog(file_path: &str, dry_run: bool) -> Result<(), CommandError> {
    let path = Path::new(file_path);
    info!(path = %file_path, "Loading catalog from file");

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CommandError::Io {
            path: file_path.to_owned(),
            source,
        })?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;

    info!(
        navbar_categories = seed.navbar_categories.len(),
        brands = seed.brands.len(),
        products = seed.products.len(),
        "Parsed catalog"
    );

    let errors = seed.validate();
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(CommandError::InvalidSeed(errors.len()));
    }

    if dry_run {
        info!("Catalog is valid (dry run, nothing written)");
        return Ok(());
    }

    let pool = connect().await?;
    let result = apply(&pool, &seed).await?;

    info!("Seeding complete!");
    info!("  Navbar categories: {}", result.navbar_categories);
    info!("  Subcategories: {}", result.subcategories);
    info!("  Brands: {}", result.brands);
    info!("  Products: {}", result.products);
    Ok(())
}

async fn apply(pool: &sqlx::PgPool, seed: &CatalogSeed) -> Result<SeedResult, CommandError> {
    let catalog = CatalogRepository::new(pool);
    let products = ProductRepository::new(pool);
    let mut result = SeedResult::default();

    let mut navbar_ids: HashMap<String, NavbarCategoryId> = HashMap::new();
    let mut sub_ids: HashMap<String, CategoryId> = HashMap::new();

    for navbar in &seed.navbar_categories {
        let slug = slug_or_name(navbar.slug.as_deref(), &navbar.name);
        let id = catalog
            .upsert_navbar_category(
                &navbar.name,
                &slug,
                &navbar.description,
                navbar.image.as_deref(),
                navbar.order,
            )
            .await?;
        result.navbar_categories += 1;

        for sub in &navbar.subcategories {
            let sub_slug = slug_or_name(sub.slug.as_deref(), &sub.name);
            let sub_id = catalog
                .upsert_category(id, &sub.name, &sub_slug, sub.image.as_deref(), sub.order)
                .await?;
            sub_ids.insert(sub_slug, sub_id);
            result.subcategories += 1;
        }
        navbar_ids.insert(slug, id);
    }

    for brand in &seed.brands {
        let slug = slug_or_name(brand.slug.as_deref(), &brand.name);
        catalog
            .upsert_brand(
                &brand.name,
                &slug,
                brand.image.as_deref(),
                &brand.redirect_url,
                brand.brand_type,
                brand.order,
            )
            .await?;
        result.brands += 1;
    }

    for product in &seed.products {
        let write = ProductWrite {
            name: product.name.clone(),
            brand: product.brand.clone(),
            slug: slug_or_name(product.slug.as_deref(), &product.name),
            price: product.price,
            original_price: product.original_price,
            image: product.image.clone(),
            badge: product.badge,
            category_id: product
                .category
                .as_ref()
                .and_then(|slug| navbar_ids.get(slug).copied()),
            sub_category_id: product
                .subcategory
                .as_ref()
                .and_then(|slug| sub_ids.get(slug).copied()),
            description: product.description.clone(),
            is_featured: product.featured,
            is_active: product.active,
            stock: product.stock,
        };
        let id = products.upsert_by_slug(&write).await?;
        products.replace_images(id, &product.images).await?;
        result.products += 1;
    }

    Ok(result)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
navbar_categories:
  - name: Audio
    order: 1
    subcategories:
      - name: Earbuds
      - name: Speakers
  - name: Phones
    subcategories:
      - name: Android Phones
brands:
  - name: Anker
    type: accessories
    redirect_url: /accessories?brand=Anker
products:
  - name: Pixel Buds Pro
    brand: Google
    price: "18500.00"
    category: audio
    subcategory: earbuds
    stock: 12
    images: [products/pixel-buds-1.jpg]
"#;

    #[test]
    fn test_sample_parses_and_validates() {
        let seed: CatalogSeed = serde_yaml::from_str(SAMPLE).unwrap();
        assert_eq!(seed.navbar_categories.len(), 2);
        assert_eq!(seed.navbar_categories[0].subcategories.len(), 2);
        assert_eq!(seed.brands[0].brand_type, BrandType::Accessories);
        assert_eq!(seed.products[0].price, Decimal::new(1_850_000, 2));
        assert!(seed.products[0].active);
        assert!(seed.validate().is_empty());
    }

    #[test]
    fn test_subcategory_must_belong_to_category() {
        let mut seed: CatalogSeed = serde_yaml::from_str(SAMPLE).unwrap();
        seed.products[0].category = Some("phones".to_owned());
        let errors = seed.validate();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("does not belong"));
    }

    #[test]
    fn test_unknown_references_and_duplicates() {
        let mut seed: CatalogSeed = serde_yaml::from_str(SAMPLE).unwrap();
        seed.products[0].category = Some("watches".to_owned());
        seed.products[0].subcategory = Some("smartwatches".to_owned());
        seed.brands.push(BrandSeed {
            name: "Anker".to_owned(),
            slug: None,
            image: None,
            redirect_url: String::new(),
            brand_type: BrandType::Gadgets,
            order: 0,
        });

        let errors = seed.validate();
        assert!(errors.iter().any(|e| e.contains("unknown category")));
        assert!(errors.iter().any(|e| e.contains("unknown subcategory")));
        assert!(errors.iter().any(|e| e.contains("duplicate brand slug")));
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let result: Result<CatalogSeed, _> = serde_yaml::from_str("colours: []");
        assert!(result.is_err());
    }
}
