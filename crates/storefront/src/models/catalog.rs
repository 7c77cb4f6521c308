//! Catalog models: taxonomy, products, showcase brands.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use gadzilla_core::{
    Badge, BrandId, BrandType, CategoryId, NavbarCategoryId, ProductId,
};

use super::MediaUrls;

/// Top-level navigation category (e.g. "Phones", "Audio").
#[derive(Debug, Clone)]
pub struct NavbarCategory {
    pub id: NavbarCategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub display_order: i32,
    pub is_active: bool,
}

/// Subcategory belonging to one navbar category.
#[derive(Debug, Clone)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub navbar_category_id: NavbarCategoryId,
    pub navbar_category_slug: String,
    pub display_order: i32,
    pub is_active: bool,
}

impl Category {
    /// Frontend link: `/{navbar}?type={sub}`.
    #[must_use]
    pub fn href(&self) -> String {
        format!("/{}?type={}", self.navbar_category_slug, self.slug)
    }
}

/// A sellable product.
#[derive(Debug, Clone)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub slug: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub badge: Option<Badge>,
    pub category_id: Option<NavbarCategoryId>,
    pub category_slug: Option<String>,
    pub sub_category_id: Option<CategoryId>,
    pub sub_category_slug: Option<String>,
    pub description: String,
    pub is_featured: bool,
    pub is_active: bool,
    pub stock: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Showcase brand tile.
#[derive(Debug, Clone)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub redirect_url: String,
    pub brand_type: BrandType,
    pub display_order: i32,
}

// =============================================================================
// Views
// =============================================================================

/// Product card shape used by lists, carts, orders and wishlists.
#[derive(Debug, Clone, Serialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: Decimal,
    #[serde(rename = "originalPrice")]
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub badge: Option<Badge>,
    pub category: Option<String>,
    #[serde(rename = "subCategory")]
    pub sub_category: Option<String>,
    pub slug: String,
    pub stock: i32,
}

impl ProductSummary {
    #[must_use]
    pub fn new(product: &Product, media: &MediaUrls) -> Self {
        Self {
            id: product.id,
            name: product.name.clone(),
            brand: product.brand.clone(),
            price: product.price,
            original_price: product.original_price,
            image: media.resolve(product.image.as_deref()),
            badge: product.badge,
            category: product.category_slug.clone(),
            sub_category: product.sub_category_slug.clone(),
            slug: product.slug.clone(),
            stock: product.stock,
        }
    }
}

/// Product page shape: the summary plus gallery and description.
#[derive(Debug, Serialize)]
pub struct ProductDetailView {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub slug: String,
    pub price: Decimal,
    #[serde(rename = "originalPrice")]
    pub original_price: Option<Decimal>,
    pub image: Option<String>,
    pub images: Vec<String>,
    pub badge: Option<Badge>,
    pub category: Option<String>,
    #[serde(rename = "subCategory")]
    pub sub_category: Option<String>,
    pub description: String,
    pub is_featured: bool,
    pub created_at: DateTime<Utc>,
    pub stock: i32,
}

impl ProductDetailView {
    #[must_use]
    pub fn new(product: Product, gallery: &[String], media: &MediaUrls) -> Self {
        Self {
            id: product.id,
            image: media.resolve(product.image.as_deref()),
            images: gallery
                .iter()
                .filter_map(|path| media.resolve(Some(path)))
                .collect(),
            name: product.name,
            brand: product.brand,
            slug: product.slug,
            price: product.price,
            original_price: product.original_price,
            badge: product.badge,
            category: product.category_slug,
            sub_category: product.sub_category_slug,
            description: product.description,
            is_featured: product.is_featured,
            created_at: product.created_at,
            stock: product.stock,
        }
    }
}

/// Subcategory nested under its navbar category.
#[derive(Debug, Clone, Serialize)]
pub struct SubcategoryView {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub href: String,
    pub order: i32,
}

impl SubcategoryView {
    #[must_use]
    pub fn new(category: &Category, media: &MediaUrls) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            image: media.resolve(category.image.as_deref()),
            href: category.href(),
            order: category.display_order,
        }
    }
}

/// Navbar category with its active subcategories.
#[derive(Debug, Clone, Serialize)]
pub struct NavbarCategoryView {
    pub id: NavbarCategoryId,
    pub name: String,
    pub slug: String,
    pub description: String,
    pub image: Option<String>,
    pub href: String,
    pub order: i32,
    pub subcategories: Vec<SubcategoryView>,
}

impl NavbarCategoryView {
    /// Build the view, keeping only `children` that belong to `navbar`.
    #[must_use]
    pub fn new(navbar: &NavbarCategory, children: &[Category], media: &MediaUrls) -> Self {
        let href = if navbar.slug.is_empty() {
            "/".to_owned()
        } else {
            format!("/{}", navbar.slug)
        };
        Self {
            id: navbar.id,
            name: navbar.name.clone(),
            slug: navbar.slug.clone(),
            description: navbar.description.clone(),
            image: media.resolve(navbar.image.as_deref()),
            href,
            order: navbar.display_order,
            subcategories: children
                .iter()
                .filter(|c| c.navbar_category_id == navbar.id)
                .map(|c| SubcategoryView::new(c, media))
                .collect(),
        }
    }
}

/// Flat subcategory with its parent slug.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryView {
    pub id: CategoryId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    pub href: String,
    pub order: i32,
    #[serde(rename = "navbarCategorySlug")]
    pub navbar_category_slug: String,
}

impl CategoryView {
    #[must_use]
    pub fn new(category: &Category, media: &MediaUrls) -> Self {
        Self {
            id: category.id,
            name: category.name.clone(),
            slug: category.slug.clone(),
            image: media.resolve(category.image.as_deref()),
            href: category.href(),
            order: category.display_order,
            navbar_category_slug: category.navbar_category_slug.clone(),
        }
    }
}

/// Showcase brand tile.
#[derive(Debug, Clone, Serialize)]
pub struct BrandView {
    pub id: BrandId,
    pub name: String,
    pub slug: String,
    pub image: Option<String>,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
    #[serde(rename = "brandType")]
    pub brand_type: BrandType,
    pub order: i32,
}

impl BrandView {
    #[must_use]
    pub fn new(brand: &Brand, media: &MediaUrls) -> Self {
        Self {
            id: brand.id,
            name: brand.name.clone(),
            slug: brand.slug.clone(),
            image: media.resolve(brand.image.as_deref()),
            redirect_url: brand.redirect_url.clone(),
            brand_type: brand.brand_type,
            order: brand.display_order,
        }
    }
}

/// Derive a URL slug from a display name.
///
/// Lowercases ASCII alphanumerics and joins runs of anything else with a
/// single hyphen.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    slug
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn sample_product() -> Product {
        Product {
            id: "6f1c1f0e-7d43-4a51-9a3b-1d2f3e4a5b6c".parse().unwrap(),
            name: "Pixel Buds".to_owned(),
            brand: "Google".to_owned(),
            slug: "pixel-buds".to_owned(),
            price: Decimal::new(1_250_000, 2),
            original_price: Some(Decimal::new(1_400_000, 2)),
            image: Some("products/buds.jpg".to_owned()),
            badge: Some(Badge::Sale),
            category_id: Some(NavbarCategoryId::new(1)),
            category_slug: Some("audio".to_owned()),
            sub_category_id: Some(CategoryId::new(3)),
            sub_category_slug: Some("earbuds".to_owned()),
            description: "Wireless earbuds".to_owned(),
            is_featured: true,
            is_active: true,
            stock: 7,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_summary_uses_frontend_field_names() {
        let media = MediaUrls::new("https://cdn.test/media");
        let json = serde_json::to_value(ProductSummary::new(&sample_product(), &media)).unwrap();
        assert_eq!(json["originalPrice"], "14000.00");
        assert_eq!(json["price"], "12500.00");
        assert_eq!(json["subCategory"], "earbuds");
        assert_eq!(json["category"], "audio");
        assert_eq!(json["badge"], "sale");
        assert_eq!(json["image"], "https://cdn.test/media/products/buds.jpg");
    }

    #[test]
    fn test_detail_resolves_gallery() {
        let media = MediaUrls::new("https://cdn.test/media");
        let gallery = vec!["products/a.jpg".to_owned(), "products/b.jpg".to_owned()];
        let detail = ProductDetailView::new(sample_product(), &gallery, &media);
        assert_eq!(
            detail.images,
            vec![
                "https://cdn.test/media/products/a.jpg",
                "https://cdn.test/media/products/b.jpg"
            ]
        );
    }

    #[test]
    fn test_navbar_view_filters_children() {
        let media = MediaUrls::new("/media");
        let navbar = NavbarCategory {
            id: NavbarCategoryId::new(1),
            name: "Audio".to_owned(),
            slug: "audio".to_owned(),
            description: String::new(),
            image: None,
            display_order: 0,
            is_active: true,
        };
        let child = |id, parent: i32| Category {
            id: CategoryId::new(id),
            name: format!("Sub {id}"),
            slug: format!("sub-{id}"),
            image: None,
            navbar_category_id: NavbarCategoryId::new(parent),
            navbar_category_slug: "audio".to_owned(),
            display_order: 0,
            is_active: true,
        };
        let view = NavbarCategoryView::new(&navbar, &[child(1, 1), child(2, 9)], &media);
        assert_eq!(view.href, "/audio");
        assert_eq!(view.subcategories.len(), 1);
        assert_eq!(view.subcategories[0].href, "/audio?type=sub-1");
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Galaxy S24 Ultra"), "galaxy-s24-ultra");
        assert_eq!(slugify("  USB-C -- Cable!! "), "usb-c-cable");
        assert_eq!(slugify("!!!"), "");
    }
}
