//! Staff product management.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use gadzilla_core::{Badge, CategoryId, NavbarCategoryId, ProductId};

use super::nullable;
use crate::checkout::ValidationErrors;
use crate::db::catalog::CatalogRepository;
use crate::db::products::{ProductRepository, ProductWrite};
use crate::error::{ApiJson, AppError, Result};
use crate::middleware::RequireStaff;
use crate::models::catalog::slugify;
use crate::models::{MediaUrls, Page, PageQuery, Product, ProductSummary};
use crate::state::AppState;

const MAX_NAME_LEN: usize = 255;
const REQUIRED: &str = "Required.";
const NOT_A_NUMBER: &str = "A valid number is required.";
const NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";

/// Product as staff see it, inactive flag and description included.
#[derive(Debug, Serialize)]
pub struct AdminProductView {
    #[serde(flatten)]
    pub summary: ProductSummary,
    pub description: String,
    pub is_featured: bool,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AdminProductView {
    #[must_use]
    pub fn new(product: &Product, media: &MediaUrls) -> Self {
        Self {
            summary: ProductSummary::new(product, media),
            description: product.description.clone(),
            is_featured: product.is_featured,
            is_active: product.is_active,
            created_at: product.created_at,
            updated_at: product.updated_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductSearchQuery {
    pub q: Option<String>,
}

/// Every product, newest first, optionally filtered by name, brand or slug.
#[instrument(skip(state, _staff))]
pub async fn list(
    State(state): State<AppState>,
    RequireStaff(_staff): RequireStaff,
    Query(search): Query<ProductSearchQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<AdminProductView>>> {
    let term = search.q.as_deref().map(str::trim).filter(|q| !q.is_empty());
    let (products, count) = ProductRepository::new(state.pool())
        .list_all(term, &page)
        .await?;
    let media = state.media();
    Ok(Json(
        Page::new(products, count, &page).map(|p| AdminProductView::new(&p, media)),
    ))
}

/// Create and edit body. On edit, absent fields keep their value and `null`
/// clears nullable ones.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ProductRequest {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub slug: Option<String>,
    pub price: Option<Value>,
    #[serde(deserialize_with = "nullable")]
    pub original_price: Option<Option<Value>>,
    #[serde(deserialize_with = "nullable")]
    pub image: Option<Option<String>>,
    #[serde(deserialize_with = "nullable")]
    pub badge: Option<Option<Badge>>,
    #[serde(deserialize_with = "nullable")]
    pub category_id: Option<Option<NavbarCategoryId>>,
    #[serde(deserialize_with = "nullable")]
    pub sub_category_id: Option<Option<CategoryId>>,
    pub description: Option<String>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    pub stock: Option<Value>,
}

impl ProductRequest {
    /// Merge onto `existing` (edit) or onto defaults (create) and check the
    /// fields that need no database access.
    ///
    /// # Errors
    ///
    /// Returns every field error found.
    pub fn into_write(
        self,
        existing: Option<&Product>,
    ) -> std::result::Result<ProductWrite, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let creating = existing.is_none();
        let mut write = existing.map_or_else(blank_write, ProductWrite::from);

        if let Some(name) = text_field(&mut errors, "name", self.name, creating) {
            write.name = name;
        }
        if let Some(brand) = text_field(&mut errors, "brand", self.brand, creating) {
            write.brand = brand;
        }

        match self.slug.as_deref().map(str::trim) {
            Some(slug) if !slug.is_empty() => write.slug = slugify(slug),
            _ if creating => write.slug = slugify(&write.name),
            _ => {}
        }
        if write.slug.is_empty() && !write.name.is_empty() {
            errors.add("slug", "Enter a valid slug.");
        }

        match self.price {
            Some(raw) => {
                if let Some(price) = money_field(&mut errors, "price", &raw) {
                    write.price = price;
                }
            }
            None if creating => errors.add("price", REQUIRED),
            None => {}
        }
        if let Some(original) = self.original_price {
            write.original_price =
                original.and_then(|raw| money_field(&mut errors, "original_price", &raw));
        }

        if let Some(image) = self.image {
            write.image = image.map(|i| i.trim().to_owned()).filter(|i| !i.is_empty());
        }
        if let Some(badge) = self.badge {
            write.badge = badge;
        }
        if let Some(category_id) = self.category_id {
            write.category_id = category_id;
        }
        if let Some(sub_category_id) = self.sub_category_id {
            write.sub_category_id = sub_category_id;
        }
        if let Some(description) = self.description {
            write.description = description;
        }
        if let Some(is_featured) = self.is_featured {
            write.is_featured = is_featured;
        }
        if let Some(is_active) = self.is_active {
            write.is_active = is_active;
        }
        if let Some(raw) = self.stock
            && let Some(stock) = stock_field(&mut errors, &raw)
        {
            write.stock = stock;
        }

        errors.into_result(write)
    }
}

fn blank_write() -> ProductWrite {
    ProductWrite {
        name: String::new(),
        brand: String::new(),
        slug: String::new(),
        price: Decimal::ZERO,
        original_price: None,
        image: None,
        badge: None,
        category_id: None,
        sub_category_id: None,
        description: String::new(),
        is_featured: false,
        is_active: true,
        stock: 0,
    }
}

/// Trimmed, non-blank, bounded text. Absent is an error only when `required`.
fn text_field(
    errors: &mut ValidationErrors,
    field: &str,
    value: Option<String>,
    required: bool,
) -> Option<String> {
    let Some(value) = value.map(|v| v.trim().to_owned()) else {
        if required {
            errors.add(field, REQUIRED);
        }
        return None;
    };
    if value.is_empty() {
        errors.add(field, REQUIRED);
        return None;
    }
    if value.chars().count() > MAX_NAME_LEN {
        errors.add(
            field,
            format!("Ensure this field has no more than {MAX_NAME_LEN} characters."),
        );
        return None;
    }
    Some(value)
}

/// Non-negative amount given as a JSON number or numeric string.
fn money_field(errors: &mut ValidationErrors, field: &str, raw: &Value) -> Option<Decimal> {
    let parsed = match raw {
        Value::String(s) => s.trim().parse::<Decimal>().ok(),
        Value::Number(n) => n.to_string().parse::<Decimal>().ok(),
        _ => None,
    };
    match parsed {
        None => {
            errors.add(field, NOT_A_NUMBER);
            None
        }
        Some(amount) if amount < Decimal::ZERO => {
            errors.add(field, NEGATIVE);
            None
        }
        Some(amount) => Some(amount.round_dp(2)),
    }
}

/// Non-negative JSON integer.
fn stock_field(errors: &mut ValidationErrors, raw: &Value) -> Option<i32> {
    match raw.as_i64() {
        Some(n) if n < 0 => {
            errors.add("stock", NEGATIVE);
            None
        }
        Some(n) => match i32::try_from(n) {
            Ok(n) => Some(n),
            Err(_) => {
                errors.add("stock", "Ensure this value is less than or equal to 2147483647.");
                None
            }
        },
        None => {
            errors.add("stock", "A valid integer is required.");
            None
        }
    }
}

/// Check the category references against the taxonomy.
async fn check_taxonomy(state: &AppState, write: &ProductWrite) -> Result<()> {
    let catalog = CatalogRepository::new(state.pool());
    let mut errors = ValidationErrors::new();

    if let Some(category_id) = write.category_id
        && !catalog.navbar_category_exists(category_id).await?
    {
        errors.add("category_id", "Invalid category.");
    }

    if let Some(sub_category_id) = write.sub_category_id {
        match catalog.parent_of(sub_category_id).await? {
            None => errors.add("sub_category_id", "Invalid subcategory."),
            Some(parent) if Some(parent) != write.category_id => errors.add(
                "sub_category",
                "Subcategory must belong to the selected category.",
            ),
            Some(_) => {}
        }
    }

    errors.into_result(()).map_err(AppError::from)
}

async fn load(state: &AppState, id: ProductId) -> Result<Product> {
    ProductRepository::new(state.pool())
        .get(id)
        .await?
        .ok_or(AppError::NotFound)
}

fn parse_product_id(raw: &str) -> Result<ProductId> {
    raw.parse().map_err(|_| AppError::NotFound)
}

/// Create a product.
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<(StatusCode, Json<AdminProductView>)> {
    let write = body.into_write(None)?;
    check_taxonomy(&state, &write).await?;

    let id = ProductRepository::new(state.pool()).create(&write).await?;
    tracing::info!(product_id = %id, slug = %write.slug, "Product created");

    let product = load(&state, id).await?;
    Ok((
        StatusCode::CREATED,
        Json(AdminProductView::new(&product, state.media())),
    ))
}

/// Edit a product. Absent fields are left unchanged.
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn update(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<ProductRequest>,
) -> Result<Json<AdminProductView>> {
    let id = parse_product_id(&id)?;
    let existing = load(&state, id).await?;
    let write = body.into_write(Some(&existing))?;
    check_taxonomy(&state, &write).await?;

    ProductRepository::new(state.pool()).update(id, &write).await?;
    tracing::info!(product_id = %id, "Product updated");

    let product = load(&state, id).await?;
    Ok(Json(AdminProductView::new(&product, state.media())))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct StockRequest {
    pub stock: Option<Value>,
}

/// Overwrite a product's stock level.
#[instrument(skip(state, staff, body), fields(staff_id = %staff.id))]
pub async fn set_stock(
    State(state): State<AppState>,
    RequireStaff(staff): RequireStaff,
    Path(id): Path<String>,
    ApiJson(body): ApiJson<StockRequest>,
) -> Result<Json<AdminProductView>> {
    let id = parse_product_id(&id)?;
    let mut errors = ValidationErrors::new();
    let stock = match body.stock {
        Some(raw) => stock_field(&mut errors, &raw),
        None => {
            errors.add("stock", REQUIRED);
            None
        }
    };
    let stock = errors.into_result(stock)?.unwrap_or_default();

    ProductRepository::new(state.pool())
        .set_stock(id, stock)
        .await?;
    tracing::info!(product_id = %id, stock, "Stock set by staff");

    let product = load(&state, id).await?;
    Ok(Json(AdminProductView::new(&product, state.media())))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::catalog::tests::sample_product;

    fn request(body: Value) -> ProductRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_create_derives_slug_and_defaults() {
        let write = request(json!({
            "name": "Galaxy Buds 3 Pro",
            "brand": "Samsung",
            "price": "149.99",
        }))
        .into_write(None)
        .unwrap();

        assert_eq!(write.slug, "galaxy-buds-3-pro");
        assert_eq!(write.price, Decimal::new(14999, 2));
        assert!(write.is_active);
        assert_eq!(write.stock, 0);
    }

    #[test]
    fn test_create_requires_name_brand_price() {
        let errors = request(json!({})).into_write(None).unwrap_err();
        assert_eq!(errors.field("name").unwrap(), [REQUIRED]);
        assert_eq!(errors.field("brand").unwrap(), [REQUIRED]);
        assert_eq!(errors.field("price").unwrap(), [REQUIRED]);
    }

    #[test]
    fn test_rejects_negative_price_and_stock() {
        let errors = request(json!({
            "name": "Cable",
            "brand": "Anker",
            "price": -1,
            "stock": -3,
        }))
        .into_write(None)
        .unwrap_err();
        assert_eq!(errors.field("price").unwrap(), [NEGATIVE]);
        assert_eq!(errors.field("stock").unwrap(), [NEGATIVE]);
    }

    #[test]
    fn test_edit_keeps_absent_fields_and_clears_null() {
        let mut existing = sample_product();
        existing.original_price = Some(Decimal::new(12000, 2));

        let write = request(json!({ "price": 90, "original_price": null }))
            .into_write(Some(&existing))
            .unwrap();

        assert_eq!(write.name, existing.name);
        assert_eq!(write.slug, existing.slug);
        assert_eq!(write.price, Decimal::new(90, 0));
        assert_eq!(write.original_price, None);
        assert_eq!(write.stock, existing.stock);
    }

    #[test]
    fn test_stock_must_be_integer() {
        let mut errors = ValidationErrors::new();
        assert_eq!(stock_field(&mut errors, &json!(7)), Some(7));
        assert_eq!(stock_field(&mut errors, &json!("7")), None);
        assert_eq!(
            errors.field("stock").unwrap(),
            ["A valid integer is required."]
        );
    }
}
