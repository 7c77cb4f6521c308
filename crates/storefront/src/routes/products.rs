//! Product catalog route handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use crate::db::products::{ProductFilter, ProductRef, ProductRepository};
use crate::error::{AppError, Result};
use crate::models::{Page, PageQuery, ProductDetailView, ProductSummary};
use crate::services::conversions::{self, ConversionEvent};
use crate::state::AppState;

/// Most results returned by the live search box.
const SEARCH_LIMIT: i64 = 10;

/// Shortest search term that is looked up.
const SEARCH_MIN_CHARS: usize = 2;

/// Related products shown on a product page.
const RELATED_LIMIT: i64 = 4;

/// Query parameters for the product list.
#[derive(Debug, Default, Deserialize)]
pub struct ProductListQuery {
    /// Comma-separated navbar category slugs.
    pub category: Option<String>,
    pub subcategory: Option<String>,
    /// Comma-separated brand names.
    pub brand: Option<String>,
    pub featured: Option<String>,
    pub hot_deals: Option<String>,
}

impl ProductListQuery {
    fn into_filter(self) -> ProductFilter {
        ProductFilter {
            categories: split_csv(self.category.as_deref()),
            subcategory: self
                .subcategory
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            brands: split_csv(self.brand.as_deref()),
            featured: is_true(self.featured.as_deref()),
            hot_deals: is_true(self.hot_deals.as_deref()),
        }
    }
}

fn split_csv(raw: Option<&str>) -> Vec<String> {
    raw.unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

fn is_true(raw: Option<&str>) -> bool {
    raw.is_some_and(|v| v.trim().eq_ignore_ascii_case("true"))
}

/// List active products, newest first.
#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductListQuery>,
    Query(page): Query<PageQuery>,
) -> Result<Json<Page<ProductSummary>>> {
    let filter = query.into_filter();
    let (products, count) = ProductRepository::new(state.pool())
        .list(&filter, &page)
        .await?;

    let media = state.media();
    Ok(Json(
        Page::new(products, count, &page).map(|p| ProductSummary::new(&p, media)),
    ))
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    pub q: Option<String>,
}

/// Live search over name, brand and description.
#[instrument(skip(state))]
pub async fn search(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<ProductSummary>>> {
    let term = query.q.as_deref().map(str::trim).unwrap_or_default();
    if term.chars().count() < SEARCH_MIN_CHARS {
        return Ok(Json(Vec::new()));
    }

    let products = ProductRepository::new(state.pool())
        .search(term, SEARCH_LIMIT)
        .await?;

    conversions::dispatch(
        state.conversions(),
        ConversionEvent::Search {
            query: term.to_owned(),
        },
    );

    let media = state.media();
    Ok(Json(
        products
            .iter()
            .map(|p| ProductSummary::new(p, media))
            .collect(),
    ))
}

/// Active product by UUID or slug.
#[instrument(skip(state))]
pub async fn detail(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<ProductDetailView>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .find_active(&ProductRef::parse(&identifier))
        .await?
        .ok_or(AppError::NotFound)?;
    let gallery = repo.images(product.id).await?;

    conversions::dispatch(
        state.conversions(),
        ConversionEvent::ViewContent {
            product_id: product.id,
            value: product.price,
        },
    );

    Ok(Json(ProductDetailView::new(product, &gallery, state.media())))
}

/// Up to four other active products from the same category.
#[instrument(skip(state))]
pub async fn related(
    State(state): State<AppState>,
    Path(identifier): Path<String>,
) -> Result<Json<Vec<ProductSummary>>> {
    let repo = ProductRepository::new(state.pool());
    let product = repo
        .find_active(&ProductRef::parse(&identifier))
        .await?
        .ok_or(AppError::NotFound)?;
    let related = repo.related(&product, RELATED_LIMIT).await?;

    let media = state.media();
    Ok(Json(
        related
            .iter()
            .map(|p| ProductSummary::new(p, media))
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct BrandNamesQuery {
    /// Navbar category slug.
    pub category: Option<String>,
}

/// Distinct brand names of active products, alphabetically.
#[instrument(skip(state))]
pub async fn brand_names(
    State(state): State<AppState>,
    Query(query): Query<BrandNamesQuery>,
) -> Result<Json<Vec<String>>> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let brands = ProductRepository::new(state.pool())
        .brand_names(category)
        .await?;
    Ok(Json(brands))
}
