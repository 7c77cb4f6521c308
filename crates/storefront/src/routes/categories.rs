//! Taxonomy and brand showcase route handlers.
//!
//! Everything here reads the cached taxonomy.

use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use tracing::instrument;

use gadzilla_core::BrandType;

use crate::error::{AppError, Result};
use crate::models::{BrandView, CategoryView, NavbarCategoryView, SubcategoryView};
use crate::state::AppState;

/// Active navbar categories with nested subcategories.
#[instrument(skip(state))]
pub async fn navbar_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<NavbarCategoryView>>> {
    let taxonomy = state.catalog().taxonomy(state.pool()).await?;
    let media = state.media();
    Ok(Json(
        taxonomy
            .navbar
            .iter()
            .map(|n| NavbarCategoryView::new(n, &taxonomy.categories, media))
            .collect(),
    ))
}

/// One active navbar category by slug.
#[instrument(skip(state))]
pub async fn navbar_category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<NavbarCategoryView>> {
    let taxonomy = state.catalog().taxonomy(state.pool()).await?;
    let navbar = taxonomy.navbar_by_slug(&slug).ok_or(AppError::NotFound)?;
    Ok(Json(NavbarCategoryView::new(
        navbar,
        &taxonomy.categories,
        state.media(),
    )))
}

#[derive(Debug, Deserialize)]
pub struct CategoryListQuery {
    pub navbar_category: Option<String>,
}

/// Active subcategories, optionally of one navbar category.
#[instrument(skip(state))]
pub async fn categories(
    State(state): State<AppState>,
    Query(query): Query<CategoryListQuery>,
) -> Result<Json<Vec<CategoryView>>> {
    let taxonomy = state.catalog().taxonomy(state.pool()).await?;
    let parent = query
        .navbar_category
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    let media = state.media();
    Ok(Json(
        taxonomy
            .categories_of(parent)
            .iter()
            .map(|c| CategoryView::new(c, media))
            .collect(),
    ))
}

/// One active subcategory by slug.
#[instrument(skip(state))]
pub async fn category(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<CategoryView>> {
    let taxonomy = state.catalog().taxonomy(state.pool()).await?;
    let category = taxonomy.category_by_slug(&slug).ok_or(AppError::NotFound)?;
    Ok(Json(CategoryView::new(category, state.media())))
}

/// Subcategories of a navbar category, in display order.
#[instrument(skip(state))]
pub async fn subcategories(
    State(state): State<AppState>,
    Path(parent_slug): Path<String>,
) -> Result<Json<Vec<SubcategoryView>>> {
    let taxonomy = state.catalog().taxonomy(state.pool()).await?;
    let mut children = taxonomy.categories_of(Some(&parent_slug));
    children.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then_with(|| a.name.cmp(&b.name))
    });

    let media = state.media();
    Ok(Json(
        children
            .iter()
            .map(|c| SubcategoryView::new(c, media))
            .collect(),
    ))
}

#[derive(Debug, Deserialize)]
pub struct ShowcaseQuery {
    #[serde(rename = "type")]
    pub brand_type: Option<String>,
}

/// Active showcase brands. An unknown `type` matches nothing.
#[instrument(skip(state))]
pub async fn brand_showcase(
    State(state): State<AppState>,
    Query(query): Query<ShowcaseQuery>,
) -> Result<Json<Vec<BrandView>>> {
    let brand_type = match query.brand_type.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match raw.parse::<BrandType>() {
            Ok(t) => Some(t),
            Err(_) => return Ok(Json(Vec::new())),
        },
    };

    let brands = state.catalog().brands(state.pool(), brand_type).await?;
    let media = state.media();
    Ok(Json(brands.iter().map(|b| BrandView::new(b, media)).collect()))
}
