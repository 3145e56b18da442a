//! Storefront catalog reads: product listing, product detail, categories and
//! facet counts.

use axum::{
    extract::{Path, Query, RawQuery, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use storefront_core::{
    build_query, CatalogError, CategoryFacet, FilterRequest, Product, QueryPlan, ResultPage,
    Surface,
};

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CategoriesQuery {
    #[serde(default)]
    pub counts: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub(super) enum CategoryListing {
    Names(Vec<String>),
    Counted(Vec<CategoryFacet>),
}

/// Parses the raw query string for `surface`, logging anything that had to
/// be coerced.
pub(super) fn plan_from_query(raw: Option<&str>, surface: Surface, page_size: u32) -> QueryPlan {
    let request = FilterRequest::from_query(raw.unwrap_or_default());
    let plan = build_query(&request, surface, page_size);
    for coercion in &plan.coercions {
        tracing::debug!(%coercion, "coerced filter input");
    }
    plan
}

/// GET /api/v1/products
pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ApiResponse<ResultPage<Product>>>, ApiError> {
    let plan = plan_from_query(raw.as_deref(), Surface::Storefront, state.config.page_size);

    let page = state
        .bounded(storefront_db::list_products(&state.pool, state.tenant(), &plan))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    if page.was_clamped() {
        tracing::debug!(
            requested = page.requested_page,
            served = page.page,
            "page out of range; served last page"
        );
    }

    Ok(Json(ApiResponse::new(page, req_id.0)))
}

/// GET /api/v1/products/{code}
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let product = state
        .bounded(storefront_db::get_product(&state.pool, state.tenant(), &code))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?
        .ok_or_else(|| ApiError::from_catalog(req_id.0.clone(), &CatalogError::NotFound(code)))?;

    Ok(Json(ApiResponse::new(product, req_id.0)))
}

/// GET /api/v1/categories[?counts=true]
pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CategoriesQuery>,
) -> Result<Json<ApiResponse<CategoryListing>>, ApiError> {
    let listing = if query.counts {
        state
            .bounded(storefront_db::list_category_counts(&state.pool, state.tenant()))
            .await
            .map(CategoryListing::Counted)
    } else {
        state
            .bounded(storefront_db::list_categories(&state.pool, state.tenant()))
            .await
            .map(CategoryListing::Names)
    }
    .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(listing, req_id.0)))
}

/// GET /api/v1/categories/facets
///
/// Counts per category under the request's search and price filters. If
/// counting fails the category names are still returned, without counts.
pub(super) async fn category_facets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ApiResponse<Vec<CategoryFacet>>>, ApiError> {
    let plan = plan_from_query(raw.as_deref(), Surface::Storefront, state.config.page_size);
    let categories = state
        .bounded(storefront_db::list_categories(&state.pool, state.tenant()))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let counted = state
        .bounded(storefront_db::count_category_facets(
            &state.pool,
            state.tenant(),
            &plan,
            &categories,
        ))
        .await;
    let facets = match counted {
        Ok(facets) => facets,
        Err(e) => {
            tracing::warn!(error = %e, "facet aggregation failed; returning names only");
            categories.into_iter().map(CategoryFacet::uncounted).collect()
        }
    };

    Ok(Json(ApiResponse::new(facets, req_id.0)))
}
