//! Admin catalog writes and the admin product listing.

use axum::{
    extract::{Path, RawQuery, State},
    http::StatusCode,
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use storefront_core::{CatalogError, Product, ResultPage, Surface};
use storefront_db::{DbError, NewProduct, ProductPatch};

use crate::middleware::RequestId;

use super::super::catalog::plan_from_query;
use super::super::{map_db_error, map_unique_violation, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Request bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(in crate::api) struct CreateProductRequest {
    #[serde(alias = "codigo")]
    pub code: String,
    #[serde(alias = "nombre")]
    pub name: String,
    #[serde(alias = "precio")]
    pub price: Option<Decimal>,
    #[serde(alias = "descripcion")]
    pub description: Option<String>,
    #[serde(alias = "imagen_url")]
    pub image_url: Option<String>,
    #[serde(alias = "categoria")]
    pub category: Option<String>,
}

// Outer None = "not in request", Some(None) = "explicitly cleared".
#[allow(clippy::option_option)]
#[derive(Debug, Default, Deserialize)]
pub(in crate::api) struct UpdateProductRequest {
    #[serde(alias = "nombre")]
    pub name: Option<String>,
    #[serde(alias = "precio")]
    pub price: Option<Decimal>,
    #[serde(default, alias = "descripcion", deserialize_with = "double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, alias = "imagen_url", deserialize_with = "double_option")]
    pub image_url: Option<Option<String>>,
    #[serde(default, alias = "categoria", deserialize_with = "double_option")]
    pub category: Option<Option<String>>,
}

#[derive(Debug, Deserialize)]
pub(in crate::api) struct RenameCategoryRequest {
    #[serde(alias = "oldName")]
    pub old_name: String,
    #[serde(alias = "newName")]
    pub new_name: String,
}

// ---------------------------------------------------------------------------
// Response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(in crate::api) struct DeletedResponse {
    pub code: String,
    pub deleted: bool,
}

#[derive(Debug, Serialize)]
pub(in crate::api) struct RenamedResponse {
    pub updated: u64,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Distinguishes an explicit `null` (`Some(None)`) from an absent field
/// (`None`, via `#[serde(default)]`).
#[allow(clippy::option_option)]
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

fn blank_to_none(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn validate_price(req_id: &str, price: Decimal) -> Result<(), ApiError> {
    if price < Decimal::ZERO {
        return Err(ApiError::new(
            req_id,
            "validation_error",
            format!("price must not be negative, got {price}"),
        ));
    }
    Ok(())
}

fn map_missing(req_id: &str, code: &str, error: &DbError) -> ApiError {
    if matches!(error, DbError::NotFound) {
        return ApiError::from_catalog(req_id, &CatalogError::NotFound(code.to_owned()));
    }
    map_db_error(req_id.to_owned(), error)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/admin/products: same filters as the storefront, searching
/// code and description too and sorting by code by default.
pub(in crate::api) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    RawQuery(raw): RawQuery,
) -> Result<Json<ApiResponse<ResultPage<Product>>>, ApiError> {
    let mut plan = plan_from_query(raw.as_deref(), Surface::Admin, state.config.admin_page_size);
    plan.categories.retain(|c| !c.eq_ignore_ascii_case("all"));

    let page = state
        .bounded(storefront_db::list_products(&state.pool, state.tenant(), &plan))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(page, req_id.0)))
}

/// POST /api/v1/admin/products
pub(in crate::api) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<Product>>), ApiError> {
    let rid = &req_id.0;

    let code = body.code.trim();
    let name = body.name.trim();
    let Some(price) = body.price else {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "code, name and price are required",
        ));
    };
    if code.is_empty() || name.is_empty() {
        return Err(ApiError::new(
            rid,
            "validation_error",
            "code, name and price are required",
        ));
    }
    validate_price(rid, price)?;

    let new_product = NewProduct {
        code,
        name,
        description: blank_to_none(body.description.as_deref()),
        price,
        image_url: blank_to_none(body.image_url.as_deref()),
        category: blank_to_none(body.category.as_deref()),
    };
    let product = state
        .bounded(storefront_db::create_product(&state.pool, state.tenant(), &new_product))
        .await
        .map_err(|e| map_unique_violation(rid, &e, format!("product '{code}' already exists")))?;

    tracing::info!(code = %product.code, "product created");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(product, req_id.0)),
    ))
}

/// PATCH (or PUT) /api/v1/admin/products/{code}: only supplied fields change.
pub(in crate::api) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(code): Path<String>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<Product>>, ApiError> {
    let rid = &req_id.0;

    let name = body.name.as_deref().map(str::trim);
    if name.is_some_and(str::is_empty) {
        return Err(ApiError::new(rid, "validation_error", "name must not be blank"));
    }
    if let Some(price) = body.price {
        validate_price(rid, price)?;
    }

    let patch = ProductPatch {
        name,
        description: body.description.as_ref().map(|v| blank_to_none(v.as_deref())),
        price: body.price,
        image_url: body.image_url.as_ref().map(|v| blank_to_none(v.as_deref())),
        category: body.category.as_ref().map(|v| blank_to_none(v.as_deref())),
    };
    if patch.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "no fields to update"));
    }

    let product = state
        .bounded(storefront_db::update_product(&state.pool, state.tenant(), &code, &patch))
        .await
        .map_err(|e| map_missing(rid, &code, &e))?;

    Ok(Json(ApiResponse::new(product, req_id.0)))
}

/// DELETE /api/v1/admin/products/{code}
pub(in crate::api) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<DeletedResponse>>, ApiError> {
    state
        .bounded(storefront_db::delete_product(&state.pool, state.tenant(), &code))
        .await
        .map_err(|e| map_missing(&req_id.0, &code, &e))?;

    tracing::info!(%code, "product deleted");
    Ok(Json(ApiResponse::new(
        DeletedResponse {
            code,
            deleted: true,
        },
        req_id.0,
    )))
}

/// PUT /api/v1/admin/categories: move every product in `old_name` to
/// `new_name`.
pub(in crate::api) async fn rename_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<RenameCategoryRequest>,
) -> Result<Json<ApiResponse<RenamedResponse>>, ApiError> {
    let old_name = body.old_name.trim();
    let new_name = body.new_name.trim();
    if old_name.is_empty() || new_name.is_empty() {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            "old_name and new_name are required",
        ));
    }

    let updated = state
        .bounded(storefront_db::rename_category(
            &state.pool,
            state.tenant(),
            old_name,
            new_name,
        ))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(old_name, new_name, updated, "category renamed");
    Ok(Json(ApiResponse::new(RenamedResponse { updated }, req_id.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_request_distinguishes_null_from_absent() {
        let body: UpdateProductRequest =
            serde_json::from_str(r#"{"description": null, "categoria": "Audio"}"#).expect("parse");
        assert_eq!(body.description, Some(None));
        assert_eq!(body.image_url, None);
        assert_eq!(body.category, Some(Some("Audio".to_owned())));
    }

    #[test]
    fn create_request_accepts_legacy_keys() {
        let body: CreateProductRequest = serde_json::from_str(
            r#"{"codigo": "A1", "nombre": "Amp", "precio": 10.5, "imagen_url": null}"#,
        )
        .expect("parse");
        assert_eq!(body.code, "A1");
        assert_eq!(body.price, Some(Decimal::new(105, 1)));
        assert_eq!(body.image_url, None);
    }

    #[test]
    fn rename_request_accepts_camel_case() {
        let body: RenameCategoryRequest =
            serde_json::from_str(r#"{"oldName": "Audio", "newName": "Sound"}"#).expect("parse");
        assert_eq!(body.old_name, "Audio");
        assert_eq!(body.new_name, "Sound");
    }
}
