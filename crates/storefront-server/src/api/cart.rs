use axum::{
    extract::{Path, State},
    Extension, Json,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_db::{CartItemRow, NewCartItem};

use crate::middleware::RequestId;
use crate::session::Shopper;

use super::{map_db_error, ApiError, ApiResponse, AppState};

const MAX_QUANTITY: i32 = 999;

#[derive(Debug, Deserialize)]
pub(super) struct CartItemRequest {
    #[serde(alias = "codigo")]
    pub code: String,
    pub name: String,
    pub price: Decimal,
    pub image: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Deserialize)]
pub(super) struct SyncCartRequest {
    pub items: Vec<CartItemRequest>,
}

#[derive(Debug, Serialize)]
pub(super) struct SyncCartResponse {
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct RemovedResponse {
    pub code: String,
    pub removed: bool,
}

fn default_quantity() -> i32 {
    1
}

impl CartItemRequest {
    fn validate(self, req_id: &str) -> Result<NewCartItem, ApiError> {
        let code = self.code.trim();
        let name = self.name.trim();
        if code.is_empty() || name.is_empty() {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                "code and name are required",
            ));
        }
        if self.price < Decimal::ZERO {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                format!("price must not be negative, got {}", self.price),
            ));
        }
        if !(1..=MAX_QUANTITY).contains(&self.quantity) {
            return Err(ApiError::new(
                req_id,
                "validation_error",
                format!("quantity must be 1-{MAX_QUANTITY}, got {}", self.quantity),
            ));
        }

        Ok(NewCartItem {
            product_code: code.to_owned(),
            product_name: name.to_owned(),
            product_price: self.price,
            product_image: self.image.filter(|i| !i.trim().is_empty()),
            quantity: self.quantity,
        })
    }
}

/// GET /api/v1/cart
pub(super) async fn list_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
) -> Result<Json<ApiResponse<Vec<CartItemRow>>>, ApiError> {
    let items = state
        .bounded(storefront_db::list_cart_items(&state.pool, shopper.user_id))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(items, req_id.0)))
}

/// POST /api/v1/cart: add a product, or overwrite its line if already present.
pub(super) async fn add_to_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
    Json(body): Json<CartItemRequest>,
) -> Result<Json<ApiResponse<CartItemRow>>, ApiError> {
    let item = body.validate(&req_id.0)?;
    let row = state
        .bounded(storefront_db::add_cart_item(&state.pool, shopper.user_id, &item))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// POST /api/v1/cart/sync: replace the whole cart with the client's copy.
pub(super) async fn sync_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
    Json(body): Json<SyncCartRequest>,
) -> Result<Json<ApiResponse<SyncCartResponse>>, ApiError> {
    let items = body
        .items
        .into_iter()
        .map(|item| item.validate(&req_id.0))
        .collect::<Result<Vec<_>, _>>()?;

    let count = state
        .bounded(storefront_db::replace_cart(&state.pool, shopper.user_id, &items))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::debug!(user_id = %shopper.user_id, count, "cart synced");
    Ok(Json(ApiResponse::new(SyncCartResponse { count }, req_id.0)))
}

/// DELETE /api/v1/cart/{code}
pub(super) async fn remove_from_cart(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<RemovedResponse>>, ApiError> {
    let removed = state
        .bounded(storefront_db::remove_cart_item(&state.pool, shopper.user_id, &code))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(RemovedResponse { code, removed }, req_id.0)))
}
