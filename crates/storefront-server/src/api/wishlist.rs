use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use storefront_db::WishlistItemRow;

use crate::middleware::RequestId;
use crate::session::Shopper;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct WishlistRequest {
    #[serde(alias = "codigo")]
    pub code: String,
    pub name: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RemovedResponse {
    pub code: String,
    pub removed: bool,
}

/// GET /api/v1/wishlist
pub(super) async fn list_wishlist(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
) -> Result<Json<ApiResponse<Vec<WishlistItemRow>>>, ApiError> {
    let items = state
        .bounded(storefront_db::list_wishlist_items(&state.pool, shopper.user_id))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(items, req_id.0)))
}

/// POST /api/v1/wishlist
pub(super) async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
    Json(body): Json<WishlistRequest>,
) -> Result<Json<ApiResponse<WishlistItemRow>>, ApiError> {
    let code = body.code.trim();
    let name = body.name.trim();
    if code.is_empty() || name.is_empty() {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            "code and name are required",
        ));
    }

    let image = body.image.as_deref().filter(|i| !i.trim().is_empty());
    let row = state
        .bounded(storefront_db::add_wishlist_item(
            &state.pool,
            shopper.user_id,
            code,
            name,
            image,
        ))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(row, req_id.0)))
}

/// DELETE /api/v1/wishlist/{code}
pub(super) async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
    Path(code): Path<String>,
) -> Result<Json<ApiResponse<RemovedResponse>>, ApiError> {
    let removed = state
        .bounded(storefront_db::remove_wishlist_item(&state.pool, shopper.user_id, &code))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(RemovedResponse { code, removed }, req_id.0)))
}
