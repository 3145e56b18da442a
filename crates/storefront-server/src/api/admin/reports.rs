use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;
use storefront_core::ResultPage;
use storefront_db::{AdminStats, OrderFilters, OrderRow};

use crate::middleware::RequestId;

use super::super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(in crate::api) struct OrderQuery {
    pub status: Option<String>,
    pub search: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Lenient numeric parameter: anything unparsable or zero becomes `default`.
fn positive_or(raw: Option<&str>, default: u32) -> u32 {
    raw.and_then(|v| v.trim().parse::<u32>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

/// GET /api/v1/admin/orders: newest first; `status=all` means no status filter.
pub(in crate::api) async fn list_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<OrderQuery>,
) -> Result<Json<ApiResponse<ResultPage<OrderRow>>>, ApiError> {
    let filters = OrderFilters {
        status: query
            .status
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty() && *s != "all"),
        search: query.search.as_deref(),
        page: positive_or(query.page.as_deref(), 1),
        page_size: positive_or(query.page_size.as_deref(), state.config.admin_page_size)
            .min(storefront_core::MAX_PAGE_SIZE),
    };

    let page = state
        .bounded(storefront_db::list_orders_admin(&state.pool, &filters))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(page, req_id.0)))
}

/// GET /api/v1/admin/stats
pub(in crate::api) async fn stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<AdminStats>>, ApiError> {
    let stats = state
        .bounded(storefront_db::admin_stats(&state.pool, state.tenant()))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(stats, req_id.0)))
}

#[cfg(test)]
mod tests {
    use super::positive_or;

    #[test]
    fn positive_or_falls_back_on_junk() {
        assert_eq!(positive_or(None, 25), 25);
        assert_eq!(positive_or(Some("0"), 25), 25);
        assert_eq!(positive_or(Some("-3"), 25), 25);
        assert_eq!(positive_or(Some(" 4 "), 25), 4);
    }
}
