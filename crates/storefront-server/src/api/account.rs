//! Shopper identity, order history and newsletter sign-up.

use axum::{extract::State, http::StatusCode, Extension, Json};
use serde::Deserialize;
use storefront_db::{OrderRow, SubscriberRow};

use crate::middleware::RequestId;
use crate::session::Shopper;

use super::{map_db_error, ApiError, ApiResponse, AppState};

const NEWSLETTER_SOURCE: &str = "website";

#[derive(Debug, Deserialize)]
pub(super) struct NewsletterRequest {
    pub email: String,
    pub name: Option<String>,
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.contains(char::is_whitespace)
        }
        None => false,
    }
}

/// GET /api/v1/me
pub(super) async fn me(
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
) -> Json<ApiResponse<Shopper>> {
    Json(ApiResponse::new(shopper, req_id.0))
}

/// GET /api/v1/orders: orders placed with the signed-in shopper's email.
pub(super) async fn list_my_orders(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    shopper: Shopper,
) -> Result<Json<ApiResponse<Vec<OrderRow>>>, ApiError> {
    let orders = state
        .bounded(storefront_db::list_orders_for_email(&state.pool, &shopper.email))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::new(orders, req_id.0)))
}

/// POST /api/v1/newsletter
pub(super) async fn subscribe_newsletter(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<NewsletterRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubscriberRow>>), ApiError> {
    let email = body.email.trim();
    if !looks_like_email(email) {
        return Err(ApiError::new(
            &req_id.0,
            "validation_error",
            "a valid email is required",
        ));
    }
    let name = body.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let row = state
        .bounded(storefront_db::subscribe(&state.pool, email, name, NEWSLETTER_SOURCE))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!("newsletter subscription recorded");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(row, req_id.0))))
}
