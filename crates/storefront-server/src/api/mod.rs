mod account;
mod admin;
mod analytics;
mod cart;
mod catalog;
mod checkout;
mod wishlist;


use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, patch, post, put},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use std::{future::Future, sync::Arc, time::Duration};
use storefront_core::{AppConfig, CatalogError};
use storefront_db::DbError;
use storefront_payments::StripeClient;
use tower::ServiceBuilder;
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};
use crate::session::SESSION_HEADER;
use crate::storage::StorageClient;

/// Base64 inflates uploads by a third; this admits images up to ~7.5 MB.
const UPLOAD_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<AppConfig>,
    /// `None` when payment secrets are not configured.
    pub payments: Option<StripeClient>,
    /// `None` when object storage is not configured.
    pub storage: Option<StorageClient>,
}

impl AppState {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_secs(self.config.store_timeout_secs)
    }

    pub fn tenant(&self) -> &str {
        &self.config.tenant
    }

    /// Runs a store call under the configured query timeout; an elapsed
    /// limit surfaces as `store_unavailable`.
    pub(crate) async fn bounded<T, F>(&self, query: F) -> Result<T, DbError>
    where
        F: Future<Output = Result<T, DbError>>,
    {
        storefront_db::with_timeout(self.store_timeout(), query).await
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(crate) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(crate) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    /// Maps the shared catalog failure taxonomy onto API error codes.
    pub fn from_catalog(request_id: impl Into<String>, error: &CatalogError) -> Self {
        let code = match error {
            CatalogError::Validation(_) => "validation_error",
            CatalogError::StoreUnavailable(_) => "store_unavailable",
            CatalogError::NotFound(_) => "not_found",
            CatalogError::Unauthorized => "unauthorized",
        };
        Self::new(request_id, code, error.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "bad_request" | "validation_error" | "invalid_signature" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "store_unavailable" | "payments_unavailable" | "storage_unavailable" => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            "payment_provider_error" | "storage_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(crate) fn map_db_error(request_id: String, error: &DbError) -> ApiError {
    if matches!(error, DbError::NotFound) {
        return ApiError::new(request_id, "not_found", "record not found");
    }
    if error.is_unavailable() {
        tracing::warn!(error = %error, "catalog store unavailable");
        return ApiError::from_catalog(
            request_id,
            &CatalogError::StoreUnavailable(error.to_string()),
        );
    }
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(crate) fn map_unique_violation(
    request_id: &str,
    error: &DbError,
    message: impl Into<String>,
) -> ApiError {
    if error.is_unique_violation() {
        return ApiError::new(request_id, "conflict", message);
    }
    map_db_error(request_id.to_owned(), error)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(SESSION_HEADER),
        ])
}

fn shopper_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/products", get(catalog::list_products))
        .route("/api/v1/products/{code}", get(catalog::get_product))
        .route("/api/v1/categories", get(catalog::list_categories))
        .route("/api/v1/categories/facets", get(catalog::category_facets))
        .route("/api/v1/cart", get(cart::list_cart).post(cart::add_to_cart))
        .route("/api/v1/cart/sync", post(cart::sync_cart))
        .route("/api/v1/cart/{code}", delete(cart::remove_from_cart))
        .route(
            "/api/v1/wishlist",
            get(wishlist::list_wishlist).post(wishlist::add_to_wishlist),
        )
        .route(
            "/api/v1/wishlist/{code}",
            delete(wishlist::remove_from_wishlist),
        )
        .route("/api/v1/newsletter", post(account::subscribe_newsletter))
        .route("/api/v1/analytics", post(analytics::record_event))
        .route("/api/v1/orders", get(account::list_my_orders))
        .route("/api/v1/me", get(account::me))
        .route(
            "/api/v1/checkout/sessions",
            post(checkout::create_checkout_session),
        )
        .route(
            "/api/v1/checkout/sessions/{id}",
            get(checkout::get_checkout_session),
        )
}

fn admin_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/admin/products",
            get(admin::list_products).post(admin::create_product),
        )
        .route(
            "/api/v1/admin/products/{code}",
            patch(admin::update_product)
                .put(admin::update_product)
                .delete(admin::delete_product),
        )
        .route("/api/v1/admin/categories", put(admin::rename_category))
        .route("/api/v1/admin/orders", get(admin::list_orders))
        .route("/api/v1/admin/stats", get(admin::stats))
        .route(
            "/api/v1/admin/uploads",
            post(admin::upload_image).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    // The webhook verifies its own signature and needs the raw body, so it
    // sits outside compression and auth.
    let public_routes = Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/webhooks/payments", post(checkout::payment_webhook));

    Router::new()
        .merge(public_routes)
        .merge(shopper_router().layer(CompressionLayer::new()))
        .merge(admin_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match storefront_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}
