//! Hosted checkout sessions and the payment provider's webhook.

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use storefront_db::NewOrder;
use storefront_payments::{
    construct_event, payment_completed, session_status, CheckoutItem, CheckoutRequest,
    CheckoutSession, EventKind, LineItem, PaymentError, SessionStatus, StripeClient,
};
use uuid::Uuid;

use crate::middleware::RequestId;
use crate::session::MaybeShopper;

use super::{map_db_error, ApiError, ApiResponse, AppState};

const SIGNATURE_HEADER: &str = "stripe-signature";

#[derive(Debug, Deserialize)]
pub(super) struct CreateCheckoutRequest {
    pub items: Vec<CheckoutItem>,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckoutCreated {
    pub id: String,
    pub url: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct WebhookAck {
    pub received: bool,
}

fn payments_client<'a>(state: &'a AppState, req_id: &str) -> Result<&'a StripeClient, ApiError> {
    state.payments.as_ref().ok_or_else(|| {
        ApiError::new(
            req_id,
            "payments_unavailable",
            "payments are not configured",
        )
    })
}

pub(super) fn map_payment_error(req_id: &str, error: &PaymentError) -> ApiError {
    match error {
        PaymentError::InvalidRequest(message) => {
            ApiError::new(req_id, "validation_error", message.clone())
        }
        PaymentError::InvalidSignature(message) => {
            tracing::warn!(error = %error, "rejected webhook delivery");
            ApiError::new(req_id, "invalid_signature", message.clone())
        }
        PaymentError::Api { status: 404, .. } => {
            ApiError::new(req_id, "not_found", "checkout session not found")
        }
        _ => {
            tracing::error!(error = %error, "payment provider call failed");
            ApiError::new(req_id, "payment_provider_error", "payment provider request failed")
        }
    }
}

fn success_url(site_url: &str) -> String {
    format!(
        "{}/success?session_id={{CHECKOUT_SESSION_ID}}",
        site_url.trim_end_matches('/')
    )
}

fn cancel_url(site_url: &str) -> String {
    format!("{}/store", site_url.trim_end_matches('/'))
}

/// POST /api/v1/checkout/sessions: open a hosted checkout for the cart.
pub(super) async fn create_checkout_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    MaybeShopper(shopper): MaybeShopper,
    Json(body): Json<CreateCheckoutRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CheckoutCreated>>), ApiError> {
    let client = payments_client(&state, &req_id.0)?;

    let request = CheckoutRequest {
        items: body.items,
        user_id: shopper.map(|s| s.user_id.to_string()),
        success_url: success_url(&state.config.site_url),
        cancel_url: cancel_url(&state.config.site_url),
        allowed_countries: state.config.checkout_allowed_countries.clone(),
        statement_descriptor: state.config.statement_descriptor.clone(),
    };

    let session = client
        .create_checkout_session(&request)
        .await
        .map_err(|e| map_payment_error(&req_id.0, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            CheckoutCreated {
                id: session.id,
                url: session.url,
            },
            req_id.0,
        )),
    ))
}

/// GET /api/v1/checkout/sessions/{id}: status for the post-checkout page.
pub(super) async fn get_checkout_session(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SessionStatus>>, ApiError> {
    let client = payments_client(&state, &req_id.0)?;
    let session = client
        .retrieve_session(&id)
        .await
        .map_err(|e| map_payment_error(&req_id.0, &e))?;

    Ok(Json(ApiResponse::new(session_status(&session), req_id.0)))
}

/// POST /api/v1/webhooks/payments
///
/// Verifies the signature over the raw body, then records completed
/// checkouts as orders. Replayed deliveries are acknowledged without a
/// second insert.
pub(super) async fn payment_webhook(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<WebhookAck>>, ApiError> {
    let Some(secret) = state.config.stripe_webhook_secret.as_deref() else {
        return Err(ApiError::new(
            &req_id.0,
            "payments_unavailable",
            "webhook secret is not configured",
        ));
    };
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            ApiError::new(&req_id.0, "invalid_signature", "missing signature header")
        })?;

    let event =
        construct_event(&body, signature, secret).map_err(|e| map_payment_error(&req_id.0, &e))?;

    match event.kind() {
        EventKind::CheckoutCompleted => {
            let session = event
                .checkout_session()
                .map_err(|e| ApiError::new(&req_id.0, "bad_request", e.to_string()))?;
            record_order(&state, &req_id.0, &session).await?;
        }
        EventKind::AsyncPaymentSucceeded => {
            tracing::info!(event_id = %event.id, "async payment succeeded");
        }
        EventKind::AsyncPaymentFailed => {
            tracing::warn!(event_id = %event.id, "async payment failed");
        }
        EventKind::Other(kind) => {
            tracing::debug!(event_id = %event.id, kind = %kind, "ignoring webhook event");
        }
    }

    Ok(Json(ApiResponse::new(WebhookAck { received: true }, req_id.0)))
}

async fn record_order(
    state: &AppState,
    req_id: &str,
    session: &CheckoutSession,
) -> Result<(), ApiError> {
    let line_items = line_items_for(state, session).await;
    let completed = payment_completed(session, line_items);

    let line_items = serde_json::to_value(&completed.line_items)
        .map_err(|e| ApiError::new(req_id, "internal_error", e.to_string()))?;
    let user_id = completed
        .user_id
        .as_deref()
        .and_then(|id| Uuid::parse_str(id).ok());

    let order = NewOrder {
        session_id: &completed.session_id,
        payment_intent_id: completed.payment_intent_id.as_deref(),
        customer_email: completed.customer_email.as_deref(),
        customer_name: completed.customer_name.as_deref(),
        amount_total: completed.amount_total,
        currency: &completed.currency,
        shipping_address: completed.shipping_address.clone(),
        line_items,
        user_id,
    };

    let inserted = state
        .bounded(storefront_db::insert_completed_order(&state.pool, &order))
        .await
        .map_err(|e| map_db_error(req_id.to_owned(), &e))?;

    if inserted {
        tracing::info!(
            session_id = %completed.session_id,
            amount_total = completed.amount_total,
            "order recorded"
        );
    } else {
        tracing::info!(session_id = %completed.session_id, "duplicate delivery; order exists");
    }
    Ok(())
}

/// Line items embedded in the payload, else fetched from the provider.
/// A failed fetch stores the order without lines rather than dropping it.
async fn line_items_for(state: &AppState, session: &CheckoutSession) -> Vec<LineItem> {
    if let Some(list) = &session.line_items {
        return list.data.clone();
    }
    let Some(client) = state.payments.as_ref() else {
        return Vec::new();
    };
    match client.list_line_items(&session.id).await {
        Ok(items) => items,
        Err(e) => {
            tracing::warn!(session_id = %session.id, error = %e, "could not fetch line items");
            Vec::new()
        }
    }
}
