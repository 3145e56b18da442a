//! Storefront behaviour events posted by the browser.

use axum::{
    extract::State,
    http::{header::USER_AGENT, HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use storefront_db::NewAnalyticsEvent;

use crate::middleware::{ClientAddr, RequestId};
use crate::session::MaybeShopper;

use super::{map_db_error, ApiError, ApiResponse, AppState};

const MAX_EVENT_TYPE_LEN: usize = 64;
const MAX_USER_AGENT_LEN: usize = 512;

#[derive(Debug, Deserialize)]
pub(super) struct EventRequest {
    #[serde(default)]
    pub event_type: Option<String>,
    #[serde(default)]
    pub event_data: Option<Value>,
}

#[derive(Debug, Serialize)]
pub(super) struct EventRecorded {
    pub id: i64,
}

fn event_type(raw: Option<&str>) -> Result<&str, &'static str> {
    let trimmed = raw.map(str::trim).unwrap_or_default();
    if trimmed.is_empty() {
        return Err("event_type is required");
    }
    if trimmed.chars().count() > MAX_EVENT_TYPE_LEN {
        return Err("event_type is too long");
    }
    Ok(trimmed)
}

fn user_agent(headers: &HeaderMap) -> Option<String> {
    headers
        .get(USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .map(|ua| ua.chars().take(MAX_USER_AGENT_LEN).collect())
}

/// POST /api/v1/analytics
///
/// Anonymous events are accepted; a signed-in shopper is attached when the
/// request carries a valid session.
pub(super) async fn record_event(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    MaybeShopper(shopper): MaybeShopper,
    ClientAddr(client): ClientAddr,
    headers: HeaderMap,
    Json(body): Json<EventRequest>,
) -> Result<(StatusCode, Json<ApiResponse<EventRecorded>>), ApiError> {
    let event_type = event_type(body.event_type.as_deref())
        .map_err(|message| ApiError::new(&req_id.0, "validation_error", message))?;
    let user_agent = user_agent(&headers);

    let event = NewAnalyticsEvent {
        user_id: shopper.map(|s| s.user_id),
        event_type,
        event_data: body
            .event_data
            .filter(|data| !data.is_null())
            .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
        ip_address: client.as_deref(),
        user_agent: user_agent.as_deref(),
    };

    let id = state
        .bounded(storefront_db::insert_analytics_event(
            &state.pool,
            state.tenant(),
            &event,
        ))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::debug!(id, event_type, "analytics event recorded");
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(EventRecorded { id }, req_id.0)),
    ))
}
