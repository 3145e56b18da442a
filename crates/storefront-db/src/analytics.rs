//! Storefront behaviour events (page views, add-to-cart clicks, ...).

use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone)]
pub struct NewAnalyticsEvent<'a> {
    pub user_id: Option<Uuid>,
    pub event_type: &'a str,
    pub event_data: Value,
    pub ip_address: Option<&'a str>,
    pub user_agent: Option<&'a str>,
}

/// Records one event for `tenant` and returns its id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn insert_analytics_event(
    pool: &PgPool,
    tenant: &str,
    event: &NewAnalyticsEvent<'_>,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO analytics_events \
             (tenant, user_id, event_type, event_data, ip_address, user_agent) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING id",
    )
    .bind(tenant)
    .bind(event.user_id)
    .bind(event.event_type)
    .bind(&event.event_data)
    .bind(event.ip_address)
    .bind(event.user_agent)
    .fetch_one(pool)
    .await?;

    Ok(id)
}
