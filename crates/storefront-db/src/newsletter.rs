use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct SubscriberRow {
    pub email: String,
    pub name: Option<String>,
    pub source: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Subscribes `email` (normalized to trimmed lower case), re-activating a
/// previous subscription.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn subscribe(
    pool: &PgPool,
    email: &str,
    name: Option<&str>,
    source: &str,
) -> Result<SubscriberRow, DbError> {
    let normalized = email.trim().to_lowercase();

    let row = sqlx::query_as::<_, SubscriberRow>(
        "INSERT INTO newsletter_subscribers (email, name, source, is_active) \
         VALUES ($1, $2, $3, true) \
         ON CONFLICT (email) DO UPDATE SET \
             name = COALESCE(EXCLUDED.name, newsletter_subscribers.name), \
             is_active = true, \
             updated_at = NOW() \
         RETURNING email, name, source, is_active, created_at",
    )
    .bind(&normalized)
    .bind(name)
    .bind(source)
    .fetch_one(pool)
    .await?;

    Ok(row)
}
