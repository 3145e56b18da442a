//! Orders persisted from completed checkout sessions.

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use sqlx::{PgPool, Postgres, QueryBuilder};
use storefront_core::{escape_like, paginate, ResultPage};
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct OrderRow {
    pub public_id: Uuid,
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    /// Smallest currency unit (cents).
    pub amount_total: i64,
    pub currency: String,
    pub status: String,
    pub shipping_address: Option<Value>,
    pub line_items: Value,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A completed payment ready to be stored.
#[derive(Debug, Clone)]
pub struct NewOrder<'a> {
    pub session_id: &'a str,
    pub payment_intent_id: Option<&'a str>,
    pub customer_email: Option<&'a str>,
    pub customer_name: Option<&'a str>,
    pub amount_total: i64,
    pub currency: &'a str,
    pub shipping_address: Option<Value>,
    pub line_items: Value,
    pub user_id: Option<Uuid>,
}

/// Admin order listing filters.
#[derive(Debug, Clone, Default)]
pub struct OrderFilters<'a> {
    pub status: Option<&'a str>,
    /// Substring of customer email or name.
    pub search: Option<&'a str>,
    pub page: u32,
    pub page_size: u32,
}

const ORDER_COLUMNS: &str = "public_id, session_id, payment_intent_id, customer_email, \
     customer_name, amount_total, currency, status, shipping_address, line_items, user_id, \
     created_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Stores a completed order. Replayed webhook deliveries for the same
/// session are ignored.
///
/// Returns `true` when a new row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn insert_completed_order(pool: &PgPool, order: &NewOrder<'_>) -> Result<bool, DbError> {
    let result = sqlx::query(
        "INSERT INTO orders (session_id, payment_intent_id, customer_email, customer_name, \
                             amount_total, currency, status, shipping_address, line_items, user_id) \
         VALUES ($1, $2, $3, $4, $5, $6, 'completed', $7, $8, $9) \
         ON CONFLICT (session_id) DO NOTHING",
    )
    .bind(order.session_id)
    .bind(order.payment_intent_id)
    .bind(order.customer_email)
    .bind(order.customer_name)
    .bind(order.amount_total)
    .bind(order.currency)
    .bind(&order.shipping_address)
    .bind(&order.line_items)
    .bind(order.user_id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Returns every order placed with `email`, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_orders_for_email(pool: &PgPool, email: &str) -> Result<Vec<OrderRow>, DbError> {
    let sql = format!(
        "SELECT {ORDER_COLUMNS} FROM orders \
         WHERE lower(customer_email) = lower($1) \
         ORDER BY created_at DESC, id DESC"
    );
    let rows = sqlx::query_as::<_, OrderRow>(&sql)
        .bind(email)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

fn push_order_filters(qb: &mut QueryBuilder<'_, Postgres>, filters: &OrderFilters<'_>) {
    qb.push(" WHERE TRUE");
    if let Some(status) = filters.status.filter(|s| !s.is_empty()) {
        qb.push(" AND status = ").push_bind(status.to_owned());
    }
    if let Some(search) = filters.search.map(str::trim).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", escape_like(search));
        qb.push(" AND (customer_email ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR customer_name ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
}

/// Paginated admin order listing, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_orders_admin(
    pool: &PgPool,
    filters: &OrderFilters<'_>,
) -> Result<ResultPage<OrderRow>, DbError> {
    let mut count_qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM orders");
    push_order_filters(&mut count_qb, filters);
    let total = count_qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    let total = u64::try_from(total).unwrap_or(0);

    let window = paginate(total, filters.page, filters.page_size);

    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(ORDER_COLUMNS).push(" FROM orders");
    push_order_filters(&mut qb, filters);
    qb.push(" ORDER BY created_at DESC, id DESC LIMIT ")
        .push_bind(i64::from(window.limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));

    let rows = qb.build_query_as::<OrderRow>().fetch_all(pool).await?;
    Ok(ResultPage::new(rows, total, &window, filters.page.max(1)))
}
