use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;

use crate::orders::OrderRow;
use crate::DbError;

/// Dashboard counters for the admin home screen.
#[derive(Debug, Clone, Serialize)]
pub struct AdminStats {
    pub total_products: i64,
    pub total_categories: i64,
    pub total_orders: i64,
    pub orders_today: i64,
    /// Sum of completed orders in major currency units.
    pub total_revenue: Decimal,
    pub total_subscribers: i64,
    pub recent_orders: Vec<OrderRow>,
}

#[derive(Debug, sqlx::FromRow)]
struct CounterRow {
    total_products: i64,
    total_categories: i64,
    total_orders: i64,
    orders_today: i64,
    revenue_cents: i64,
    total_subscribers: i64,
}

/// Collects the admin dashboard counters and the five latest orders.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if a query fails.
pub async fn admin_stats(pool: &PgPool, tenant: &str) -> Result<AdminStats, DbError> {
    let counters = sqlx::query_as::<_, CounterRow>(
        "SELECT \
             (SELECT COUNT(*) FROM products WHERE tenant = $1) AS total_products, \
             (SELECT COUNT(DISTINCT category) FROM products \
               WHERE tenant = $1 AND category IS NOT NULL AND btrim(category) <> '') AS total_categories, \
             (SELECT COUNT(*) FROM orders) AS total_orders, \
             (SELECT COUNT(*) FROM orders WHERE created_at >= date_trunc('day', NOW())) AS orders_today, \
             (SELECT COALESCE(SUM(amount_total), 0)::BIGINT FROM orders WHERE status = 'completed') AS revenue_cents, \
             (SELECT COUNT(*) FROM newsletter_subscribers WHERE is_active) AS total_subscribers",
    )
    .bind(tenant)
    .fetch_one(pool)
    .await?;

    let recent_orders = sqlx::query_as::<_, OrderRow>(
        "SELECT public_id, session_id, payment_intent_id, customer_email, customer_name, \
                amount_total, currency, status, shipping_address, line_items, user_id, created_at \
         FROM orders \
         ORDER BY created_at DESC, id DESC \
         LIMIT 5",
    )
    .fetch_all(pool)
    .await?;

    Ok(AdminStats {
        total_products: counters.total_products,
        total_categories: counters.total_categories,
        total_orders: counters.total_orders,
        orders_today: counters.orders_today,
        total_revenue: Decimal::new(counters.revenue_cents, 2),
        total_subscribers: counters.total_subscribers,
        recent_orders,
    })
}
