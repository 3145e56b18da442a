//! Shopper cart rows, keyed by `(user_id, product_code)`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct CartItemRow {
    pub product_code: String,
    pub product_name: String,
    pub product_price: Decimal,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCartItem {
    pub product_code: String,
    pub product_name: String,
    pub product_price: Decimal,
    pub product_image: Option<String>,
    pub quantity: i32,
}

/// Returns the user's cart, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_cart_items(pool: &PgPool, user_id: Uuid) -> Result<Vec<CartItemRow>, DbError> {
    let rows = sqlx::query_as::<_, CartItemRow>(
        "SELECT product_code, product_name, product_price, product_image, quantity, \
                created_at, updated_at \
         FROM cart_items \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, product_code",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts or replaces one cart line. The last write for a product wins.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn add_cart_item(
    pool: &PgPool,
    user_id: Uuid,
    item: &NewCartItem,
) -> Result<CartItemRow, DbError> {
    let row = sqlx::query_as::<_, CartItemRow>(
        "INSERT INTO cart_items (user_id, product_code, product_name, product_price, product_image, quantity) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (user_id, product_code) DO UPDATE SET \
             product_name = EXCLUDED.product_name, \
             product_price = EXCLUDED.product_price, \
             product_image = EXCLUDED.product_image, \
             quantity = EXCLUDED.quantity, \
             updated_at = NOW() \
         RETURNING product_code, product_name, product_price, product_image, quantity, \
                   created_at, updated_at",
    )
    .bind(user_id)
    .bind(&item.product_code)
    .bind(&item.product_name)
    .bind(item.product_price)
    .bind(&item.product_image)
    .bind(item.quantity)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Replaces the whole cart with `items` in one transaction.
///
/// Returns the number of lines written.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any statement fails; the cart is then unchanged.
pub async fn replace_cart(
    pool: &PgPool,
    user_id: Uuid,
    items: &[NewCartItem],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

    for item in items {
        sqlx::query(
            "INSERT INTO cart_items (user_id, product_code, product_name, product_price, product_image, quantity) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (user_id, product_code) DO UPDATE SET \
                 quantity = EXCLUDED.quantity, \
                 updated_at = NOW()",
        )
        .bind(user_id)
        .bind(&item.product_code)
        .bind(&item.product_name)
        .bind(item.product_price)
        .bind(&item.product_image)
        .bind(item.quantity)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(items.len())
}

/// Removes one product from the cart. Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn remove_cart_item(
    pool: &PgPool,
    user_id: Uuid,
    product_code: &str,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1 AND product_code = $2")
        .bind(user_id)
        .bind(product_code)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
