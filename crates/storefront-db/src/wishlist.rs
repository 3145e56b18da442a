use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct WishlistItemRow {
    pub product_code: String,
    pub product_name: String,
    pub product_image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Returns the user's wishlist, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_wishlist_items(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Vec<WishlistItemRow>, DbError> {
    let rows = sqlx::query_as::<_, WishlistItemRow>(
        "SELECT product_code, product_name, product_image, created_at \
         FROM wishlist_items \
         WHERE user_id = $1 \
         ORDER BY created_at DESC, product_code",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Adds a product to the wishlist, refreshing its name and image if present.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn add_wishlist_item(
    pool: &PgPool,
    user_id: Uuid,
    product_code: &str,
    product_name: &str,
    product_image: Option<&str>,
) -> Result<WishlistItemRow, DbError> {
    let row = sqlx::query_as::<_, WishlistItemRow>(
        "INSERT INTO wishlist_items (user_id, product_code, product_name, product_image) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, product_code) DO UPDATE SET \
             product_name = EXCLUDED.product_name, \
             product_image = EXCLUDED.product_image \
         RETURNING product_code, product_name, product_image, created_at",
    )
    .bind(user_id)
    .bind(product_code)
    .bind(product_name)
    .bind(product_image)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Removes a product from the wishlist. Returns whether a row was deleted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn remove_wishlist_item(
    pool: &PgPool,
    user_id: Uuid,
    product_code: &str,
) -> Result<bool, DbError> {
    let result =
        sqlx::query("DELETE FROM wishlist_items WHERE user_id = $1 AND product_code = $2")
            .bind(user_id)
            .bind(product_code)
            .execute(pool)
            .await?;

    Ok(result.rows_affected() > 0)
}
