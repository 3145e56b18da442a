use sqlx::PgPool;
use storefront_core::ProductSeed;

use crate::DbError;

/// Upsert seed products into `tenant`.
///
/// Returns the number of products processed (inserted or updated).
/// All upserts run inside a single transaction; if any operation fails
/// the entire batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_products(
    pool: &PgPool,
    tenant: &str,
    products: &[ProductSeed],
) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;
    let mut count = 0usize;

    for product in products {
        sqlx::query(
            "INSERT INTO products (tenant, code, name, description, price, image_url, category) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             ON CONFLICT (tenant, code) DO UPDATE SET \
                 name = EXCLUDED.name, \
                 description = EXCLUDED.description, \
                 price = EXCLUDED.price, \
                 image_url = EXCLUDED.image_url, \
                 category = EXCLUDED.category, \
                 updated_at = NOW()",
        )
        .bind(tenant)
        .bind(product.code.trim())
        .bind(product.name.trim())
        .bind(&product.description)
        .bind(product.price)
        .bind(&product.image_url)
        .bind(&product.category)
        .execute(&mut *tx)
        .await?;

        count += 1;
    }

    tx.commit().await?;
    Ok(count)
}
