//! Admin mutations on the `products` table.

use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_core::Product;

use crate::catalog::ProductRow;
use crate::DbError;

/// Fields for a new product. Code, name and price are required; the rest
/// may be absent.
#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub description: Option<&'a str>,
    pub price: Decimal,
    pub image_url: Option<&'a str>,
    pub category: Option<&'a str>,
}

/// Sparse update. Outer `None` keeps the column, `Some(None)` clears a
/// nullable column, `Some(Some(v))` sets it.
#[allow(clippy::option_option)]
#[derive(Debug, Clone, Default)]
pub struct ProductPatch<'a> {
    pub name: Option<&'a str>,
    pub description: Option<Option<&'a str>>,
    pub price: Option<Decimal>,
    pub image_url: Option<Option<&'a str>>,
    pub category: Option<Option<&'a str>>,
}

impl ProductPatch<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.image_url.is_none()
            && self.category.is_none()
    }
}

/// Inserts a product and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails, including a unique
/// violation when `code` already exists in `tenant`.
pub async fn create_product(
    pool: &PgPool,
    tenant: &str,
    product: &NewProduct<'_>,
) -> Result<Product, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "INSERT INTO products (tenant, code, name, description, price, image_url, category) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING tenant, code, name, description, price, image_url, category, created_at, updated_at",
    )
    .bind(tenant)
    .bind(product.code)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.image_url)
    .bind(product.category)
    .fetch_one(pool)
    .await?;

    Ok(row.into())
}

/// Applies a sparse update and returns the updated product.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `code` in `tenant`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn update_product(
    pool: &PgPool,
    tenant: &str,
    code: &str,
    patch: &ProductPatch<'_>,
) -> Result<Product, DbError> {
    let description_supplied = patch.description.is_some();
    let description_val = patch.description.flatten();
    let image_url_supplied = patch.image_url.is_some();
    let image_url_val = patch.image_url.flatten();
    let category_supplied = patch.category.is_some();
    let category_val = patch.category.flatten();

    let row = sqlx::query_as::<_, ProductRow>(
        "UPDATE products \
         SET name        = COALESCE($3, name), \
             price       = COALESCE($4, price), \
             description = CASE WHEN $5::BOOL THEN $6 ELSE description END, \
             image_url   = CASE WHEN $7::BOOL THEN $8 ELSE image_url END, \
             category    = CASE WHEN $9::BOOL THEN $10 ELSE category END, \
             updated_at  = NOW() \
         WHERE tenant = $1 AND code = $2 \
         RETURNING tenant, code, name, description, price, image_url, category, created_at, updated_at",
    )
    .bind(tenant)
    .bind(code)
    .bind(patch.name)
    .bind(patch.price)
    .bind(description_supplied)
    .bind(description_val)
    .bind(image_url_supplied)
    .bind(image_url_val)
    .bind(category_supplied)
    .bind(category_val)
    .fetch_optional(pool)
    .await?;

    row.map(Product::from).ok_or(DbError::NotFound)
}

/// Deletes a product.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no product has `code` in `tenant`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn delete_product(pool: &PgPool, tenant: &str, code: &str) -> Result<(), DbError> {
    let result = sqlx::query("DELETE FROM products WHERE tenant = $1 AND code = $2")
        .bind(tenant)
        .bind(code)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::NotFound);
    }
    Ok(())
}

/// Moves every product in `from` to `to` and returns how many changed.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn rename_category(
    pool: &PgPool,
    tenant: &str,
    from: &str,
    to: &str,
) -> Result<u64, DbError> {
    let result = sqlx::query(
        "UPDATE products \
         SET category = $3, updated_at = NOW() \
         WHERE tenant = $1 AND category = $2",
    )
    .bind(tenant)
    .bind(from)
    .bind(to)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}
