//! Read queries for the storefront and admin product listings.
//!
//! Every statement is scoped to one tenant. Filters come from a
//! [`QueryPlan`]; values are always bound, and the only interpolated SQL is
//! the whitelisted `ORDER BY` body the plan produces.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, QueryBuilder};
use storefront_core::{rank_facets, CategoryFacet, Product, QueryPlan, ResultPage};

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub tenant: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            code: row.code,
            name: row.name,
            description: row.description,
            price: row.price,
            image_url: row.image_url,
            category: row.category,
            created_at: row.created_at,
        }
    }
}

pub(crate) const PRODUCT_COLUMNS: &str =
    "tenant, code, name, description, price, image_url, category, created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct CategoryCountRow {
    name: String,
    count: i64,
}

// ---------------------------------------------------------------------------
// Predicate rendering
// ---------------------------------------------------------------------------

/// Append `WHERE tenant = $n` plus every active predicate of `plan`.
fn push_predicates(qb: &mut QueryBuilder<'_, Postgres>, tenant: &str, plan: &QueryPlan) {
    qb.push(" WHERE tenant = ").push_bind(tenant.to_owned());

    if let Some(search) = &plan.search {
        qb.push(" AND (");
        for (i, column) in search.columns.iter().enumerate() {
            if i > 0 {
                qb.push(" OR ");
            }
            qb.push(*column)
                .push(" ILIKE ")
                .push_bind(search.pattern.clone());
        }
        qb.push(")");
    }

    if !plan.categories.is_empty() {
        qb.push(" AND category = ANY(")
            .push_bind(plan.categories.clone())
            .push(")");
    }

    if let Some(min) = plan.price_min {
        qb.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = plan.price_max {
        qb.push(" AND price <= ").push_bind(max);
    }
}

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Number of products in `tenant` matching `plan`, ignoring pagination.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn count_products(pool: &PgPool, tenant: &str, plan: &QueryPlan) -> Result<u64, DbError> {
    let mut qb = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM products");
    push_predicates(&mut qb, tenant, plan);

    let count = qb.build_query_scalar::<i64>().fetch_one(pool).await?;
    Ok(u64::try_from(count).unwrap_or(0))
}

/// One page of products matching `plan`.
///
/// The requested page is clamped into `[1, total_pages]`, so asking past the
/// end returns the last page rather than an empty one.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if either query fails.
pub async fn list_products(
    pool: &PgPool,
    tenant: &str,
    plan: &QueryPlan,
) -> Result<ResultPage<Product>, DbError> {
    let total = count_products(pool, tenant, plan).await?;
    let window = plan.window(total);

    if total == 0 {
        return Ok(ResultPage::new(Vec::new(), 0, &window, plan.page));
    }

    let mut qb = QueryBuilder::<Postgres>::new("SELECT ");
    qb.push(PRODUCT_COLUMNS).push(" FROM products");
    push_predicates(&mut qb, tenant, plan);
    qb.push(" ORDER BY ").push(plan.order_by());
    qb.push(" LIMIT ")
        .push_bind(i64::from(window.limit))
        .push(" OFFSET ")
        .push_bind(i64::try_from(window.offset).unwrap_or(i64::MAX));

    let rows = qb.build_query_as::<ProductRow>().fetch_all(pool).await?;
    let items = rows.into_iter().map(Product::from).collect();

    Ok(ResultPage::new(items, total, &window, plan.page))
}

/// Returns a single product by code, or `None` if it does not exist in `tenant`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(
    pool: &PgPool,
    tenant: &str,
    code: &str,
) -> Result<Option<Product>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(
        "SELECT tenant, code, name, description, price, image_url, category, created_at, updated_at \
         FROM products \
         WHERE tenant = $1 AND code = $2",
    )
    .bind(tenant)
    .bind(code)
    .fetch_optional(pool)
    .await?;

    Ok(row.map(Product::from))
}

/// Distinct, non-blank category labels in `tenant`, sorted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool, tenant: &str) -> Result<Vec<String>, DbError> {
    let rows = sqlx::query_scalar::<_, String>(
        "SELECT DISTINCT category \
         FROM products \
         WHERE tenant = $1 AND category IS NOT NULL AND btrim(category) <> '' \
         ORDER BY category",
    )
    .bind(tenant)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Distinct categories with their unfiltered product counts, sorted by name.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_category_counts(
    pool: &PgPool,
    tenant: &str,
) -> Result<Vec<CategoryFacet>, DbError> {
    let rows = sqlx::query_as::<_, CategoryCountRow>(
        "SELECT category AS name, COUNT(*) AS count \
         FROM products \
         WHERE tenant = $1 AND category IS NOT NULL AND btrim(category) <> '' \
         GROUP BY category \
         ORDER BY category",
    )
    .bind(tenant)
    .fetch_all(pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| CategoryFacet::counted(r.name, u64::try_from(r.count).unwrap_or(0)))
        .collect())
}

/// Count matches of `plan` within each category, ranked by count.
///
/// The plan's own category filter is replaced per category, so each count
/// reflects the other active filters (search, price). One count query runs
/// per category, concurrently; all complete before this returns.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any count query fails.
pub async fn count_category_facets(
    pool: &PgPool,
    tenant: &str,
    plan: &QueryPlan,
    categories: &[String],
) -> Result<Vec<CategoryFacet>, DbError> {
    let counts = try_join_all(categories.iter().map(|category| {
        let narrowed = plan.for_category(category);
        async move {
            let count = count_products(pool, tenant, &narrowed).await?;
            Ok::<_, DbError>(CategoryFacet::counted(category.clone(), count))
        }
    }))
    .await?;

    Ok(rank_facets(counts))
}
