//! Live integration tests for storefront-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/storefront-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::str::FromStr;

use rust_decimal::Decimal;
use serde_json::json;
use storefront_core::{build_query, FilterRequest, ProductSeed, Surface};
use storefront_db::{
    add_cart_item, add_wishlist_item, admin_stats, count_category_facets, create_product,
    delete_product, find_session, get_product, insert_analytics_event, insert_completed_order,
    list_cart_items, list_categories, list_category_counts, list_orders_admin,
    list_orders_for_email, list_products, list_wishlist_items, remove_cart_item,
    remove_wishlist_item, rename_category, replace_cart, run_migrations, seed_products, subscribe,
    update_product, DbError, NewAnalyticsEvent, NewCartItem, NewOrder, NewProduct, OrderFilters,
    ProductPatch,
};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

async fn insert_product(
    pool: &sqlx::PgPool,
    tenant: &str,
    code: &str,
    name: &str,
    price: &str,
    category: Option<&str>,
) {
    sqlx::query(
        "INSERT INTO products (tenant, code, name, price, category) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(tenant)
    .bind(code)
    .bind(name)
    .bind(dec(price))
    .bind(category)
    .execute(pool)
    .await
    .unwrap_or_else(|e| panic!("insert_product failed for '{code}': {e}"));
}

fn storefront(query: &str) -> storefront_core::QueryPlan {
    build_query(&FilterRequest::from_query(query), Surface::Storefront, 24)
}

fn admin(query: &str) -> storefront_core::QueryPlan {
    build_query(&FilterRequest::from_query(query), Surface::Admin, 50)
}

fn cart_item(code: &str, quantity: i32) -> NewCartItem {
    NewCartItem {
        product_code: code.to_string(),
        product_name: format!("Product {code}"),
        product_price: dec("5.00"),
        product_image: None,
        quantity,
    }
}

fn order<'a>(session_id: &'a str, email: &'a str, amount: i64) -> NewOrder<'a> {
    NewOrder {
        session_id,
        payment_intent_id: Some("pi_123"),
        customer_email: Some(email),
        customer_name: Some("Ada Lovelace"),
        amount_total: amount,
        currency: "usd",
        shipping_address: Some(json!({ "country": "US" })),
        line_items: json!([{ "description": "Cable", "quantity": 1, "amount_total": amount }]),
        user_id: None,
    }
}

// ---------------------------------------------------------------------------
// Section 1: Catalog listing
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn search_cable_returns_first_page_of_thirty(pool: sqlx::PgPool) {
    for i in 0..30 {
        insert_product(&pool, "acme", &format!("CBL-{i:02}"), &format!("USB cable {i}"), "9.99", None).await;
    }
    insert_product(&pool, "acme", "SPK-1", "Speaker", "99.00", None).await;

    let page = list_products(&pool, "acme", &storefront("search=cable&page=1"))
        .await
        .expect("list_products failed");

    assert_eq!(page.items.len(), 24);
    assert_eq!(page.total, 30);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.page, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn out_of_range_page_returns_last_page(pool: sqlx::PgPool) {
    for i in 0..30 {
        insert_product(&pool, "acme", &format!("CBL-{i:02}"), &format!("cable {i}"), "1.00", None).await;
    }

    let page = list_products(&pool, "acme", &storefront("page=9"))
        .await
        .unwrap();

    assert_eq!(page.page, 2);
    assert_eq!(page.requested_page, 9);
    assert_eq!(page.items.len(), 6);
}

#[sqlx::test(migrations = "../../migrations")]
async fn category_set_filters_by_equality(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "A1", "Amp", "10", Some("Audio")).await;
    insert_product(&pool, "acme", "V1", "Projector", "10", Some("Video")).await;
    insert_product(&pool, "acme", "C1", "Cable", "10", Some("Cables")).await;
    insert_product(&pool, "acme", "X1", "Audio%Thing", "10", Some("Audio%")).await;

    let page = list_products(&pool, "acme", &storefront("categories=Audio,Video"))
        .await
        .unwrap();

    let codes: Vec<_> = page.items.iter().map(|p| p.code.as_str()).collect();
    assert_eq!(page.total, 2);
    assert!(page
        .items
        .iter()
        .all(|p| matches!(p.category.as_deref(), Some("Audio" | "Video"))));
    assert_eq!(codes, vec!["A1", "V1"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn price_bounds_are_inclusive(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "P1", "Below", "49.99", None).await;
    insert_product(&pool, "acme", "P2", "Low edge", "50.00", None).await;
    insert_product(&pool, "acme", "P3", "High edge", "100.00", None).await;
    insert_product(&pool, "acme", "P4", "Above", "100.01", None).await;

    let page = list_products(&pool, "acme", &storefront("price_min=50&price_max=100"))
        .await
        .unwrap();

    let codes: Vec<_> = page.items.iter().map(|p| p.code.as_str()).collect();
    // Default sort is by name: "High edge" before "Low edge".
    assert_eq!(codes, vec!["P3", "P2"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn empty_result_has_one_page(pool: sqlx::PgPool) {
    let page = list_products(&pool, "acme", &storefront("search=nothing&page=3"))
        .await
        .unwrap();

    assert_eq!(page.total, 0);
    assert_eq!(page.total_pages, 1);
    assert_eq!(page.page, 1);
    assert!(page.items.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn identical_requests_return_identical_pages(pool: sqlx::PgPool) {
    for i in 0..10 {
        // Equal names and prices force the code tiebreaker to decide order.
        insert_product(&pool, "acme", &format!("T{}", 9 - i), "Same", "5.00", None).await;
    }
    let plan = storefront("sort=price&page_size=4&page=2");

    let first = list_products(&pool, "acme", &plan).await.unwrap();
    let second = list_products(&pool, "acme", &plan).await.unwrap();

    assert_eq!(first, second);
    let codes: Vec<_> = first.items.iter().map(|p| p.code.as_str()).collect();
    assert_eq!(codes, vec!["T4", "T5", "T6", "T7"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn tenants_never_see_each_other(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "SHARED", "Acme cable", "1", Some("Cables")).await;
    insert_product(&pool, "globex", "SHARED", "Globex cable", "2", Some("Secret")).await;

    let page = list_products(&pool, "acme", &storefront("")).await.unwrap();
    assert_eq!(page.total, 1);
    assert_eq!(page.items[0].name, "Acme cable");

    assert_eq!(list_categories(&pool, "acme").await.unwrap(), vec!["Cables"]);
    let globex = get_product(&pool, "globex", "SHARED").await.unwrap().unwrap();
    assert_eq!(globex.name, "Globex cable");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_matches_metacharacters_literally(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "D1", "100% cotton tee", "20", None).await;
    insert_product(&pool, "acme", "D2", "1000 thread sheets", "80", None).await;
    insert_product(&pool, "acme", "D3", "snake_case mug", "8", None).await;
    insert_product(&pool, "acme", "D4", "snakeXcase mug", "8", None).await;

    let pct = list_products(&pool, "acme", &storefront("search=100%25")).await.unwrap();
    assert_eq!(pct.total, 1);
    assert_eq!(pct.items[0].code, "D1");

    let underscore = list_products(&pool, "acme", &storefront("search=snake_case"))
        .await
        .unwrap();
    assert_eq!(underscore.total, 1);
    assert_eq!(underscore.items[0].code, "D3");
}

#[sqlx::test(migrations = "../../migrations")]
async fn search_is_case_insensitive(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "H1", "HDMI Cable", "10", None).await;
    let page = list_products(&pool, "acme", &storefront("search=hdmi")).await.unwrap();
    assert_eq!(page.total, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn admin_search_covers_code_and_description(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "ZX-900", "Widget", "10", None).await;
    sqlx::query("UPDATE products SET description = 'contains gizmo' WHERE code = 'ZX-900'")
        .execute(&pool)
        .await
        .unwrap();

    let by_code = list_products(&pool, "acme", &admin("search=zx-9")).await.unwrap();
    assert_eq!(by_code.total, 1);
    let by_description = list_products(&pool, "acme", &admin("search=gizmo")).await.unwrap();
    assert_eq!(by_description.total, 1);

    let storefront_only = list_products(&pool, "acme", &storefront("search=gizmo"))
        .await
        .unwrap();
    assert_eq!(storefront_only.total, 0);
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_sort_falls_back_to_name(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "B", "Bravo", "1", None).await;
    insert_product(&pool, "acme", "A", "Alpha", "2", None).await;

    let page = list_products(&pool, "acme", &storefront("sort=__proto__&direction=desc"))
        .await
        .unwrap();
    let names: Vec<_> = page.items.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Bravo", "Alpha"]);
}

// ---------------------------------------------------------------------------
// Section 2: Categories and facets
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn categories_are_distinct_and_sorted(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "1", "a", "1", Some("Video")).await;
    insert_product(&pool, "acme", "2", "b", "1", Some("Audio")).await;
    insert_product(&pool, "acme", "3", "c", "1", Some("Audio")).await;
    insert_product(&pool, "acme", "4", "d", "1", None).await;
    insert_product(&pool, "acme", "5", "e", "1", Some("  ")).await;

    assert_eq!(
        list_categories(&pool, "acme").await.unwrap(),
        vec!["Audio", "Video"]
    );

    let counts = list_category_counts(&pool, "acme").await.unwrap();
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].name, "Audio");
    assert_eq!(counts[0].count, Some(2));
}

#[sqlx::test(migrations = "../../migrations")]
async fn facets_apply_other_filters_but_not_category(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "A1", "Audio cable", "5", Some("Audio")).await;
    insert_product(&pool, "acme", "A2", "Audio amp", "150", Some("Audio")).await;
    insert_product(&pool, "acme", "V1", "Video cable", "5", Some("Video")).await;
    insert_product(&pool, "acme", "V2", "Video cable long", "7", Some("Video")).await;
    insert_product(&pool, "acme", "C1", "Charger", "5", Some("Power")).await;

    let plan = storefront("search=cable&categories=Audio");
    let categories = list_categories(&pool, "acme").await.unwrap();
    let facets = count_category_facets(&pool, "acme", &plan, &categories)
        .await
        .unwrap();

    let summary: Vec<_> = facets
        .iter()
        .map(|f| (f.name.as_str(), f.count.unwrap()))
        .collect();
    assert_eq!(summary, vec![("Video", 2), ("Audio", 1), ("Power", 0)]);
}

// ---------------------------------------------------------------------------
// Section 3: Admin mutations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn create_update_delete_product(pool: sqlx::PgPool) {
    let new = NewProduct {
        code: "NEW-1",
        name: "New thing",
        description: Some("desc"),
        price: dec("12.50"),
        image_url: None,
        category: Some("Misc"),
    };
    let created = create_product(&pool, "acme", &new).await.unwrap();
    assert_eq!(created.price, dec("12.50"));

    let duplicate = create_product(&pool, "acme", &new).await.unwrap_err();
    assert!(duplicate.is_unique_violation());

    let other_tenant = create_product(&pool, "globex", &new).await;
    assert!(other_tenant.is_ok(), "same code in another tenant must be allowed");

    let patch = ProductPatch {
        price: Some(dec("10.00")),
        description: Some(None),
        ..ProductPatch::default()
    };
    let updated = update_product(&pool, "acme", "NEW-1", &patch).await.unwrap();
    assert_eq!(updated.price, dec("10.00"));
    assert!(updated.description.is_none());
    assert_eq!(updated.category.as_deref(), Some("Misc"));

    let missing = update_product(&pool, "acme", "NOPE", &patch).await.unwrap_err();
    assert!(matches!(missing, DbError::NotFound));

    delete_product(&pool, "acme", "NEW-1").await.unwrap();
    assert!(get_product(&pool, "acme", "NEW-1").await.unwrap().is_none());
    assert!(matches!(
        delete_product(&pool, "acme", "NEW-1").await.unwrap_err(),
        DbError::NotFound
    ));
}

#[sqlx::test(migrations = "../../migrations")]
async fn rename_category_updates_matching_rows(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "1", "a", "1", Some("Sound")).await;
    insert_product(&pool, "acme", "2", "b", "1", Some("Sound")).await;
    insert_product(&pool, "acme", "3", "c", "1", Some("Video")).await;
    insert_product(&pool, "globex", "4", "d", "1", Some("Sound")).await;

    let updated = rename_category(&pool, "acme", "Sound", "Audio").await.unwrap();
    assert_eq!(updated, 2);
    assert_eq!(
        list_categories(&pool, "acme").await.unwrap(),
        vec!["Audio", "Video"]
    );
    assert_eq!(list_categories(&pool, "globex").await.unwrap(), vec!["Sound"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn seed_products_upserts(pool: sqlx::PgPool) {
    let seeds = vec![
        ProductSeed {
            code: "S1".to_string(),
            name: "Seeded".to_string(),
            description: None,
            price: dec("1.00"),
            image_url: None,
            category: Some("Seeds".to_string()),
        },
        ProductSeed {
            code: "S2".to_string(),
            name: "Seeded two".to_string(),
            description: None,
            price: dec("2.00"),
            image_url: None,
            category: None,
        },
    ];
    assert_eq!(seed_products(&pool, "acme", &seeds).await.unwrap(), 2);

    let mut changed = seeds.clone();
    changed[0].price = dec("3.00");
    assert_eq!(seed_products(&pool, "acme", &changed).await.unwrap(), 2);

    let s1 = get_product(&pool, "acme", "S1").await.unwrap().unwrap();
    assert_eq!(s1.price, dec("3.00"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn migrations_are_already_applied(pool: sqlx::PgPool) {
    assert_eq!(run_migrations(&pool).await.unwrap(), 0);
}

// ---------------------------------------------------------------------------
// Section 4: Cart and wishlist
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn cart_upsert_is_last_write_wins(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    add_cart_item(&pool, user, &cart_item("A", 1)).await.unwrap();
    add_cart_item(&pool, user, &cart_item("A", 4)).await.unwrap();
    add_cart_item(&pool, user, &cart_item("B", 2)).await.unwrap();

    let items = list_cart_items(&pool, user).await.unwrap();
    assert_eq!(items.len(), 2);
    let a = items.iter().find(|i| i.product_code == "A").unwrap();
    assert_eq!(a.quantity, 4);

    assert!(remove_cart_item(&pool, user, "A").await.unwrap());
    assert!(!remove_cart_item(&pool, user, "A").await.unwrap());

    let other = list_cart_items(&pool, Uuid::new_v4()).await.unwrap();
    assert!(other.is_empty());
}

#[sqlx::test(migrations = "../../migrations")]
async fn replace_cart_swaps_contents(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    add_cart_item(&pool, user, &cart_item("OLD", 1)).await.unwrap();

    let written = replace_cart(&pool, user, &[cart_item("N1", 1), cart_item("N2", 3)])
        .await
        .unwrap();
    assert_eq!(written, 2);

    let mut codes: Vec<_> = list_cart_items(&pool, user)
        .await
        .unwrap()
        .into_iter()
        .map(|i| i.product_code)
        .collect();
    codes.sort();
    assert_eq!(codes, vec!["N1", "N2"]);
}

#[sqlx::test(migrations = "../../migrations")]
async fn wishlist_add_is_idempotent(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    add_wishlist_item(&pool, user, "A", "Alpha", None).await.unwrap();
    add_wishlist_item(&pool, user, "A", "Alpha v2", Some("/a.png")).await.unwrap();

    let items = list_wishlist_items(&pool, user).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_name, "Alpha v2");

    assert!(remove_wishlist_item(&pool, user, "A").await.unwrap());
    assert!(list_wishlist_items(&pool, user).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Section 5: Orders, newsletter, sessions, stats
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn order_insert_is_idempotent_per_session(pool: sqlx::PgPool) {
    assert!(insert_completed_order(&pool, &order("cs_1", "ada@example.com", 1999))
        .await
        .unwrap());
    assert!(!insert_completed_order(&pool, &order("cs_1", "ada@example.com", 1999))
        .await
        .unwrap());

    let orders = list_orders_for_email(&pool, "ADA@example.com").await.unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].amount_total, 1999);
    assert_eq!(orders[0].status, "completed");
}

#[sqlx::test(migrations = "../../migrations")]
async fn admin_order_listing_filters_and_paginates(pool: sqlx::PgPool) {
    for i in 0..30 {
        let session = format!("cs_{i}");
        let email = if i % 2 == 0 { "even@example.com" } else { "odd@example.com" };
        insert_completed_order(&pool, &order(&session, email, 100)).await.unwrap();
    }

    let filters = OrderFilters {
        status: Some("completed"),
        search: Some("even@"),
        page: 1,
        page_size: 10,
    };
    let page = list_orders_admin(&pool, &filters).await.unwrap();
    assert_eq!(page.total, 15);
    assert_eq!(page.total_pages, 2);
    assert_eq!(page.items.len(), 10);
    assert!(page
        .items
        .iter()
        .all(|o| o.customer_email.as_deref() == Some("even@example.com")));

    let none = list_orders_admin(
        &pool,
        &OrderFilters {
            status: Some("refunded"),
            page: 1,
            page_size: 10,
            ..OrderFilters::default()
        },
    )
    .await
    .unwrap();
    assert_eq!(none.total, 0);
    assert_eq!(none.total_pages, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn newsletter_subscription_normalizes_email(pool: sqlx::PgPool) {
    let first = subscribe(&pool, "  Ada@Example.COM ", Some("Ada"), "footer")
        .await
        .unwrap();
    assert_eq!(first.email, "ada@example.com");

    let again = subscribe(&pool, "ada@example.com", None, "footer").await.unwrap();
    assert_eq!(again.name.as_deref(), Some("Ada"));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM newsletter_subscribers")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn expired_sessions_are_not_resolved(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO user_sessions (token, user_id, email, expires_at) VALUES \
         ('live', $1, 'ada@example.com', NOW() + INTERVAL '1 hour'), \
         ('dead', $1, 'ada@example.com', NOW() - INTERVAL '1 hour')",
    )
    .bind(user)
    .execute(&pool)
    .await
    .unwrap();

    let live = find_session(&pool, "live").await.unwrap().unwrap();
    assert_eq!(live.user_id, user);
    assert!(find_session(&pool, "dead").await.unwrap().is_none());
    assert!(find_session(&pool, "unknown").await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn admin_stats_counts_everything(pool: sqlx::PgPool) {
    insert_product(&pool, "acme", "1", "a", "1", Some("Audio")).await;
    insert_product(&pool, "acme", "2", "b", "1", Some("Video")).await;
    insert_product(&pool, "globex", "3", "c", "1", Some("Other")).await;
    insert_completed_order(&pool, &order("cs_a", "a@example.com", 1999))
        .await
        .unwrap();
    insert_completed_order(&pool, &order("cs_b", "b@example.com", 501))
        .await
        .unwrap();
    subscribe(&pool, "a@example.com", None, "footer").await.unwrap();

    let stats = admin_stats(&pool, "acme").await.unwrap();
    assert_eq!(stats.total_products, 2);
    assert_eq!(stats.total_categories, 2);
    assert_eq!(stats.total_orders, 2);
    assert_eq!(stats.orders_today, 2);
    assert_eq!(stats.total_revenue, dec("25.00"));
    assert_eq!(stats.total_subscribers, 1);
    assert_eq!(stats.recent_orders.len(), 2);
}

#[sqlx::test(migrations = "../../migrations")]
async fn analytics_events_are_recorded_with_optional_user(pool: sqlx::PgPool) {
    let user = Uuid::new_v4();
    let signed_in = NewAnalyticsEvent {
        user_id: Some(user),
        event_type: "add_to_cart",
        event_data: json!({ "code": "C-1" }),
        ip_address: Some("203.0.113.5"),
        user_agent: Some("test-agent"),
    };
    let anonymous = NewAnalyticsEvent {
        user_id: None,
        event_type: "page_view",
        event_data: json!({}),
        ip_address: None,
        user_agent: None,
    };

    let first = insert_analytics_event(&pool, "acme", &signed_in).await.unwrap();
    let second = insert_analytics_event(&pool, "acme", &anonymous).await.unwrap();
    assert!(second > first);

    let (event_type, data, owner): (String, serde_json::Value, Option<Uuid>) = sqlx::query_as(
        "SELECT event_type, event_data, user_id FROM analytics_events WHERE id = $1",
    )
    .bind(first)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(event_type, "add_to_cart");
    assert_eq!(data["code"], "C-1");
    assert_eq!(owner, Some(user));

    let blank = NewAnalyticsEvent {
        event_type: "  ",
        ..anonymous
    };
    assert!(insert_analytics_event(&pool, "acme", &blank).await.is_err());
}
