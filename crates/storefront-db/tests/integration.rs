//! Offline unit tests for storefront-db pool configuration and row types.
//! These tests do not require a live database connection.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use chrono::Utc;
use rust_decimal::Decimal;
use storefront_core::{AppConfig, Environment, Product};
use storefront_db::{PoolConfig, ProductPatch, ProductRow};

fn app_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        bind_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 3000),
        log_level: "info".to_string(),
        tenant: "acme".to_string(),
        site_url: "http://localhost:3000".to_string(),
        page_size: 24,
        admin_page_size: 50,
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        store_timeout_secs: 5,
        stripe_secret_key: None,
        stripe_webhook_secret: None,
        stripe_api_base: "https://api.stripe.com".to_string(),
        payments_timeout_secs: 20,
        payments_max_retries: 2,
        checkout_allowed_countries: vec!["US".to_string()],
        statement_descriptor: None,
        storage_url: None,
        storage_service_key: None,
        storage_bucket: "products".to_string(),
    }
}

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let pool_config = PoolConfig::from_app_config(&app_config());
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn product_row_converts_to_domain_product() {
    let now = Utc::now();
    let row = ProductRow {
        tenant: "acme".to_string(),
        code: "CBL-1".to_string(),
        name: "USB-C cable".to_string(),
        description: Some("1m braided".to_string()),
        price: Decimal::from_str("9.99").unwrap(),
        image_url: None,
        category: Some("Cables".to_string()),
        created_at: now,
        updated_at: now,
    };

    let product = Product::from(row);
    assert_eq!(product.code, "CBL-1");
    assert_eq!(product.price.to_string(), "9.99");
    assert_eq!(product.category.as_deref(), Some("Cables"));
    assert_eq!(product.created_at, now);
}

#[test]
fn empty_patch_is_detected() {
    assert!(ProductPatch::default().is_empty());
    let patch = ProductPatch {
        category: Some(None),
        ..ProductPatch::default()
    };
    assert!(!patch.is_empty());
}
