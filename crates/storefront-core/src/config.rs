use crate::app_config::{AppConfig, Environment};
use crate::pagination::MAX_PAGE_SIZE;
use crate::ConfigError;

const DEFAULT_ALLOWED_COUNTRIES: &str = "US,CA,MX,VE,CO,EC,PE,CL,AR,BR";

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files: useful for testing
/// or when the caller manages env setup.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// This is the core parsing/validation logic, decoupled from the actual environment
/// so it can be tested with a pure `HashMap` lookup: no `set_var`/`remove_var` needed.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::net::SocketAddr;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let parse_addr = |var: &str, default: &str| -> Result<SocketAddr, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u32>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    let parse_page_size = |var: &str, default: &str| -> Result<u32, ConfigError> {
        let value = parse_u32(var, default)?;
        if (1..=MAX_PAGE_SIZE).contains(&value) {
            Ok(value)
        } else {
            Err(ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: format!("must be between 1 and {MAX_PAGE_SIZE}, got {value}"),
            })
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("STOREFRONT_ENV", "development"))?;

    let bind_addr = parse_addr("STOREFRONT_BIND_ADDR", "0.0.0.0:3000")?;
    let log_level = or_default("STOREFRONT_LOG_LEVEL", "info");

    let tenant = or_default("STOREFRONT_TENANT", "default").trim().to_string();
    if tenant.is_empty() {
        return Err(ConfigError::InvalidEnvVar {
            var: "STOREFRONT_TENANT".to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    let site_url = or_default(
        "STOREFRONT_SITE_URL",
        &format!("http://localhost:{}", bind_addr.port()),
    )
    .trim_end_matches('/')
    .to_string();

    let page_size = parse_page_size("STOREFRONT_PAGE_SIZE", "24")?;
    let admin_page_size = parse_page_size("STOREFRONT_ADMIN_PAGE_SIZE", "50")?;

    let db_max_connections = parse_u32("STOREFRONT_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("STOREFRONT_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("STOREFRONT_DB_ACQUIRE_TIMEOUT_SECS", "10")?;
    let store_timeout_secs = parse_u64("STOREFRONT_STORE_TIMEOUT_SECS", "5")?;

    let stripe_secret_key = optional("STRIPE_SECRET_KEY");
    let stripe_webhook_secret = optional("STRIPE_WEBHOOK_SECRET");
    let stripe_api_base = or_default("STRIPE_API_BASE", "https://api.stripe.com");
    let payments_timeout_secs = parse_u64("STOREFRONT_PAYMENTS_TIMEOUT_SECS", "20")?;
    let payments_max_retries = parse_u32("STOREFRONT_PAYMENTS_MAX_RETRIES", "2")?;
    let checkout_allowed_countries = parse_country_list(&or_default(
        "STOREFRONT_CHECKOUT_COUNTRIES",
        DEFAULT_ALLOWED_COUNTRIES,
    ))?;
    let statement_descriptor = optional("STOREFRONT_STATEMENT_DESCRIPTOR");

    let storage_url = optional("STORAGE_URL");
    let storage_service_key = optional("STORAGE_SERVICE_KEY");
    let storage_bucket = or_default("STORAGE_BUCKET", "products");

    Ok(AppConfig {
        database_url,
        env,
        bind_addr,
        log_level,
        tenant,
        site_url,
        page_size,
        admin_page_size,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        store_timeout_secs,
        stripe_secret_key,
        stripe_webhook_secret,
        stripe_api_base,
        payments_timeout_secs,
        payments_max_retries,
        checkout_allowed_countries,
        statement_descriptor,
        storage_url,
        storage_service_key,
        storage_bucket,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "production" => Ok(Environment::Production),
        "test" => Ok(Environment::Test),
        other => Err(ConfigError::InvalidEnvVar {
            var: "STOREFRONT_ENV".to_string(),
            reason: format!("expected development, test, or production, got '{other}'"),
        }),
    }
}

/// Parse a comma-separated list of ISO 3166 alpha-2 country codes.
fn parse_country_list(raw: &str) -> Result<Vec<String>, ConfigError> {
    let mut countries = Vec::new();
    for code in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ConfigError::InvalidEnvVar {
                var: "STOREFRONT_CHECKOUT_COUNTRIES".to_string(),
                reason: format!("'{code}' is not a two-letter country code"),
            });
        }
        countries.push(code.to_ascii_uppercase());
    }
    Ok(countries)
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
