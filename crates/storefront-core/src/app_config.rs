use std::net::SocketAddr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// Tenant whose catalog this deployment serves.
    pub tenant: String,
    /// Public origin used for checkout redirect URLs.
    pub site_url: String,
    pub page_size: u32,
    pub admin_page_size: u32,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    /// Upper bound for a single catalog query before it is reported as
    /// `StoreUnavailable`.
    pub store_timeout_secs: u64,
    pub stripe_secret_key: Option<String>,
    pub stripe_webhook_secret: Option<String>,
    pub stripe_api_base: String,
    pub payments_timeout_secs: u64,
    pub payments_max_retries: u32,
    pub checkout_allowed_countries: Vec<String>,
    pub statement_descriptor: Option<String>,
    pub storage_url: Option<String>,
    pub storage_service_key: Option<String>,
    pub storage_bucket: String,
}

impl AppConfig {
    /// Payments are enabled only when both Stripe secrets are present.
    #[must_use]
    pub fn payments_enabled(&self) -> bool {
        self.stripe_secret_key.is_some() && self.stripe_webhook_secret.is_some()
    }

    #[must_use]
    pub fn storage_enabled(&self) -> bool {
        self.storage_url.is_some() && self.storage_service_key.is_some()
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("tenant", &self.tenant)
            .field("site_url", &self.site_url)
            .field("database_url", &"[redacted]")
            .field("page_size", &self.page_size)
            .field("admin_page_size", &self.admin_page_size)
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("store_timeout_secs", &self.store_timeout_secs)
            .field(
                "stripe_secret_key",
                &self.stripe_secret_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "stripe_webhook_secret",
                &self.stripe_webhook_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("stripe_api_base", &self.stripe_api_base)
            .field("payments_timeout_secs", &self.payments_timeout_secs)
            .field("payments_max_retries", &self.payments_max_retries)
            .field(
                "checkout_allowed_countries",
                &self.checkout_allowed_countries,
            )
            .field("statement_descriptor", &self.statement_descriptor)
            .field("storage_url", &self.storage_url)
            .field(
                "storage_service_key",
                &self.storage_service_key.as_ref().map(|_| "[redacted]"),
            )
            .field("storage_bucket", &self.storage_bucket)
            .finish()
    }
}
