pub mod app_config;
pub mod browse;
pub mod catalog;
pub mod catalog_file;
pub mod config;
pub mod pagination;
pub mod querystring;

pub use app_config::{AppConfig, Environment};
pub use browse::{BrowseState, FilterState, Phase};
pub use catalog::{
    build_query, escape_like, rank_facets, CategoryFacet, FilterRequest, Product, QueryPlan,
    SearchPredicate, SortDirection, SortKey, Surface, ValidationError,
};
pub use catalog_file::{load_catalog_file, CatalogFile, ProductSeed};
pub use config::{load_app_config, load_app_config_from_env};
pub use pagination::{
    page_sequence, paginate, total_pages, PageEntry, PageWindow, ResultPage, MAX_PAGE_SIZE,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog file {path}: {source}")]
    CatalogFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog file: {0}")]
    CatalogFileParse(#[source] serde_yaml::Error),

    #[error("catalog validation failed: {0}")]
    CatalogValidation(String),
}

/// Failure taxonomy shared by every catalog consumer.
///
/// `Validation` never reaches an end user: the query builder coerces the
/// input and records the problem instead. The other variants are surfaced
/// distinctly so a UI can choose between "retry", "not found" and "sign in".
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid filter input: {0}")]
    Validation(#[from] ValidationError),

    #[error("catalog store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("product '{0}' not found")]
    NotFound(String),

    #[error("authentication required")]
    Unauthorized,
}

impl CatalogError {
    /// Whether a client should offer a retry for this failure.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreUnavailable(_))
    }
}
