//! HTTP client for the storefront catalog API.

use std::future::Future;
use std::time::Duration;

use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use storefront_core::{CategoryFacet, FilterRequest, Product, ResultPage};

use crate::error::ClientError;

/// Where a [`crate::BrowseSession`] gets its data from.
///
/// [`CatalogClient`] is the network implementation; tests substitute an
/// in-memory source with scripted latency.
pub trait CatalogSource: Send + Sync + 'static {
    /// One page of products for `request`.
    fn fetch_page(
        &self,
        request: FilterRequest,
    ) -> impl Future<Output = Result<ResultPage<Product>, ClientError>> + Send;

    /// Per-category counts for `request`, ignoring its own category filter.
    fn fetch_facets(
        &self,
        request: FilterRequest,
    ) -> impl Future<Output = Result<Vec<CategoryFacet>, ClientError>> + Send;
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

/// Client for `/api/v1` on a storefront server.
#[derive(Debug, Clone)]
pub struct CatalogClient {
    client: Client,
    base_url: Url,
}

impl CatalogClient {
    /// Creates a client for the server at `base_url` (scheme, host and port;
    /// the `/api/v1` prefix is added per request).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ClientError::InvalidBaseUrl`] if `base_url` does not parse.
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(Duration::from_secs(5))
            .user_agent("storefront-client/0.1")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| ClientError::InvalidBaseUrl {
            url: base_url.to_owned(),
            reason: e.to_string(),
        })?;

        Ok(Self { client, base_url })
    }

    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure, an API error envelope, or
    /// an unexpected body.
    pub async fn list_products(
        &self,
        request: &FilterRequest,
    ) -> Result<ResultPage<Product>, ClientError> {
        let url = self.url(&["products"], &request.to_query());
        self.get_data(url, "list products").await
    }

    /// Returns `None` when the server answers 404.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on any other failure.
    pub async fn get_product(&self, code: &str) -> Result<Option<Product>, ClientError> {
        let url = self.url(&["products", code], "");
        match self.get_data(url, "get product").await {
            Ok(product) => Ok(Some(product)),
            Err(ClientError::Api { status: 404, .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure, an API error envelope, or
    /// an unexpected body.
    pub async fn list_categories(&self) -> Result<Vec<String>, ClientError> {
        let url = self.url(&["categories"], "");
        self.get_data(url, "list categories").await
    }

    /// # Errors
    ///
    /// Returns [`ClientError`] on network failure, an API error envelope, or
    /// an unexpected body.
    pub async fn category_facets(
        &self,
        request: &FilterRequest,
    ) -> Result<Vec<CategoryFacet>, ClientError> {
        let url = self.url(&["categories", "facets"], &request.to_query());
        self.get_data(url, "category facets").await
    }

    fn url(&self, segments: &[&str], query: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(["api", "v1"]).extend(segments);
        }
        url.set_query((!query.is_empty()).then_some(query));
        url
    }

    async fn get_data<T: DeserializeOwned>(&self, url: Url, context: &str) -> Result<T, ClientError> {
        tracing::debug!(%url, "catalog request");
        let response = self.client.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let (code, message) = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| (e.error.code, e.error.message))
                .unwrap_or_else(|_| ("http_error".to_owned(), status.to_string()));
            return Err(ClientError::Api {
                status: status.as_u16(),
                code,
                message,
            });
        }

        serde_json::from_str::<Envelope<T>>(&body)
            .map(|envelope| envelope.data)
            .map_err(|e| ClientError::Deserialize {
                context: context.to_owned(),
                source: e,
            })
    }
}

impl CatalogSource for CatalogClient {
    fn fetch_page(
        &self,
        request: FilterRequest,
    ) -> impl Future<Output = Result<ResultPage<Product>, ClientError>> + Send {
        async move { self.list_products(&request).await }
    }

    fn fetch_facets(
        &self,
        request: FilterRequest,
    ) -> impl Future<Output = Result<Vec<CategoryFacet>, ClientError>> + Send {
        async move { self.category_facets(&request).await }
    }
}
