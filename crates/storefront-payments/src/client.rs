//! HTTP client for a Stripe-compatible checkout API.
//!
//! Requests are form-encoded and authenticated with the secret key as a
//! bearer token. Non-2xx responses are decoded from the provider's
//! `{ "error": { "message": ... } }` envelope into [`PaymentError::Api`].
//! Transient failures are retried with jittered exponential back-off; session
//! creation carries an idempotency key so a retried POST never opens two
//! sessions.

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::de::DeserializeOwned;

use crate::error::PaymentError;
use crate::normalize::checkout_form;
use crate::retry::retry_with_backoff;
use crate::types::{CheckoutRequest, CheckoutSession, ErrorEnvelope, LineItem, List};

const DEFAULT_BASE_URL: &str = "https://api.stripe.com";
const BACKOFF_BASE_MS: u64 = 500;

/// Client for the checkout-session endpoints.
///
/// Use [`StripeClient::new`] for production or [`StripeClient::with_base_url`]
/// to point at a mock server in tests.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: String,
    base_url: Url,
    max_retries: u32,
    backoff_base_ms: u64,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("base_url", &self.base_url.as_str())
            .field("secret_key", &"[redacted]")
            .field("max_retries", &self.max_retries)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(secret_key: &str, timeout_secs: u64, max_retries: u32) -> Result<Self, PaymentError> {
        Self::with_base_url(secret_key, timeout_secs, max_retries, DEFAULT_BASE_URL)
    }

    /// Creates a client with a custom base URL (for testing with wiremock).
    ///
    /// # Errors
    ///
    /// Returns [`PaymentError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed, or [`PaymentError::InvalidRequest`] if
    /// `base_url` is not a valid URL.
    pub fn with_base_url(
        secret_key: &str,
        timeout_secs: u64,
        max_retries: u32,
        base_url: &str,
    ) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent("storefront/0.1")
            .build()?;

        let normalised = format!("{}/", base_url.trim_end_matches('/'));
        let base_url = Url::parse(&normalised).map_err(|e| {
            PaymentError::InvalidRequest(format!("invalid base URL '{base_url}': {e}"))
        })?;

        Ok(Self {
            client,
            secret_key: secret_key.to_owned(),
            base_url,
            max_retries,
            backoff_base_ms: BACKOFF_BASE_MS,
        })
    }

    /// Overrides the back-off base delay. Tests use `0` to retry instantly.
    #[must_use]
    pub fn with_backoff_base_ms(mut self, backoff_base_ms: u64) -> Self {
        self.backoff_base_ms = backoff_base_ms;
        self
    }

    /// Opens a hosted checkout session and returns it (including its redirect URL).
    ///
    /// # Errors
    ///
    /// - [`PaymentError::InvalidRequest`] if the items fail validation.
    /// - [`PaymentError::Api`] if the provider rejects the request.
    /// - [`PaymentError::Http`] on network failure.
    /// - [`PaymentError::Deserialize`] if the response shape is unexpected.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let form = checkout_form(request)?;
        let url = self.endpoint(&["v1", "checkout", "sessions"]);
        let idempotency_key = uuid::Uuid::new_v4().to_string();

        let session: CheckoutSession = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let builder = self
                .authorized(self.client.post(url.clone()))
                .header("Idempotency-Key", &idempotency_key)
                .form(&form);
            self.send_json(builder, "create checkout session")
        })
        .await?;

        tracing::info!(session_id = %session.id, items = request.items.len(), "checkout session created");
        Ok(session)
    }

    /// Retrieves a session with its line items expanded.
    ///
    /// # Errors
    ///
    /// - [`PaymentError::Api`] if the session does not exist (404) or the
    ///   provider rejects the request.
    /// - [`PaymentError::Http`] on network failure.
    /// - [`PaymentError::Deserialize`] if the response shape is unexpected.
    pub async fn retrieve_session(&self, session_id: &str) -> Result<CheckoutSession, PaymentError> {
        let mut url = self.endpoint(&["v1", "checkout", "sessions", session_id]);
        url.query_pairs_mut().append_pair("expand[]", "line_items");

        retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let builder = self.authorized(self.client.get(url.clone()));
            self.send_json(builder, "retrieve checkout session")
        })
        .await
    }

    /// Lists the purchased lines of a session (first 100).
    ///
    /// # Errors
    ///
    /// - [`PaymentError::Api`] if the provider rejects the request.
    /// - [`PaymentError::Http`] on network failure.
    /// - [`PaymentError::Deserialize`] if the response shape is unexpected.
    pub async fn list_line_items(&self, session_id: &str) -> Result<Vec<LineItem>, PaymentError> {
        let mut url = self.endpoint(&["v1", "checkout", "sessions", session_id, "line_items"]);
        url.query_pairs_mut().append_pair("limit", "100");

        let list: List<LineItem> = retry_with_backoff(self.max_retries, self.backoff_base_ms, || {
            let builder = self.authorized(self.client.get(url.clone()));
            self.send_json(builder, "list line items")
        })
        .await?;

        if list.has_more {
            tracing::warn!(session_id, "session has more than 100 line items; list truncated");
        }
        Ok(list.data)
    }

    /// Joins path segments onto the base URL, percent-encoding each one.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(&self.secret_key)
    }

    /// Sends a request and decodes either the success body or the provider's
    /// error envelope.
    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        context: &str,
    ) -> Result<T, PaymentError> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .ok()
                .map(|envelope| match (envelope.error.kind, envelope.error.message) {
                    (Some(kind), Some(message)) => format!("{kind}: {message}"),
                    (None, Some(message)) => message,
                    (Some(kind), None) => kind,
                    (None, None) => status.to_string(),
                })
                .unwrap_or_else(|| status.to_string());
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&body).map_err(|e| PaymentError::Deserialize {
            context: context.to_owned(),
            source: e,
        })
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
