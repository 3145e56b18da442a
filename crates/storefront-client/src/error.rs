use storefront_core::browse::FetchFailure;
use thiserror::Error;

/// Errors returned by [`crate::CatalogClient`].
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with its error envelope.
    #[error("catalog API error ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

impl ClientError {
    /// Maps the error to what the browse state machine records.
    #[must_use]
    pub fn to_failure(&self) -> FetchFailure {
        match self {
            Self::Http(e) if e.is_timeout() => FetchFailure::TimedOut,
            other => FetchFailure::Unavailable(other.to_string()),
        }
    }
}
