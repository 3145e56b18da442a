use thiserror::Error;

/// Errors returned by the payment-provider client and webhook verifier.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Network or TLS failure from the underlying HTTP client.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The provider answered with a non-2xx status and an error body.
    #[error("payment provider error ({status}): {message}")]
    Api { status: u16, message: String },

    /// The checkout request was rejected before reaching the provider.
    #[error("invalid checkout request: {0}")]
    InvalidRequest(String),

    /// A webhook delivery failed signature verification.
    #[error("webhook signature verification failed: {0}")]
    InvalidSignature(String),

    /// The response body could not be deserialized into the expected type.
    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },
}

impl PaymentError {
    /// Whether the error is the caller's fault (bad input or bad signature)
    /// rather than a provider or network failure.
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::InvalidRequest(_) | Self::InvalidSignature(_) => true,
            Self::Api { status, .. } => (400..500).contains(status) && *status != 429,
            Self::Http(_) | Self::Deserialize { .. } => false,
        }
    }
}
