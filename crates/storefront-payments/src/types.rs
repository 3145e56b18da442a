//! Request and response types for the checkout provider.
//!
//! Provider payloads are modelled loosely: every field the storefront does
//! not strictly need is optional, so additive API changes never break
//! deserialization.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Outbound
// ---------------------------------------------------------------------------

/// One cart line submitted for checkout. `price` is in major USD units.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutItem {
    pub name: String,
    pub price: Decimal,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Everything needed to open a hosted checkout session.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub items: Vec<CheckoutItem>,
    /// Signed-in shopper, or `None` for a guest checkout.
    pub user_id: Option<String>,
    pub success_url: String,
    pub cancel_url: String,
    pub allowed_countries: Vec<String>,
    pub statement_descriptor: Option<String>,
}

// ---------------------------------------------------------------------------
// Inbound
// ---------------------------------------------------------------------------

/// A checkout session as returned by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub payment_intent: Option<String>,
    #[serde(default)]
    pub customer_details: Option<CustomerDetails>,
    /// Minor currency units.
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
    #[serde(default)]
    pub shipping_details: Option<ShippingDetails>,
    /// Present only when the session was retrieved with `expand[]=line_items`.
    #[serde(default)]
    pub line_items: Option<List<LineItem>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerDetails {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ShippingDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<serde_json::Value>,
}

/// A paginated provider list: `{ "data": [...], "has_more": bool }`.
#[derive(Debug, Clone, Deserialize)]
pub struct List<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub has_more: bool,
}

/// A purchased line on a checkout session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(default)]
    pub amount_total: Option<i64>,
    #[serde(default)]
    pub currency: Option<String>,
}

/// Error body: `{ "error": { "message": "...", "type": "..." } }`.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorEnvelope {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
}

// ---------------------------------------------------------------------------
// Webhooks
// ---------------------------------------------------------------------------

/// A verified webhook delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: EventData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EventData {
    pub object: serde_json::Value,
}

/// The event types the storefront reacts to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    CheckoutCompleted,
    AsyncPaymentSucceeded,
    AsyncPaymentFailed,
    Other(String),
}

impl WebhookEvent {
    #[must_use]
    pub fn kind(&self) -> EventKind {
        match self.event_type.as_str() {
            "checkout.session.completed" => EventKind::CheckoutCompleted,
            "checkout.session.async_payment_succeeded" => EventKind::AsyncPaymentSucceeded,
            "checkout.session.async_payment_failed" => EventKind::AsyncPaymentFailed,
            other => EventKind::Other(other.to_owned()),
        }
    }

    /// Deserializes the event payload as a checkout session.
    ///
    /// # Errors
    ///
    /// Returns [`crate::PaymentError::Deserialize`] if the object is not a
    /// checkout session.
    pub fn checkout_session(&self) -> Result<CheckoutSession, crate::PaymentError> {
        serde_json::from_value(self.data.object.clone()).map_err(|e| {
            crate::PaymentError::Deserialize {
                context: format!("event {} ({})", self.id, self.event_type),
                source: e,
            }
        })
    }
}

// ---------------------------------------------------------------------------
// Normalized shapes
// ---------------------------------------------------------------------------

/// What the storefront shows on the post-checkout page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionStatus {
    pub status: String,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub line_items: Vec<LineItem>,
}

/// A completed checkout, ready to persist as an order.
#[derive(Debug, Clone, PartialEq)]
pub struct PaymentCompleted {
    pub session_id: String,
    pub payment_intent_id: Option<String>,
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
    pub amount_total: i64,
    pub currency: String,
    /// `None` for guest checkouts.
    pub user_id: Option<String>,
    pub shipping_address: Option<serde_json::Value>,
    pub line_items: Vec<LineItem>,
}
