//! Client for a Stripe-compatible hosted checkout provider.
//!
//! [`StripeClient`] creates and retrieves checkout sessions over the
//! provider's form-encoded REST API; [`webhook`] verifies signed event
//! deliveries and [`normalize`] turns provider payloads into the
//! storefront's order shapes.

pub mod client;
pub mod error;
pub mod normalize;
pub(crate) mod retry;
pub mod types;
pub mod webhook;

pub use client::StripeClient;
pub use error::PaymentError;
pub use normalize::{checkout_form, payment_completed, session_status, to_cents, GUEST_USER};
pub use types::{
    CheckoutItem, CheckoutRequest, CheckoutSession, CustomerDetails, EventKind, LineItem,
    PaymentCompleted, SessionStatus, WebhookEvent,
};
pub use webhook::{construct_event, sign, verify_signature, DEFAULT_TOLERANCE_SECS};
