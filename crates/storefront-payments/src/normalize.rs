//! Conversion between storefront types and provider payloads.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

use crate::error::PaymentError;
use crate::types::{CheckoutRequest, CheckoutSession, LineItem, PaymentCompleted, SessionStatus};

/// Metadata value stored for shoppers who are not signed in.
pub const GUEST_USER: &str = "guest";

const CURRENCY: &str = "usd";

/// Converts a major-unit USD amount to integer cents, rounding half away
/// from zero. Returns `None` if the result does not fit in an `i64`.
#[must_use]
pub fn to_cents(amount: Decimal) -> Option<i64> {
    (amount * Decimal::ONE_HUNDRED)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .to_i64()
}

/// Renders a checkout request as the provider's bracketed form fields.
///
/// # Errors
///
/// Returns [`PaymentError::InvalidRequest`] when there are no items, or an
/// item has a blank name, a non-positive price or a zero quantity.
pub fn checkout_form(request: &CheckoutRequest) -> Result<Vec<(String, String)>, PaymentError> {
    if request.items.is_empty() {
        return Err(PaymentError::InvalidRequest("no items provided".to_owned()));
    }

    let mut form: Vec<(String, String)> = vec![
        ("mode".into(), "payment".into()),
        ("success_url".into(), request.success_url.clone()),
        ("cancel_url".into(), request.cancel_url.clone()),
        ("customer_creation".into(), "always".into()),
        (
            "metadata[user_id]".into(),
            request.user_id.clone().unwrap_or_else(|| GUEST_USER.to_owned()),
        ),
    ];

    for (i, item) in request.items.iter().enumerate() {
        if item.name.trim().is_empty() || item.price <= Decimal::ZERO || item.quantity == 0 {
            return Err(PaymentError::InvalidRequest(
                "each item must have name, price, and quantity".to_owned(),
            ));
        }
        let cents = to_cents(item.price)
            .ok_or_else(|| PaymentError::InvalidRequest(format!("price out of range: {}", item.price)))?;

        let prefix = format!("line_items[{i}]");
        form.push((format!("{prefix}[price_data][currency]"), CURRENCY.to_owned()));
        form.push((
            format!("{prefix}[price_data][product_data][name]"),
            item.name.clone(),
        ));
        if let Some(image) = item.image.as_deref().filter(|s| !s.is_empty()) {
            form.push((
                format!("{prefix}[price_data][product_data][images][0]"),
                image.to_owned(),
            ));
        }
        if let Some(description) = item.description.as_deref().filter(|s| !s.is_empty()) {
            form.push((
                format!("{prefix}[price_data][product_data][description]"),
                description.to_owned(),
            ));
        }
        form.push((format!("{prefix}[price_data][unit_amount]"), cents.to_string()));
        form.push((format!("{prefix}[quantity]"), item.quantity.to_string()));
    }

    for (i, country) in request.allowed_countries.iter().enumerate() {
        form.push((
            format!("shipping_address_collection[allowed_countries][{i}]"),
            country.clone(),
        ));
    }

    if let Some(descriptor) = request.statement_descriptor.as_deref() {
        form.push((
            "payment_intent_data[statement_descriptor]".into(),
            descriptor.to_owned(),
        ));
    }

    Ok(form)
}

/// Summarizes a retrieved session for the post-checkout page.
#[must_use]
pub fn session_status(session: &CheckoutSession) -> SessionStatus {
    let customer = session.customer_details.clone().unwrap_or_default();
    SessionStatus {
        status: session
            .payment_status
            .clone()
            .unwrap_or_else(|| "unpaid".to_owned()),
        customer_email: customer.email,
        customer_name: customer.name,
        amount_total: session.amount_total,
        currency: session.currency.clone(),
        line_items: session
            .line_items
            .as_ref()
            .map(|list| list.data.clone())
            .unwrap_or_default(),
    }
}

/// Builds the order event for a completed session.
///
/// `line_items` are passed separately because webhook payloads do not embed
/// them; the caller fetches them from the provider.
#[must_use]
pub fn payment_completed(session: &CheckoutSession, line_items: Vec<LineItem>) -> PaymentCompleted {
    let customer = session.customer_details.clone().unwrap_or_default();
    let user_id = session
        .metadata
        .get("user_id")
        .filter(|id| !id.is_empty() && id.as_str() != GUEST_USER)
        .cloned();

    PaymentCompleted {
        session_id: session.id.clone(),
        payment_intent_id: session.payment_intent.clone(),
        customer_email: customer.email,
        customer_name: customer.name,
        amount_total: session.amount_total.unwrap_or(0),
        currency: session.currency.clone().unwrap_or_else(|| CURRENCY.to_owned()),
        user_id,
        shipping_address: session
            .shipping_details
            .as_ref()
            .and_then(|s| s.address.clone()),
        line_items,
    }
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
