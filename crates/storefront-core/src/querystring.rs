//! Minimal `application/x-www-form-urlencoded` helpers shared by the HTTP
//! filter parser and the browse URL codec.

use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

/// Characters escaped in a query component. Unreserved characters stay
/// readable; `,` is escaped so comma-joined lists survive a round trip.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// Split a query string into `(key, raw_value)` pairs.
///
/// Keys are decoded; values are left encoded so callers can split lists on
/// literal separators before decoding each element. A leading `?` is ignored.
#[must_use]
pub fn raw_pairs(query: &str) -> Vec<(String, &str)> {
    query
        .trim_start_matches('?')
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode(key), value),
            None => (decode(pair), ""),
        })
        .collect()
}

/// Decode one query component, treating `+` as a space.
#[must_use]
pub fn decode(component: &str) -> String {
    let spaced = component.replace('+', " ");
    percent_decode_str(&spaced).decode_utf8_lossy().into_owned()
}

/// Percent-encode one query component.
#[must_use]
pub fn encode(component: &str) -> String {
    utf8_percent_encode(component, COMPONENT).to_string()
}

/// Join already-encoded `key=value` pairs.
#[must_use]
pub fn join(pairs: &[(&str, String)]) -> String {
    pairs
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&")
}
