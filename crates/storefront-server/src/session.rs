//! Shopper identity resolved from the session token issued by the auth
//! provider.
//!
//! The token is read from the `x-session-token` header, falling back to the
//! `storefront_session` cookie.

use axum::{
    extract::FromRequestParts,
    http::{header::COOKIE, request::Parts, HeaderMap},
};
use serde::Serialize;
use storefront_core::CatalogError;
use uuid::Uuid;

use crate::api::{map_db_error, ApiError, AppState};
use crate::middleware::RequestId;

pub const SESSION_HEADER: &str = "x-session-token";
pub const SESSION_COOKIE: &str = "storefront_session";

/// A signed-in shopper. Handlers taking this reject anonymous requests
/// with 401 `unauthorized`.
#[derive(Debug, Clone, Serialize)]
pub struct Shopper {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

/// The shopper if one is signed in. Never rejects on a missing or stale
/// token.
#[derive(Debug, Clone)]
pub struct MaybeShopper(pub Option<Shopper>);

fn session_token(headers: &HeaderMap) -> Option<String> {
    if let Some(token) = headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty())
    {
        return Some(token.to_owned());
    }

    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, value)| *name == SESSION_COOKIE && !value.is_empty())
        .map(|(_, value)| value.to_owned())
}

fn request_id(parts: &Parts) -> String {
    parts
        .extensions
        .get::<RequestId>()
        .map(|id| id.0.clone())
        .unwrap_or_default()
}

async fn resolve(parts: &Parts, state: &AppState) -> Result<Option<Shopper>, ApiError> {
    let Some(token) = session_token(&parts.headers) else {
        return Ok(None);
    };

    let row = state
        .bounded(storefront_db::find_session(&state.pool, &token))
        .await
        .map_err(|e| map_db_error(request_id(parts), &e))?;

    Ok(row.map(|row| Shopper {
        user_id: row.user_id,
        email: row.email,
        name: row.name,
    }))
}

impl FromRequestParts<AppState> for Shopper {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await?.ok_or_else(|| {
            ApiError::from_catalog(request_id(parts), &CatalogError::Unauthorized)
        })
    }
}

impl FromRequestParts<AppState> for MaybeShopper {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        resolve(parts, state).await.map(MaybeShopper)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn header_token_wins_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(SESSION_HEADER, HeaderValue::from_static(" tok-header "));
        headers.insert(COOKIE, HeaderValue::from_static("storefront_session=tok-cookie"));
        assert_eq!(session_token(&headers).as_deref(), Some("tok-header"));
    }

    #[test]
    fn cookie_token_is_found_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; storefront_session=abc123; lang=es"),
        );
        assert_eq!(session_token(&headers).as_deref(), Some("abc123"));
    }

    #[test]
    fn missing_or_empty_token_is_none() {
        let mut headers = HeaderMap::new();
        assert_eq!(session_token(&headers), None);
        headers.insert(COOKIE, HeaderValue::from_static("storefront_session="));
        assert_eq!(session_token(&headers), None);
    }
}
