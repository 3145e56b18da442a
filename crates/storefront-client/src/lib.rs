//! Catalog API client and the async driver for storefront browsing.
//!
//! [`CatalogClient`] speaks the `/api/v1` JSON envelope. [`BrowseSession`]
//! wraps a [`storefront_core::BrowseState`] and performs the fetches its
//! actions schedule: debouncing, timing out, and discarding responses that
//! arrive after a newer request was issued.

pub mod client;
pub mod error;
pub mod session;

pub use client::{CatalogClient, CatalogSource};
pub use error::ClientError;
pub use session::BrowseSession;
