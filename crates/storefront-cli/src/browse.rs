//! Headless catalog browsing over the HTTP API.

use std::time::Duration;

use storefront_client::{BrowseSession, CatalogClient};
use storefront_core::FilterRequest;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// Loads the page described by `query`, exactly as a shopper opening that
/// URL would, and prints the rendered view.
///
/// # Errors
///
/// Returns an error if the client cannot be built or the fetch fails. The
/// view, including its retry hint, is printed before a fetch error is
/// returned.
pub(crate) async fn run_browse(api_url: &str, query: &str, page_size: u32) -> anyhow::Result<()> {
    let client = CatalogClient::new(api_url, REQUEST_TIMEOUT)?;
    let session = BrowseSession::from_url(client, query.trim_start_matches('?'), page_size);

    session.load().await;
    print!("{}", session.view().await);

    if let Some(failure) = session.snapshot().await.error() {
        anyhow::bail!("catalog fetch failed: {failure}");
    }
    Ok(())
}

pub(crate) async fn run_facets(api_url: &str, query: &str) -> anyhow::Result<()> {
    let client = CatalogClient::new(api_url, REQUEST_TIMEOUT)?;
    let request = FilterRequest::from_query(query.trim_start_matches('?'));
    let facets = client.category_facets(&request).await?;

    if facets.is_empty() {
        println!("(no categories)");
    }
    for facet in facets {
        match facet.count {
            Some(count) => println!("{:<32} {count:>6}", facet.name),
            None => println!("{:<32} {:>6}", facet.name, "-"),
        }
    }
    Ok(())
}
