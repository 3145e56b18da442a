//! Async driver for [`BrowseState`].
//!
//! The state lives behind a single `tokio::sync::Mutex`; every action goes
//! through [`BrowseSession::dispatch`]. Fetches run on spawned tasks and their
//! results are applied only if no newer fetch was issued in the meantime.
//! Superseded requests are not cancelled on the wire, their responses are
//! simply dropped. Debounce timers are the only tasks ever aborted.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use storefront_core::browse::{Action, Completion, FetchFailure, Schedule, View, FETCH_TIMEOUT};
use storefront_core::BrowseState;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;

use crate::client::CatalogSource;

struct Inner<S> {
    source: S,
    state: Mutex<BrowseState>,
    debounce: std::sync::Mutex<Option<JoinHandle<()>>>,
    fetch_timeout: Duration,
    views: watch::Sender<View>,
}

impl<S> Inner<S> {
    fn publish(&self, state: &BrowseState) {
        self.views.send_replace(state.view());
    }
}

/// A shopper's browsing session bound to a [`CatalogSource`].
pub struct BrowseSession<S> {
    inner: Arc<Inner<S>>,
}

impl<S> Clone for BrowseSession<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: CatalogSource> BrowseSession<S> {
    #[must_use]
    pub fn new(source: S, state: BrowseState) -> Self {
        Self::with_fetch_timeout(source, state, FETCH_TIMEOUT)
    }

    #[must_use]
    pub fn with_fetch_timeout(source: S, state: BrowseState, fetch_timeout: Duration) -> Self {
        let (views, _) = watch::channel(state.view());
        Self {
            inner: Arc::new(Inner {
                source,
                state: Mutex::new(state),
                debounce: std::sync::Mutex::new(None),
                fetch_timeout,
                views,
            }),
        }
    }

    /// Starts from a URL query string, read once at load time.
    #[must_use]
    pub fn from_url(source: S, query: &str, page_size: u32) -> Self {
        Self::new(source, BrowseState::from_url(query, page_size))
    }

    /// Receives a freshly rendered view after every applied change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<View> {
        self.inner.views.subscribe()
    }

    pub async fn view(&self) -> View {
        self.inner.state.lock().await.view()
    }

    /// A copy of the current state.
    pub async fn snapshot(&self) -> BrowseState {
        self.inner.state.lock().await.clone()
    }

    /// Fetches the current filters and waits for the result. Used for the
    /// initial load and by headless callers.
    pub async fn load(&self) -> Completion {
        self.cancel_debounce();
        Self::run_fetch(Arc::clone(&self.inner)).await
    }

    /// Applies `action` and starts whatever fetch it schedules, without
    /// waiting for it.
    pub async fn dispatch(&self, action: Action) -> Schedule {
        let schedule = {
            let mut state = self.inner.state.lock().await;
            let schedule = state.dispatch(action);
            if schedule != Schedule::Skip {
                self.inner.publish(&state);
            }
            schedule
        };

        match schedule {
            Schedule::Skip => {}
            Schedule::Immediate => {
                self.cancel_debounce();
                tokio::spawn(Self::run_fetch(Arc::clone(&self.inner)));
            }
            Schedule::Debounced(delay) => {
                let inner = Arc::clone(&self.inner);
                let timer = tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    // Detached so aborting a later timer never cancels this fetch.
                    tokio::spawn(Self::run_fetch(inner));
                });
                let previous = self
                    .inner
                    .debounce
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .replace(timer);
                if let Some(previous) = previous {
                    previous.abort();
                }
            }
        }

        schedule
    }

    fn cancel_debounce(&self) {
        let pending = self
            .inner
            .debounce
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(timer) = pending {
            timer.abort();
        }
    }

    async fn run_fetch(inner: Arc<Inner<S>>) -> Completion {
        let ticket = {
            let mut state = inner.state.lock().await;
            let ticket = state.begin_fetch();
            inner.publish(&state);
            ticket
        };
        tracing::debug!(seq = ticket.seq, "catalog fetch started");

        let result = match tokio::time::timeout(
            inner.fetch_timeout,
            inner.source.fetch_page(ticket.request.clone()),
        )
        .await
        {
            Ok(Ok(page)) => Ok(page),
            Ok(Err(e)) => {
                tracing::warn!(seq = ticket.seq, error = %e, "catalog fetch failed");
                Err(e.to_failure())
            }
            Err(_) => {
                tracing::warn!(seq = ticket.seq, "catalog fetch timed out");
                Err(FetchFailure::TimedOut)
            }
        };
        let succeeded = result.is_ok();

        let completion = {
            let mut state = inner.state.lock().await;
            let completion = state.complete(ticket.seq, result);
            if completion == Completion::Applied {
                inner.publish(&state);
            }
            completion
        };

        if completion == Completion::Stale {
            tracing::debug!(seq = ticket.seq, "discarding stale catalog response");
            return completion;
        }

        if succeeded {
            let facets = match tokio::time::timeout(
                inner.fetch_timeout,
                inner.source.fetch_facets(ticket.request),
            )
            .await
            {
                Ok(Ok(facets)) => Some(facets),
                Ok(Err(e)) => {
                    tracing::warn!(seq = ticket.seq, error = %e, "facet counts unavailable");
                    None
                }
                Err(_) => {
                    tracing::warn!(seq = ticket.seq, "facet counts timed out");
                    None
                }
            };

            // Counts from an older filter must not sit next to the new grid.
            let mut state = inner.state.lock().await;
            if state.current_seq() == ticket.seq {
                match facets {
                    Some(facets) => state.set_facets(facets),
                    None => state.clear_facet_counts(),
                }
                inner.publish(&state);
            }
        }

        completion
    }
}
