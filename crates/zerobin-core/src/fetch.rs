//! ============================================================================
//! List Fetch with Fallback
//! ============================================================================
//! Dashboard views load on mount and on manual refresh. A failed load does not
//! leave the view blank: it is replaced by a clearly labelled sample dataset
//! and a banner. Every result is tagged with its `DataSource` so a view can
//! render sample or missing data as stale rather than as live numbers.
//!
//! `ListView` adds the lifetime handling: refreshes replace the list
//! wholesale (last resolved wins, never appended) and results arriving after
//! `close()` are dropped.
//! ============================================================================

use serde::de::DeserializeOwned;
use std::future::Future;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::ApiError;
use crate::events::EventSink;
use crate::types::{Page, PageRequest};

/// Where the data a view shows came from
#[derive(Debug, Clone, PartialEq)]
pub enum DataSource {
    Live,
    /// Load failed; sample data substituted
    Fallback { reason: String },
    /// Load failed and sample data is disabled
    Unavailable { reason: String },
}

impl DataSource {
    pub fn is_live(&self) -> bool {
        matches!(self, DataSource::Live)
    }

    pub fn failure(&self) -> Option<&str> {
        match self {
            DataSource::Live => None,
            DataSource::Fallback { reason } | DataSource::Unavailable { reason } => Some(reason),
        }
    }
}

/// Data plus its provenance
#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub data: T,
    pub source: DataSource,
}

impl<T> Loaded<T> {
    pub fn live(data: T) -> Self {
        Self {
            data,
            source: DataSource::Live,
        }
    }
}

/// Resolve `load`; on failure substitute `fallback()` (or `T::default()` when
/// sample data is disabled) and raise a banner. Single attempt, no retry.
pub async fn load_with_fallback<T, Fut, F>(
    label: &str,
    load: Fut,
    fallback: F,
    use_fallback: bool,
    sink: &EventSink,
) -> Loaded<T>
where
    T: Default,
    Fut: Future<Output = Result<T, ApiError>>,
    F: FnOnce() -> T,
{
    match load.await {
        Ok(data) => {
            debug!("Loaded {}", label);
            Loaded::live(data)
        }
        Err(err) => {
            let reason = err.user_message();
            warn!("Failed to load {}: {}", label, reason);

            if use_fallback {
                sink.banner(format!(
                    "Failed to load {}: {}. Showing sample data.",
                    label, reason
                ));
                Loaded {
                    data: fallback(),
                    source: DataSource::Fallback { reason },
                }
            } else {
                sink.banner(format!("Failed to load {}: {}", label, reason));
                Loaded {
                    data: T::default(),
                    source: DataSource::Unavailable { reason },
                }
            }
        }
    }
}

/// GET `endpoint` as `T`, substituting `fallback` on failure
pub async fn fetch_with_fallback<T, F>(
    client: &ApiClient,
    label: &str,
    endpoint: &str,
    query: &[(String, String)],
    fallback: F,
    sink: &EventSink,
) -> Loaded<T>
where
    T: DeserializeOwned + Default,
    F: FnOnce() -> T,
{
    load_with_fallback(
        label,
        client.get_json::<T>(endpoint, query),
        fallback,
        client.config().fallback_data,
        sink,
    )
    .await
}

/// Paged variant: `skip`/`limit` plus any extra filters
pub async fn fetch_list_with_fallback<I, F>(
    client: &ApiClient,
    label: &str,
    endpoint: &str,
    page: PageRequest,
    extra: &[(String, String)],
    fallback: F,
    sink: &EventSink,
) -> Loaded<Page<I>>
where
    I: DeserializeOwned,
    F: FnOnce() -> Page<I>,
{
    let mut query = page.to_query();
    query.extend_from_slice(extra);
    fetch_with_fallback(client, label, endpoint, &query, fallback, sink).await
}

// ============================================================================
// ListView
// ============================================================================

/// Rendered state of a list view
#[derive(Debug, Clone, PartialEq)]
pub struct ListState<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub source: DataSource,
    pub loading: bool,
    /// Number of loads that have resolved into this state
    pub resolved: u64,
}

impl<T> Default for ListState<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            source: DataSource::Live,
            loading: false,
            resolved: 0,
        }
    }
}

/// A paged list bound to a view's lifetime
pub struct ListView<T> {
    state: Arc<RwLock<ListState<T>>>,
    in_flight: Arc<RwLock<u32>>,
    cancel: CancellationToken,
}

impl<T> Clone for ListView<T> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            in_flight: Arc::clone(&self.in_flight),
            cancel: self.cancel.clone(),
        }
    }
}

impl<T: Clone + Send + Sync> Default for ListView<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Send + Sync> ListView<T> {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(ListState::default())),
            in_flight: Arc::new(RwLock::new(0)),
            cancel: CancellationToken::new(),
        }
    }

    /// Run `load` and replace the list with its result.
    /// Returns `false` when the view was closed before the load resolved.
    pub async fn refresh<Fut>(&self, load: Fut) -> bool
    where
        Fut: Future<Output = Loaded<Page<T>>>,
    {
        if self.cancel.is_cancelled() {
            return false;
        }

        *self.in_flight.write().await += 1;
        self.state.write().await.loading = true;

        let loaded = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            loaded = load => Some(loaded),
        };

        let remaining = {
            let mut in_flight = self.in_flight.write().await;
            *in_flight = in_flight.saturating_sub(1);
            *in_flight
        };

        let loaded = match loaded {
            Some(loaded) if !self.cancel.is_cancelled() => loaded,
            _ => {
                debug!("Discarding list result: view closed");
                return false;
            }
        };

        let mut state = self.state.write().await;
        state.total = loaded.data.total.max(loaded.data.items.len() as u64);
        state.items = loaded.data.items;
        state.source = loaded.source;
        state.loading = remaining > 0;
        state.resolved += 1;
        true
    }

    pub async fn state(&self) -> ListState<T> {
        self.state.read().await.clone()
    }

    pub async fn items(&self) -> Vec<T> {
        self.state.read().await.items.clone()
    }

    /// Tear down: in-flight loads are dropped, which aborts their requests,
    /// and no later result is applied
    pub fn close(&self) {
        info!("List view closed");
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{serve, Canned};
    use crate::config::ClientConfig;
    use crate::events::UiEvent;
    use crate::fallback;
    use crate::session::Session;
    use crate::types::DashboardAnalytics;
    use tokio::sync::oneshot;

    fn client(base: String, fallback_data: bool) -> ApiClient {
        let config = ClientConfig {
            api_base_url: base,
            fallback_data,
            ..Default::default()
        };
        ApiClient::new(config, Session::with_token("t")).unwrap()
    }

    fn page(ids: &[u32]) -> Page<u32> {
        Page {
            items: ids.to_vec(),
            total: ids.len() as u64,
            skip: 0,
            limit: 20,
        }
    }

    #[tokio::test]
    async fn test_non_2xx_substitutes_fallback_and_banner() {
        let (base, _rx) = serve(vec![Canned::json(503, r#"{"detail":"maintenance"}"#)]);
        let (sink, mut rx) = EventSink::channel();

        let loaded: Loaded<DashboardAnalytics> = fetch_with_fallback(
            &client(base, true),
            "analytics",
            crate::api::ANALYTICS_PATH,
            &[],
            fallback::dashboard_analytics,
            &sink,
        )
        .await;

        assert_eq!(loaded.data, fallback::dashboard_analytics());
        assert_eq!(
            loaded.source,
            DataSource::Fallback {
                reason: "maintenance".to_string()
            }
        );
        match rx.try_recv().unwrap() {
            UiEvent::Banner { message } => {
                assert!(message.contains("analytics"));
                assert!(message.contains("sample data"));
            }
            other => panic!("expected banner, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fallback_disabled_is_unavailable() {
        let (base, _rx) = serve(vec![Canned::html(502, "<html>Bad gateway</html>")]);
        let (sink, _events) = EventSink::channel();

        let loaded: Loaded<DashboardAnalytics> = fetch_with_fallback(
            &client(base, false),
            "analytics",
            crate::api::ANALYTICS_PATH,
            &[],
            fallback::dashboard_analytics,
            &sink,
        )
        .await;

        assert_eq!(loaded.data, DashboardAnalytics::default());
        assert!(matches!(loaded.source, DataSource::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_live_list_sends_pagination_and_filters() {
        let (base, rx) = serve(vec![Canned::json(200, r#"{"items":[1,2],"total":7}"#)]);
        let (sink, _events) = EventSink::channel();

        let loaded: Loaded<Page<u32>> = fetch_list_with_fallback(
            &client(base, true),
            "numbers",
            "/numbers",
            PageRequest::new(20, 2),
            &[("sort".to_string(), "desc".to_string())],
            || page(&[99]),
            &sink,
        )
        .await;

        assert!(loaded.source.is_live());
        assert_eq!(loaded.data.items, vec![1, 2]);
        assert_eq!(rx.recv().unwrap().url, "/numbers?skip=20&limit=2&sort=desc");
    }

    #[tokio::test]
    async fn test_overlapping_refresh_does_not_duplicate() {
        let view: ListView<u32> = ListView::new();
        let (slow_tx, slow_rx) = oneshot::channel::<()>();

        let slow = {
            let view = view.clone();
            tokio::spawn(async move {
                view.refresh(async move {
                    let _ = slow_rx.await;
                    Loaded::live(page(&[7, 8, 9]))
                })
                .await
            })
        };
        while !view.state().await.loading {
            tokio::task::yield_now().await;
        }

        // Second refresh resolves first
        assert!(view.refresh(async { Loaded::live(page(&[1, 2, 3])) }).await);
        assert!(view.state().await.loading);
        assert_eq!(view.items().await, vec![1, 2, 3]);

        slow_tx.send(()).unwrap();
        assert!(slow.await.unwrap());

        // The slow load resolved last, so its items replace the fast ones
        let state = view.state().await;
        assert_eq!(state.items, vec![7, 8, 9]);
        assert_eq!(state.resolved, 2);
        assert!(!state.loading);
    }

    #[tokio::test]
    async fn test_last_resolved_wins() {
        let view: ListView<u32> = ListView::new();
        view.refresh(async { Loaded::live(page(&[1])) }).await;
        view.refresh(async { Loaded::live(page(&[2, 3])) }).await;
        assert_eq!(view.items().await, vec![2, 3]);
    }

    #[tokio::test]
    async fn test_results_after_close_are_discarded() {
        let view: ListView<u32> = ListView::new();
        view.refresh(async { Loaded::live(page(&[1])) }).await;

        let (tx, rx) = oneshot::channel::<()>();
        let pending = {
            let view = view.clone();
            tokio::spawn(async move {
                view.refresh(async move {
                    let _ = rx.await;
                    Loaded::live(page(&[5, 6]))
                })
                .await
            })
        };
        tokio::task::yield_now().await;

        view.close();
        let _ = tx.send(());
        assert!(!pending.await.unwrap());
        assert_eq!(view.items().await, vec![1]);
        assert!(!view.refresh(async { Loaded::live(page(&[7])) }).await);
    }
}
