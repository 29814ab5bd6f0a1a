//! ============================================================================
//! Admin Dashboard - Aggregate metrics and the review queue
//! ============================================================================
//! The four metric cards load concurrently and independently; any one of
//! them failing degrades to its sample dataset with a banner while the others
//! still show live numbers. Resolution order between cards is not fixed.
//! ============================================================================

use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::api::{
    ApiClient, ANALYTICS_PATH, EWASTE_ANALYTICS_PATH, HEATMAP_PATH, LEADERBOARD_PATH,
    REVIEWS_PATH,
};
use crate::error::ApiError;
use crate::events::EventSink;
use crate::fallback;
use crate::fetch::{fetch_with_fallback, ListState, ListView, Loaded};
use crate::types::{
    AdminReview, DashboardAnalytics, EwasteAnalytics, Heatmap, Leaderboard, Page, PageRequest,
    ReviewPage, SubmitReviewRequest,
};

/// Entries requested for the leaderboard card
pub const LEADERBOARD_LIMIT: u64 = 10;

/// Everything the metric cards render, each tagged with its source
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSnapshot {
    pub analytics: Loaded<DashboardAnalytics>,
    pub heatmap: Loaded<Heatmap>,
    pub leaderboard: Loaded<Leaderboard>,
    pub ewaste: Loaded<EwasteAnalytics>,
}

impl DashboardSnapshot {
    pub fn all_live(&self) -> bool {
        self.analytics.source.is_live()
            && self.heatmap.source.is_live()
            && self.leaderboard.source.is_live()
            && self.ewaste.source.is_live()
    }
}

pub struct AdminDashboard {
    client: ApiClient,
    sink: EventSink,
    reviews: ListView<AdminReview>,
    pending_reviews: Arc<RwLock<u64>>,
}

impl AdminDashboard {
    pub fn new(client: ApiClient, sink: EventSink) -> Self {
        Self {
            client,
            sink,
            reviews: ListView::new(),
            pending_reviews: Arc::new(RwLock::new(0)),
        }
    }

    /// Load all metric cards concurrently
    pub async fn load(&self) -> DashboardSnapshot {
        let limit = [("limit".to_string(), LEADERBOARD_LIMIT.to_string())];

        let (analytics, heatmap, leaderboard, ewaste) = tokio::join!(
            fetch_with_fallback(
                &self.client,
                "analytics",
                ANALYTICS_PATH,
                &[],
                fallback::dashboard_analytics,
                &self.sink,
            ),
            fetch_with_fallback(
                &self.client,
                "heatmap",
                HEATMAP_PATH,
                &[],
                fallback::heatmap,
                &self.sink,
            ),
            fetch_with_fallback(
                &self.client,
                "leaderboard",
                LEADERBOARD_PATH,
                &limit,
                fallback::leaderboard,
                &self.sink,
            ),
            fetch_with_fallback(
                &self.client,
                "e-waste analytics",
                EWASTE_ANALYTICS_PATH,
                &[],
                fallback::ewaste_analytics,
                &self.sink,
            ),
        );

        let snapshot = DashboardSnapshot {
            analytics,
            heatmap,
            leaderboard,
            ewaste,
        };
        info!("Dashboard loaded (all live: {})", snapshot.all_live());
        snapshot
    }

    /// Reload the review queue. Returns `false` if the dashboard was closed
    /// before the result arrived.
    pub async fn refresh_reviews(&self, page: PageRequest) -> bool {
        let pending_reviews = Arc::clone(&self.pending_reviews);
        let load = async move {
            let loaded: Loaded<ReviewPage> = fetch_with_fallback(
                &self.client,
                "review queue",
                REVIEWS_PATH,
                &page.to_query(),
                fallback::review_page,
                &self.sink,
            )
            .await;

            *pending_reviews.write().await = loaded.data.pending_count;
            Loaded {
                data: Page {
                    items: loaded.data.items,
                    total: loaded.data.total,
                    skip: page.skip,
                    limit: page.limit,
                },
                source: loaded.source,
            }
        };
        self.reviews.refresh(load).await
    }

    pub async fn reviews(&self) -> ListState<AdminReview> {
        self.reviews.state().await
    }

    pub async fn pending_reviews(&self) -> u64 {
        *self.pending_reviews.read().await
    }

    pub async fn submit_review(&self, request: &SubmitReviewRequest) -> Result<AdminReview, ApiError> {
        match self.client.submit_review(request).await {
            Ok(review) => {
                self.sink.success("Review submitted");
                Ok(review)
            }
            Err(err) => {
                self.sink.report(&err, "Failed to submit review");
                Err(err)
            }
        }
    }

    /// Tear down: loads still in flight are discarded
    pub fn close(&self) {
        self.reviews.close();
    }
}
