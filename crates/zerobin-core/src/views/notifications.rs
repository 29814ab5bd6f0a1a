//! Notification feed with optimistic mark-read.
//!
//! The unread badge is derived rather than decremented: the server's
//! `unread_count` from the last refresh, minus the records that were unread
//! at that refresh and are read locally now. A rolled-back mark-read restores
//! the record, and the badge follows without any bookkeeping.

use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::info;

use crate::api::NotificationApi;
use crate::error::{ApiError, MutationError};
use crate::events::EventSink;
use crate::optimistic::{MutationOutcome, OptimisticCollection};
use crate::stats::group_by_category;
use crate::types::{Notification, NotificationQuery, PageRequest, RecordId};

#[derive(Debug, Default)]
struct Baseline {
    server_unread: u64,
    total: u64,
    unread_at_fetch: HashSet<RecordId>,
}

pub struct NotificationFeed<N> {
    api: N,
    items: OptimisticCollection<Notification>,
    baseline: Arc<RwLock<Baseline>>,
}

impl<N: NotificationApi> NotificationFeed<N> {
    pub fn new(api: N, sink: EventSink) -> Self {
        Self {
            api,
            items: OptimisticCollection::new(sink),
            baseline: Arc::new(RwLock::new(Baseline::default())),
        }
    }

    /// Reload the feed, replacing everything held locally
    pub async fn refresh(&self, page: PageRequest, unread_only: bool) -> Result<usize, ApiError> {
        let query = NotificationQuery { page, unread_only };
        let loaded = match self.api.list_notifications(query).await {
            Ok(loaded) => loaded,
            Err(err) => {
                self.items.sink().report(&err, "Failed to load notifications");
                return Err(err);
            }
        };

        let count = loaded.items.len();
        {
            let mut baseline = self.baseline.write().await;
            baseline.server_unread = loaded.unread_count;
            baseline.total = loaded.total.max(count as u64);
            baseline.unread_at_fetch = loaded
                .items
                .iter()
                .filter(|n| !n.is_read)
                .map(|n| n.id.clone())
                .collect();
        }
        self.items.replace_all(loaded.items).await;

        info!("Loaded {} notifications", count);
        Ok(count)
    }

    /// Mark one notification read, rolling back if the server refuses
    pub async fn mark_read(
        &self,
        id: &RecordId,
    ) -> Result<MutationOutcome<Notification>, MutationError> {
        self.items
            .mutate(
                id,
                "Failed to mark notification as read",
                |n: &mut Notification| {
                    if n.is_read {
                        return false;
                    }
                    n.is_read = true;
                    true
                },
                async { self.api.mark_notification_read(id).await },
            )
            .await
    }

    pub async fn unread_count(&self) -> u64 {
        let baseline = self.baseline.read().await;
        let flipped = self
            .items
            .snapshot()
            .await
            .iter()
            .filter(|n| n.is_read && baseline.unread_at_fetch.contains(&n.id))
            .count() as u64;
        baseline.server_unread.saturating_sub(flipped)
    }

    pub async fn total(&self) -> u64 {
        self.baseline.read().await.total
    }

    pub async fn items(&self) -> Vec<Notification> {
        self.items.snapshot().await
    }

    pub async fn by_category(&self) -> BTreeMap<String, Vec<Notification>> {
        group_by_category(&self.items.snapshot().await)
    }
}
