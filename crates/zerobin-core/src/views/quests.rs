//! ============================================================================
//! Collector Task Board - Assigned quests, completion and workload
//! ============================================================================
//! Quest status only ever moves forward on this board. Completing a quest
//! applies `completed` locally, lets the server's record overwrite it, and
//! then refetches the list so verification or reassignment done server-side
//! shows up. A regression can only come from a server payload.
//! ============================================================================

use chrono::Utc;
use tracing::info;

use crate::api::{ApiClient, QuestApi, WORKLOAD_PATH};
use crate::error::{ApiError, MutationError};
use crate::events::EventSink;
use crate::fallback;
use crate::fetch::{fetch_with_fallback, Loaded};
use crate::optimistic::{MutationOutcome, OptimisticCollection};
use crate::stats::QuestStats;
use crate::types::{
    CollectorWorkload, CompleteQuestRequest, GeoPoint, PageRequest, Quest, QuestStatus, RecordId,
};

pub struct CollectorTaskBoard {
    client: ApiClient,
    quests: OptimisticCollection<Quest>,
}

impl CollectorTaskBoard {
    pub fn new(client: ApiClient, sink: EventSink) -> Self {
        Self {
            client,
            quests: OptimisticCollection::new(sink),
        }
    }

    fn sink(&self) -> &EventSink {
        self.quests.sink()
    }

    pub async fn refresh(&self) -> Result<usize, ApiError> {
        let page = PageRequest::first(self.client.config().page_size);
        match self.client.list_quests(page).await {
            Ok(loaded) => {
                let count = loaded.items.len();
                self.quests.replace_all(loaded.items).await;
                Ok(count)
            }
            Err(err) => {
                self.sink().report(&err, "Failed to load quests");
                Err(err)
            }
        }
    }

    /// Mark a quest completed. Quests already completed or verified are left
    /// alone without a request.
    pub async fn complete(
        &self,
        id: &RecordId,
        proof: CompleteQuestRequest,
    ) -> Result<MutationOutcome<Quest>, MutationError> {
        let outcome = self
            .quests
            .mutate(
                id,
                "Failed to complete quest",
                |quest: &mut Quest| {
                    if !quest.status.can_advance_to(QuestStatus::Completed) {
                        return false;
                    }
                    quest.status = QuestStatus::Completed;
                    quest.completed_at = Some(Utc::now().to_rfc3339());
                    true
                },
                async {
                    self.client
                        .complete_quest(id, &proof)
                        .await
                        .map(Some)
                },
            )
            .await?;

        if outcome.sent_request() {
            info!("Quest {} completed", id);
            self.sink().success("Quest marked as completed");
            // Errors here are already reported; the completion itself stands
            let _ = self.refresh().await;
        } else {
            self.sink()
                .info(format!("Quest is already {}", outcome.record().status));
        }
        Ok(outcome)
    }

    /// Capacity metrics, with sample numbers when the endpoint is down
    pub async fn workload(&self) -> Loaded<CollectorWorkload> {
        fetch_with_fallback(
            &self.client,
            "workload",
            WORKLOAD_PATH,
            &[],
            fallback::collector_workload,
            self.sink(),
        )
        .await
    }

    pub async fn update_location(&self, point: GeoPoint) -> Result<(), ApiError> {
        match self.client.update_collector_location(point).await {
            Ok(()) => {
                self.sink().info("Location updated");
                Ok(())
            }
            Err(err) => {
                self.sink().report(&err, "Failed to update location");
                Err(err)
            }
        }
    }

    pub async fn quests(&self) -> Vec<Quest> {
        self.quests.snapshot().await
    }

    pub async fn stats(&self) -> QuestStats {
        QuestStats::from_quests(&self.quests.snapshot().await)
    }
}
