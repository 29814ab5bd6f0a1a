//! Bid board for kabadiwalas and listing owners.

use std::collections::HashSet;
use tracing::info;

use crate::api::BidApi;
use crate::error::{ApiError, MutationError};
use crate::events::EventSink;
use crate::optimistic::{MutationOutcome, OptimisticCollection};
use crate::stats::BidStats;
use crate::types::{Bid, BidStatus, ConfirmWeightRequest, RecordId};

pub struct BidBoard<B> {
    api: B,
    bids: OptimisticCollection<Bid>,
}

impl<B: BidApi> BidBoard<B> {
    pub fn new(api: B, sink: EventSink) -> Self {
        Self {
            api,
            bids: OptimisticCollection::new(sink),
        }
    }

    pub async fn refresh(&self) -> Result<usize, ApiError> {
        match self.api.my_bids().await {
            Ok(bids) => {
                let count = bids.len();
                self.bids.replace_all(bids).await;
                Ok(count)
            }
            Err(err) => {
                self.bids.sink().report(&err, "Failed to load bids");
                Err(err)
            }
        }
    }

    /// Accept a pending bid. A listing takes at most one accepted bid, so
    /// bids on a listing that already has one are left alone. The list is
    /// refetched afterwards to pick up the bids the server rejected.
    pub async fn accept(&self, id: &RecordId) -> Result<MutationOutcome<Bid>, MutationError> {
        let taken: HashSet<RecordId> = self
            .bids
            .snapshot()
            .await
            .into_iter()
            .filter(|bid| bid.status == BidStatus::Accepted)
            .map(|bid| bid.listing_id)
            .collect();

        let outcome = self
            .bids
            .mutate(
                id,
                "Failed to accept bid",
                move |bid: &mut Bid| {
                    if bid.status != BidStatus::Pending || taken.contains(&bid.listing_id) {
                        return false;
                    }
                    bid.status = BidStatus::Accepted;
                    true
                },
                async { self.api.accept_bid(id).await.map(Some) },
            )
            .await?;

        if outcome.sent_request() {
            info!("Bid {} accepted", id);
            self.bids.sink().success("Bid accepted");
            // Errors here are already reported; the acceptance itself stands
            let _ = self.refresh().await;
        } else if outcome.record().status == BidStatus::Pending {
            self.bids
                .sink()
                .info("Another bid on this listing was already accepted");
        } else {
            self.bids.sink().info("Bid is no longer pending");
        }
        Ok(outcome)
    }

    /// Confirm the weighed amount at pickup. Implausible weights are
    /// rejected by the server and shown in a modal.
    pub async fn confirm_weight(&self, bid_id: &RecordId, weight_kg: f64) -> Result<Bid, ApiError> {
        if !weight_kg.is_finite() || weight_kg <= 0.0 {
            let err = ApiError::Invalid(format!("weight must be positive, got {}", weight_kg));
            self.bids.sink().report(&err, "Failed to confirm weight");
            return Err(err);
        }

        let request = ConfirmWeightRequest {
            bid_id: bid_id.clone(),
            weight_kg,
        };
        match self.api.confirm_weight(&request).await {
            Ok(bid) => {
                info!("Weight confirmed for bid {}", bid.id);
                self.bids.upsert(bid.clone()).await;
                self.bids.sink().success("Weight confirmed");
                Ok(bid)
            }
            Err(err) => {
                self.bids.sink().report(&err, "Failed to confirm weight");
                Err(err)
            }
        }
    }

    pub async fn bids(&self) -> Vec<Bid> {
        self.bids.snapshot().await
    }

    pub async fn stats(&self) -> BidStats {
        BidStats::from_bids(&self.bids.snapshot().await)
    }
}
