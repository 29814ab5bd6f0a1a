//! Bidding endpoints for kabadiwalas and listing owners.

use async_trait::async_trait;
use reqwest::Method;
use tracing::info;

use super::{send_json, ApiClient, Auth};
use crate::error::ApiError;
use crate::types::{Bid, ConfirmWeightRequest, RecordId};

#[async_trait]
pub trait BidApi: Send + Sync {
    async fn my_bids(&self) -> Result<Vec<Bid>, ApiError>;

    /// Accept a bid on one of the caller's listings
    async fn accept_bid(&self, id: &RecordId) -> Result<Bid, ApiError>;

    /// Confirm the weighed amount at pickup. Implausible weights come back
    /// as `ApiError::WeightValidation`.
    async fn confirm_weight(&self, request: &ConfirmWeightRequest) -> Result<Bid, ApiError>;
}

#[async_trait]
impl BidApi for ApiClient {
    async fn my_bids(&self) -> Result<Vec<Bid>, ApiError> {
        let builder = self.request(Method::GET, "/bids/my-bids", &[], Auth::Required)?;
        send_json(builder).await
    }

    async fn accept_bid(&self, id: &RecordId) -> Result<Bid, ApiError> {
        info!("Accepting bid {}", id);

        let path = format!("/bids/{}/accept", id);
        let builder = self.request(Method::PATCH, &path, &[], Auth::Required)?;
        send_json(builder).await
    }

    async fn confirm_weight(&self, request: &ConfirmWeightRequest) -> Result<Bid, ApiError> {
        info!("Confirming {} kg for bid {}", request.weight_kg, request.bid_id);

        let builder = self
            .request(Method::POST, "/bids/confirm-weight", &[], Auth::Required)?
            .json(request);
        send_json(builder).await
    }
}
