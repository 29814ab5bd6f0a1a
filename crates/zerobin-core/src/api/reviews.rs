//! Admin review queue endpoints.

use reqwest::Method;
use tracing::info;

use super::{send_json, ApiClient, Auth};
use crate::error::ApiError;
use crate::types::{AdminReview, PageRequest, ReviewPage, SubmitReviewRequest};

/// Path of the flagged-report review queue
pub const REVIEWS_PATH: &str = "/admin/reviews";

impl ApiClient {
    pub async fn list_reviews(&self, page: PageRequest) -> Result<ReviewPage, ApiError> {
        let builder = self.request(Method::GET, REVIEWS_PATH, &page.to_query(), Auth::Required)?;
        send_json(builder).await
    }

    pub async fn submit_review(&self, request: &SubmitReviewRequest) -> Result<AdminReview, ApiError> {
        info!("Submitting {:?} review for quest {}", request.decision, request.quest_id);

        let builder = self
            .request(Method::POST, REVIEWS_PATH, &[], Auth::Required)?
            .json(request);
        send_json(builder).await
    }
}
