//! Dashboard aggregate endpoints.
//!
//! Views normally go through `fetch_with_fallback` using the path constants;
//! the typed methods are for callers that want the raw error.

use super::ApiClient;
use crate::error::ApiError;
use crate::types::{DashboardAnalytics, EwasteAnalytics, Heatmap, Leaderboard};

pub const ANALYTICS_PATH: &str = "/dashboard/analytics";
pub const HEATMAP_PATH: &str = "/dashboard/heatmap";
pub const LEADERBOARD_PATH: &str = "/dashboard/leaderboard";
pub const EWASTE_ANALYTICS_PATH: &str = "/dashboard/ewaste-analytics";

impl ApiClient {
    pub async fn dashboard_analytics(&self) -> Result<DashboardAnalytics, ApiError> {
        self.get_json(ANALYTICS_PATH, &[]).await
    }

    pub async fn dashboard_heatmap(&self) -> Result<Heatmap, ApiError> {
        self.get_json(HEATMAP_PATH, &[]).await
    }

    pub async fn dashboard_leaderboard(&self, limit: u64) -> Result<Leaderboard, ApiError> {
        self.get_json(LEADERBOARD_PATH, &[("limit".to_string(), limit.to_string())])
            .await
    }

    pub async fn ewaste_analytics(&self) -> Result<EwasteAnalytics, ApiError> {
        self.get_json(EWASTE_ANALYTICS_PATH, &[]).await
    }
}
