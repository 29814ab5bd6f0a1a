//! Collector endpoints: workload metrics and live location.

use reqwest::Method;
use tracing::debug;

use super::{send_allow_empty, send_json, ApiClient, Auth};
use crate::error::ApiError;
use crate::types::{CollectorWorkload, GeoPoint};

/// Path of the signed-in collector's workload
pub const WORKLOAD_PATH: &str = "/collectors/me/workload";

impl ApiClient {
    pub async fn collector_workload(&self) -> Result<CollectorWorkload, ApiError> {
        let builder = self.request(Method::GET, WORKLOAD_PATH, &[], Auth::Required)?;
        send_json(builder).await
    }

    /// Push the collector's current position. The response body is ignored.
    pub async fn update_collector_location(&self, point: GeoPoint) -> Result<(), ApiError> {
        if !point.is_valid() {
            return Err(ApiError::Invalid(format!(
                "coordinates out of range: {}, {}",
                point.latitude, point.longitude
            )));
        }

        let builder = self
            .request(Method::PATCH, "/collectors/me/location", &[], Auth::Required)?
            .json(&point);
        send_allow_empty(builder).await?;

        debug!("Location updated to {}, {}", point.latitude, point.longitude);
        Ok(())
    }
}
