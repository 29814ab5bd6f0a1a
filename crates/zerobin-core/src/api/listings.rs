//! E-waste listing endpoints.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::info;

use super::{send_json, ApiClient, Auth};
use crate::error::ApiError;
use crate::types::{CreateListingRequest, Listing, ListingAnalysis, ListingQuery, Page, RecordId};

#[async_trait]
pub trait ListingApi: Send + Sync {
    async fn list_listings(&self, query: &ListingQuery) -> Result<Page<Listing>, ApiError>;

    async fn get_listing(&self, id: &RecordId) -> Result<Listing, ApiError>;

    /// Device classification and price prediction for an uploaded image
    async fn analyze_listing(&self, image_url: &str) -> Result<ListingAnalysis, ApiError>;

    async fn my_listings(&self) -> Result<Vec<Listing>, ApiError>;

    async fn create_listing(&self, request: &CreateListingRequest) -> Result<Listing, ApiError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeListingRequest<'a> {
    image_url: &'a str,
}

#[async_trait]
impl ListingApi for ApiClient {
    async fn list_listings(&self, query: &ListingQuery) -> Result<Page<Listing>, ApiError> {
        let builder = self.request(Method::GET, "/listings", &query.to_query(), Auth::Optional)?;
        send_json(builder).await
    }

    async fn get_listing(&self, id: &RecordId) -> Result<Listing, ApiError> {
        let path = format!("/listings/{}", id);
        let builder = self.request(Method::GET, &path, &[], Auth::Optional)?;
        send_json(builder).await
    }

    async fn analyze_listing(&self, image_url: &str) -> Result<ListingAnalysis, ApiError> {
        let builder = self
            .request(Method::POST, "/listings/analyze", &[], Auth::Required)?
            .json(&AnalyzeListingRequest { image_url });
        send_json(builder).await
    }

    async fn my_listings(&self) -> Result<Vec<Listing>, ApiError> {
        let builder = self.request(Method::GET, "/listings/my", &[], Auth::Required)?;
        send_json(builder).await
    }

    async fn create_listing(&self, request: &CreateListingRequest) -> Result<Listing, ApiError> {
        info!("Creating listing: {}", request.title);

        let builder = self
            .request(Method::POST, "/listings", &[], Auth::Required)?
            .json(request);
        let listing: Listing = send_json(builder).await?;

        info!("Created listing {}", listing.id);
        Ok(listing)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{serve, Canned};
    use crate::config::ClientConfig;
    use crate::session::Session;
    use crate::types::{ListingStatus, PageRequest};

    const LISTING_JSON: &str = r#"{
        "id": "lst-1", "user_id": 4, "title": "Old laptop",
        "device_type": "laptop", "status": "active",
        "predicted_price": 1800.0, "bid_count": 2
    }"#;

    fn client(base: String, session: Session) -> ApiClient {
        let config = ClientConfig {
            api_base_url: base,
            ..Default::default()
        };
        ApiClient::new(config, session).unwrap()
    }

    #[tokio::test]
    async fn test_list_listings_is_public() {
        let body = format!(r#"{{"items":[{}],"total":1}}"#, LISTING_JSON);
        let (base, rx) = serve(vec![Canned::json(200, body)]);

        let page = client(base, Session::anonymous())
            .list_listings(&ListingQuery {
                page: PageRequest::first(10),
                status: Some(ListingStatus::Active),
                device_type: None,
            })
            .await
            .unwrap();
        assert_eq!(page.items[0].id.as_str(), "lst-1");

        let recorded = rx.recv().unwrap();
        assert!(recorded.header("Authorization").is_none());
        assert_eq!(recorded.url, "/listings?skip=0&limit=10&status=active");
    }

    #[tokio::test]
    async fn test_my_listings_requires_token() {
        let err = client("http://127.0.0.1:9".to_string(), Session::anonymous())
            .my_listings()
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotAuthenticated);
    }

    #[tokio::test]
    async fn test_get_listing_by_id() {
        let (base, rx) = serve(vec![Canned::json(200, LISTING_JSON)]);
        let listing = client(base, Session::with_token("t"))
            .get_listing(&RecordId::from("lst-1"))
            .await
            .unwrap();
        assert_eq!(listing.bid_count, 2);
        assert_eq!(rx.recv().unwrap().url, "/listings/lst-1");
    }
}
