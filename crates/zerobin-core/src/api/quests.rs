//! Quest endpoints: waste reports, image analysis and collector completion.

use async_trait::async_trait;
use reqwest::Method;
use serde::Serialize;
use tracing::info;

use super::{send_json, ApiClient, Auth};
use crate::error::ApiError;
use crate::types::{
    CompleteQuestRequest, CreateQuestRequest, ImageAnalysis, Page, PageRequest, Quest, RecordId,
};

/// Quest operations, abstracted so view models can run against a fake
#[async_trait]
pub trait QuestApi: Send + Sync {
    async fn list_quests(&self, page: PageRequest) -> Result<Page<Quest>, ApiError>;

    async fn create_quest(&self, request: &CreateQuestRequest) -> Result<Quest, ApiError>;

    /// Classify an uploaded image. Fraudulent images come back as `ApiError::Fraud`.
    async fn analyze_image(&self, image_url: &str) -> Result<ImageAnalysis, ApiError>;

    async fn complete_quest(
        &self,
        id: &RecordId,
        request: &CompleteQuestRequest,
    ) -> Result<Quest, ApiError>;
}

#[derive(Debug, Serialize)]
struct AnalyzeImageRequest<'a> {
    image_url: &'a str,
}

#[async_trait]
impl QuestApi for ApiClient {
    async fn list_quests(&self, page: PageRequest) -> Result<Page<Quest>, ApiError> {
        let builder = self.request(Method::GET, "/quests", &page.to_query(), Auth::Optional)?;
        send_json(builder).await
    }

    async fn create_quest(&self, request: &CreateQuestRequest) -> Result<Quest, ApiError> {
        info!("Creating quest: {}", request.title);

        let builder = self
            .request(Method::POST, "/quests", &[], Auth::Required)?
            .json(request);
        let quest: Quest = send_json(builder).await?;

        info!("Created quest {}", quest.id);
        Ok(quest)
    }

    async fn analyze_image(&self, image_url: &str) -> Result<ImageAnalysis, ApiError> {
        let builder = self
            .request(Method::POST, "/quests/analyze-image", &[], Auth::Required)?
            .json(&AnalyzeImageRequest { image_url });
        send_json(builder).await
    }

    async fn complete_quest(
        &self,
        id: &RecordId,
        request: &CompleteQuestRequest,
    ) -> Result<Quest, ApiError> {
        info!("Completing quest {}", id);

        let path = format!("/quests/{}/complete", id);
        let builder = self
            .request(Method::POST, &path, &[], Auth::Required)?
            .json(request);
        send_json(builder).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{serve, Canned};
    use crate::config::ClientConfig;
    use crate::session::Session;
    use crate::types::{QuestStatus, Severity, WasteType};

    const QUEST_JSON: &str = r#"{
        "id": 11, "reporter_id": 2, "collector_id": 5,
        "title": "Plastic near Lake", "description": "Bottles",
        "latitude": 12.97, "longitude": 77.59,
        "waste_type": "plastic", "severity": "medium",
        "status": "completed", "bounty_points": 40, "image_urls": []
    }"#;

    fn client(base: String) -> ApiClient {
        let config = ClientConfig {
            api_base_url: base,
            ..Default::default()
        };
        ApiClient::new(config, Session::with_token("tok")).unwrap()
    }

    #[tokio::test]
    async fn test_list_quests_sends_pagination() {
        let body = format!(r#"{{"items":[{}],"total":1,"skip":0,"limit":20}}"#, QUEST_JSON);
        let (base, rx) = serve(vec![Canned::json(200, body)]);

        let page = client(base).list_quests(PageRequest::first(20)).await.unwrap();
        assert_eq!(page.total, 1);
        assert_eq!(page.items[0].waste_type, WasteType::Plastic);

        let recorded = rx.recv().unwrap();
        assert_eq!(recorded.url, "/quests?skip=0&limit=20");
    }

    #[tokio::test]
    async fn test_complete_quest_posts_to_id() {
        let (base, rx) = serve(vec![Canned::json(200, QUEST_JSON)]);

        let quest = client(base)
            .complete_quest(&RecordId::from(11u64), &CompleteQuestRequest::default())
            .await
            .unwrap();
        assert_eq!(quest.status, QuestStatus::Completed);

        let recorded = rx.recv().unwrap();
        assert_eq!(recorded.method, "POST");
        assert_eq!(recorded.url, "/quests/11/complete");
    }

    #[tokio::test]
    async fn test_analyze_image_fraud_rejection() {
        let body = r#"{"detail":{"error":"Image fraud detected","message":"Image found online","confidence_score":0.97,"web_matches":[]}}"#;
        let (base, rx) = serve(vec![Canned::json(400, body)]);

        let err = client(base)
            .analyze_image("https://img.example/pic.jpg")
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Fraud(_)));

        let recorded = rx.recv().unwrap();
        assert!(recorded.body.contains("https://img.example/pic.jpg"));
    }

    #[tokio::test]
    async fn test_analyze_image_success() {
        let body = r#"{"waste_type":"plastic","severity":"medium","description":"PET bottles","confidence_score":0.88}"#;
        let (base, _rx) = serve(vec![Canned::json(200, body)]);

        let analysis = client(base).analyze_image("https://img/x.jpg").await.unwrap();
        assert_eq!(analysis.severity, Severity::Medium);
        assert_eq!(analysis.description, "PET bottles");
    }
}
