//! Notification endpoints.

use async_trait::async_trait;
use reqwest::Method;

use super::{send_allow_empty, send_json, ApiClient, Auth};
use crate::error::ApiError;
use crate::types::{Notification, NotificationPage, NotificationQuery, RecordId};

#[async_trait]
pub trait NotificationApi: Send + Sync {
    async fn list_notifications(&self, query: NotificationQuery)
        -> Result<NotificationPage, ApiError>;

    /// Mark one notification read. Returns the server's record when it sends one.
    async fn mark_notification_read(&self, id: &RecordId)
        -> Result<Option<Notification>, ApiError>;
}

#[async_trait]
impl NotificationApi for ApiClient {
    async fn list_notifications(
        &self,
        query: NotificationQuery,
    ) -> Result<NotificationPage, ApiError> {
        let builder = self.request(Method::GET, "/notifications", &query.to_query(), Auth::Required)?;
        send_json(builder).await
    }

    async fn mark_notification_read(
        &self,
        id: &RecordId,
    ) -> Result<Option<Notification>, ApiError> {
        let path = format!("/notifications/{}/read", id);
        let builder = self.request(Method::PATCH, &path, &[], Auth::Required)?;

        // Some deployments answer with `{"ok": true}` rather than the record
        Ok(send_allow_empty(builder)
            .await?
            .and_then(|value| serde_json::from_value::<Notification>(value).ok()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_server::{serve, Canned};
    use crate::config::ClientConfig;
    use crate::session::Session;
    use crate::types::PageRequest;

    fn client(base: String) -> ApiClient {
        let config = ClientConfig {
            api_base_url: base,
            ..Default::default()
        };
        ApiClient::new(config, Session::with_token("tok")).unwrap()
    }

    #[tokio::test]
    async fn test_list_sends_unread_only() {
        let body = r#"{"items":[{"id":1,"type":"quest_assigned","title":"New quest","is_read":false}],"total":1,"unread_count":1}"#;
        let (base, rx) = serve(vec![Canned::json(200, body)]);

        let page = client(base)
            .list_notifications(NotificationQuery {
                page: PageRequest::first(50),
                unread_only: true,
            })
            .await
            .unwrap();
        assert_eq!(page.unread_count, 1);
        assert_eq!(page.items[0].category, "quest_assigned");

        let recorded = rx.recv().unwrap();
        assert_eq!(recorded.url, "/notifications?skip=0&limit=50&unread_only=true");
    }

    #[tokio::test]
    async fn test_mark_read_tolerates_ack_body() {
        let (base, rx) = serve(vec![
            Canned::json(200, r#"{"ok":true}"#),
            Canned::json(200, r#"{"id":4,"type":"bid","title":"Bid","is_read":true}"#),
        ]);
        let c = client(base);

        let first = c.mark_notification_read(&RecordId::from(4u64)).await.unwrap();
        assert!(first.is_none());
        let second = c.mark_notification_read(&RecordId::from(4u64)).await.unwrap();
        assert!(second.unwrap().is_read);

        assert_eq!(rx.recv().unwrap().url, "/notifications/4/read");
    }

    #[tokio::test]
    async fn test_mark_read_failure_status() {
        let (base, _rx) = serve(vec![Canned::json(500, r#"{"detail":"db down"}"#)]);
        let err = client(base)
            .mark_notification_read(&RecordId::from(4u64))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            ApiError::Status {
                status: 500,
                message: "db down".to_string()
            }
        );
    }
}
