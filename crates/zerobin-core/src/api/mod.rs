//! ============================================================================
//! API Module - HTTP client for the ZeroBin REST API
//! ============================================================================
//! One `ApiClient` per session. Endpoint groups live in submodules:
//! - quests: list/create reports, image analysis, completion
//! - collectors: workload and location
//! - notifications: list and mark-read
//! - reviews: admin review queue
//! - dashboard: aggregate analytics
//! - listings: e-waste listings and analysis
//! - bids: bidding workflow
//!
//! Every response goes through the same normalization: transport failures,
//! non-2xx statuses, HTML bodies from a misconfigured tunnel and structured
//! `detail` rejections all become an `ApiError`.
//! ============================================================================

mod bids;
mod collectors;
mod dashboard;
mod listings;
mod notifications;
mod quests;
mod reviews;

pub use bids::BidApi;
pub use collectors::WORKLOAD_PATH;
pub use dashboard::{ANALYTICS_PATH, EWASTE_ANALYTICS_PATH, HEATMAP_PATH, LEADERBOARD_PATH};
pub use listings::ListingApi;
pub use notifications::NotificationApi;
pub use quests::QuestApi;
pub use reviews::REVIEWS_PATH;

use reqwest::{header::CONTENT_TYPE, Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{snippet, ApiError};
use crate::session::Session;
use crate::types::{FraudDetail, WeightValidationDetail};

/// Header that suppresses the tunnel interstitial page in development
const TUNNEL_HEADER: &str = "ngrok-skip-browser-warning";

/// `detail.error` value the analysis endpoints use for fraud rejections
pub const FRAUD_ERROR: &str = "Image fraud detected";

/// Whether a request must carry the bearer token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Auth {
    Required,
    Optional,
}

/// Client for the ZeroBin API bound to one session
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: reqwest::Client,
    base_url: String,
    session: Session,
    config: ClientConfig,
}

impl ApiClient {
    /// Create a client for `config.api_base_url` acting as `session`
    pub fn new(config: ClientConfig, session: Session) -> Result<Self, ApiError> {
        let base_url = config.api_base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ApiError::Invalid(format!("bad API URL '{}': {}", base_url, e)))?;

        let client = reqwest::Client::builder()
            .user_agent(concat!("zerobin-client/", env!("CARGO_PKG_VERSION")))
            .timeout(config.request_timeout())
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Ok(Self {
            client,
            base_url,
            session,
            config,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for an API path plus query pairs
    pub(crate) fn endpoint(&self, path: &str, query: &[(String, String)]) -> Result<Url, ApiError> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        let mut url =
            Url::parse(&raw).map_err(|e| ApiError::Invalid(format!("bad path '{}': {}", path, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query.iter());
        }
        Ok(url)
    }

    /// Request builder with the tunnel header and, when present, the bearer token
    pub(crate) fn request(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        auth: Auth,
    ) -> Result<RequestBuilder, ApiError> {
        let url = self.endpoint(path, query)?;
        debug!("{} {}", method, url);

        let mut builder = self
            .client
            .request(method, url)
            .header(TUNNEL_HEADER, "true");

        match (&self.session.token, auth) {
            (Some(token), _) if !token.is_empty() => {
                builder = builder.bearer_auth(token);
            }
            (_, Auth::Required) => return Err(ApiError::NotAuthenticated),
            (_, Auth::Optional) => {}
        }

        Ok(builder)
    }

    /// GET a JSON document. Used directly by the fallback loader for
    /// dashboard endpoints whose shape the caller chooses.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(String, String)],
    ) -> Result<T, ApiError> {
        let builder = self.request(Method::GET, path, query, Auth::Optional)?;
        send_json(builder).await
    }
}

/// Send a request and decode a JSON body
pub(crate) async fn send_json<T: DeserializeOwned>(builder: RequestBuilder) -> Result<T, ApiError> {
    let response = builder.send().await?;
    read_json(response).await
}

/// Send a request whose success body may be empty
pub(crate) async fn send_allow_empty(builder: RequestBuilder) -> Result<Option<Value>, ApiError> {
    let response = builder.send().await?;
    let status = response.status().as_u16();
    let content_type = content_type(&response);
    let success = response.status().is_success();
    let body = response.text().await?;

    if !success {
        return Err(classify_failure(status, &body));
    }
    if body.trim().is_empty() {
        return Ok(None);
    }
    decode_body(status, &content_type, &body).map(Some)
}

/// Normalize a response into `T` or an `ApiError`
pub(crate) async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status().as_u16();
    let content_type = content_type(&response);
    let success = response.status().is_success();
    let body = response.text().await?;

    if !success {
        return Err(classify_failure(status, &body));
    }
    decode_body(status, &content_type, &body)
}

fn content_type(response: &Response) -> String {
    response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string()
}

/// Decode a 2xx body, rejecting non-JSON content types
pub(crate) fn decode_body<T: DeserializeOwned>(
    status: u16,
    content_type: &str,
    body: &str,
) -> Result<T, ApiError> {
    if !content_type.to_ascii_lowercase().contains("json") {
        warn!("Non-JSON response ({}): {}", content_type, snippet(body));
        return Err(ApiError::NonJson {
            status,
            content_type: if content_type.is_empty() {
                "no content-type".to_string()
            } else {
                content_type.to_string()
            },
            snippet: snippet(body),
        });
    }

    serde_json::from_str(body).map_err(|e| ApiError::Decode(e.to_string()))
}

/// Map a non-2xx status and its body onto the error taxonomy
pub(crate) fn classify_failure(status: u16, body: &str) -> ApiError {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let detail = parsed.as_ref().and_then(|v| v.get("detail"));

    if status == 400 {
        if let Some(detail) = detail.filter(|d| d.is_object()) {
            if detail.get("error").and_then(Value::as_str) == Some(FRAUD_ERROR) {
                if let Ok(fraud) = serde_json::from_value::<FraudDetail>(detail.clone()) {
                    return ApiError::Fraud(fraud);
                }
            }
            if detail.get("entered_weight").is_some() {
                if let Ok(weight) = serde_json::from_value::<WeightValidationDetail>(detail.clone()) {
                    return ApiError::WeightValidation(weight);
                }
            }
        }
    }

    let message = detail
        .and_then(detail_message)
        .or_else(|| {
            parsed
                .as_ref()
                .and_then(|v| v.get("message"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .or_else(|| {
            // Plain-text bodies are shown as-is; JSON we could not read is not
            if parsed.is_none() && !body.trim().is_empty() {
                Some(snippet(body))
            } else {
                None
            }
        })
        .unwrap_or_else(|| format!("HTTP {}", status));

    ApiError::Status { status, message }
}

/// FastAPI puts either a string, an object with `message`, or a list of
/// validation errors with `msg` into `detail`.
fn detail_message(detail: &Value) -> Option<String> {
    match detail {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Value::Array(items) => {
            let msgs: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            if msgs.is_empty() {
                None
            } else {
                Some(msgs.join("; "))
            }
        }
        _ => None,
    }
}


#[cfg(test)]
mod tests {
    use super::test_server::{serve, Canned};
    use super::*;
    use crate::session::Session;

    fn client_for(base: &str, session: Session) -> ApiClient {
        let config = ClientConfig {
            api_base_url: base.to_string(),
            ..Default::default()
        };
        ApiClient::new(config, session).unwrap()
    }

    #[test]
    fn test_classify_fraud_detail() {
        let body = r#"{"detail":{"error":"Image fraud detected","confidence_score":0.91,"web_matches":["https://x.example/a.jpg"]}}"#;
        match classify_failure(400, body) {
            ApiError::Fraud(detail) => {
                assert_eq!(detail.confidence_score, Some(0.91));
                assert_eq!(detail.web_matches.len(), 1);
            }
            other => panic!("expected fraud, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_weight_detail() {
        let body = r#"{"detail":{"error":"weight_validation_failed","message":"Weight is unusually low","entered_weight":0.05,"typical_weight":2.0,"max_expected_weight":5.0,"suggestion":"Check the scale"}}"#;
        match classify_failure(400, body) {
            ApiError::WeightValidation(detail) => {
                assert_eq!(detail.entered_weight, 0.05);
                assert_eq!(detail.typical_weight, Some(2.0));
            }
            other => panic!("expected weight validation, got {:?}", other),
        }
    }

    #[test]
    fn test_classify_messages() {
        assert_eq!(
            classify_failure(404, r#"{"detail":"Quest not found"}"#).to_string(),
            "Quest not found"
        );
        assert_eq!(
            classify_failure(422, r#"{"detail":[{"msg":"field required"},{"msg":"bad lat"}]}"#)
                .to_string(),
            "field required; bad lat"
        );
        assert_eq!(
            classify_failure(500, "Internal Server Error").to_string(),
            "Internal Server Error"
        );
        assert_eq!(classify_failure(502, "").to_string(), "HTTP 502");
        assert_eq!(classify_failure(500, r#"{"oops":1}"#).to_string(), "HTTP 500");
    }

    #[test]
    fn test_decode_body_rejects_html() {
        let err = decode_body::<Value>(200, "text/html", "<!DOCTYPE html><html>tunnel</html>")
            .unwrap_err();
        match err {
            ApiError::NonJson { snippet, .. } => assert!(snippet.starts_with("<!DOCTYPE")),
            other => panic!("expected NonJson, got {:?}", other),
        }
    }

    #[test]
    fn test_required_auth_without_token() {
        let client = client_for("http://localhost:8000", Session::anonymous());
        let err = client
            .request(Method::GET, "/notifications", &[], Auth::Required)
            .unwrap_err();
        assert_eq!(err, ApiError::NotAuthenticated);
    }

    #[test]
    fn test_endpoint_joins_query() {
        let client = client_for("http://localhost:8000/", Session::anonymous());
        let url = client
            .endpoint("quests", &[("skip".into(), "0".into()), ("limit".into(), "10".into())])
            .unwrap();
        assert_eq!(url.as_str(), "http://localhost:8000/quests?skip=0&limit=10");
    }

    #[tokio::test]
    async fn test_get_json_sends_headers() {
        let (base, rx) = serve(vec![Canned::json(200, r#"{"total_reports": 12}"#)]);
        let client = client_for(&base, Session::with_token("secret"));

        let value: Value = client.get_json("/dashboard/analytics", &[]).await.unwrap();
        assert_eq!(value["total_reports"], 12);

        let recorded = rx.recv().unwrap();
        assert_eq!(recorded.method, "GET");
        assert_eq!(recorded.url, "/dashboard/analytics");
        assert_eq!(recorded.header("Authorization"), Some("Bearer secret"));
        assert_eq!(recorded.header(TUNNEL_HEADER), Some("true"));
    }

    #[tokio::test]
    async fn test_get_json_html_page_is_non_json_error() {
        let (base, _rx) = serve(vec![Canned::html(200, "<html>Visit site</html>")]);
        let client = client_for(&base, Session::anonymous());

        let err = client.get_json::<Value>("/quests", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::NonJson { status: 200, .. }));
    }

    #[tokio::test]
    async fn test_transport_error_when_server_down() {
        // Nothing listens on port 9 locally
        let client = client_for("http://127.0.0.1:9", Session::anonymous());
        let err = client.get_json::<Value>("/quests", &[]).await.unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)));
    }
}
