//! ============================================================================
//! Core Types for the ZeroBin Client
//! ============================================================================
//! Wire records exchanged with the ZeroBin REST API: quests (waste reports),
//! notifications, e-waste listings, bids, admin reviews, collector workload
//! and dashboard aggregates. All of these are owned by the backend; the client
//! only ever holds ephemeral copies of them.
//! ============================================================================

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;

// ============================================================================
// Identity
// ============================================================================

/// Record identity as sent by the backend.
/// The API mixes integer and string ids, so both are accepted and kept as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for RecordId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

impl Serialize for RecordId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for RecordId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawId {
            Int(i64),
            Text(String),
        }

        Ok(match RawId::deserialize(deserializer)? {
            RawId::Int(n) => RecordId(n.to_string()),
            RawId::Text(s) => RecordId(s),
        })
    }
}

/// Parse a backend timestamp. Accepts RFC 3339 and the naive ISO form
/// (no offset, assumed UTC) that the API emits for most records.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

/// A point on the map (WGS84)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }

    /// Latitude within [-90, 90] and longitude within [-180, 180]
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ============================================================================
// Pagination
// ============================================================================

/// Paged list envelope used by `GET /quests`, `GET /listings`, ...
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub skip: u64,
    #[serde(default)]
    pub limit: u64,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            skip: 0,
            limit: 0,
        }
    }
}

/// Pagination parameters shared by every list endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub skip: u64,
    pub limit: u64,
}

impl PageRequest {
    pub fn new(skip: u64, limit: u64) -> Self {
        Self { skip, limit }
    }

    pub fn first(limit: u64) -> Self {
        Self { skip: 0, limit }
    }

    pub fn to_query(&self) -> Vec<(String, String)> {
        vec![
            ("skip".to_string(), self.skip.to_string()),
            ("limit".to_string(), self.limit.to_string()),
        ]
    }
}

// ============================================================================
// Quests (waste reports)
// ============================================================================

/// Lifecycle status of a quest.
/// Declaration order is the forward order of the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestStatus {
    Pending,
    Assigned,
    InProgress,
    Completed,
    Verified,
}

impl QuestStatus {
    pub const ALL: [QuestStatus; 5] = [
        QuestStatus::Pending,
        QuestStatus::Assigned,
        QuestStatus::InProgress,
        QuestStatus::Completed,
        QuestStatus::Verified,
    ];

    fn rank(&self) -> u8 {
        match self {
            QuestStatus::Pending => 0,
            QuestStatus::Assigned => 1,
            QuestStatus::InProgress => 2,
            QuestStatus::Completed => 3,
            QuestStatus::Verified => 4,
        }
    }

    /// Whether moving to `next` is a forward transition.
    /// `assigned` may skip straight to `completed`.
    pub fn can_advance_to(&self, next: QuestStatus) -> bool {
        next.rank() > self.rank()
    }

    pub fn is_open(&self) -> bool {
        matches!(
            self,
            QuestStatus::Pending | QuestStatus::Assigned | QuestStatus::InProgress
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QuestStatus::Pending => "pending",
            QuestStatus::Assigned => "assigned",
            QuestStatus::InProgress => "in_progress",
            QuestStatus::Completed => "completed",
            QuestStatus::Verified => "verified",
        }
    }
}

impl fmt::Display for QuestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Waste category assigned by the image classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WasteType {
    Plastic,
    Organic,
    Paper,
    Glass,
    Metal,
    #[serde(alias = "ewaste", alias = "e-waste")]
    EWaste,
    Hazardous,
    Mixed,
    #[serde(other)]
    Other,
}

impl WasteType {
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteType::Plastic => "plastic",
            WasteType::Organic => "organic",
            WasteType::Paper => "paper",
            WasteType::Glass => "glass",
            WasteType::Metal => "metal",
            WasteType::EWaste => "e_waste",
            WasteType::Hazardous => "hazardous",
            WasteType::Mixed => "mixed",
            WasteType::Other => "other",
        }
    }
}

impl fmt::Display for WasteType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
    #[serde(other)]
    Unknown,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
            Severity::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A waste-collection quest as seen by citizens and collectors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Quest {
    pub id: RecordId,
    pub reporter_id: RecordId,
    /// Collector the quest is assigned to, if any
    #[serde(default)]
    pub collector_id: Option<RecordId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub geohash: Option<String>,
    pub waste_type: WasteType,
    pub severity: Severity,
    pub status: QuestStatus,
    #[serde(default)]
    pub bounty_points: u32,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub ai_verification_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub assigned_at: Option<String>,
    #[serde(default)]
    pub completed_at: Option<String>,
    #[serde(default)]
    pub verified_at: Option<String>,
}

/// Body of `POST /quests`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateQuestRequest {
    pub title: String,
    pub description: String,
    pub waste_type: WasteType,
    pub severity: Severity,
    pub latitude: f64,
    pub longitude: f64,
    pub image_url: String,
}

/// Body of `POST /quests/{id}/complete`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CompleteQuestRequest {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub photo_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

/// Classifier output from `POST /quests/analyze-image`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ImageAnalysis {
    pub waste_type: WasteType,
    pub severity: Severity,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

// ============================================================================
// Collector
// ============================================================================

/// Capacity metrics from `GET /collectors/me/workload`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct CollectorWorkload {
    pub active_quests: u32,
    pub max_concurrent: u32,
    pub capacity_remaining: u32,
    #[serde(default)]
    pub completed_last_week: u32,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub fraud_risk_score: f64,
}

impl CollectorWorkload {
    pub fn is_at_capacity(&self) -> bool {
        self.capacity_remaining == 0 || self.active_quests >= self.max_concurrent
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Optional metadata bag attached to a notification
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationMetadata {
    #[serde(default)]
    pub severity: Option<Severity>,
    #[serde(default)]
    pub bounty_amount: Option<u32>,
    #[serde(default)]
    pub waste_type: Option<WasteType>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub id: RecordId,
    /// Category tag, e.g. `quest_assigned`, `bid_received`
    #[serde(rename = "type", alias = "notification_type", default)]
    pub category: String,
    pub title: String,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub related_id: Option<RecordId>,
    #[serde(default)]
    pub metadata: Option<NotificationMetadata>,
    #[serde(default)]
    pub is_read: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Envelope of `GET /notifications`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct NotificationPage {
    pub items: Vec<Notification>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub unread_count: u64,
}

/// Query for `GET /notifications`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NotificationQuery {
    pub page: PageRequest,
    pub unread_only: bool,
}

impl NotificationQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = self.page.to_query();
        query.push(("unread_only".to_string(), self.unread_only.to_string()));
        query
    }
}

// ============================================================================
// Admin reviews
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewDecision {
    Approve,
    Reject,
    Flag,
    #[serde(other)]
    Pending,
}

/// A flagged report in the admin review queue
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AdminReview {
    pub id: RecordId,
    pub quest_id: RecordId,
    #[serde(default)]
    pub reviewer_id: Option<RecordId>,
    pub decision: ReviewDecision,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub fraud_score: Option<f64>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Envelope of `GET /admin/reviews`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ReviewPage {
    pub items: Vec<AdminReview>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pending_count: u64,
}

/// Body of `POST /admin/reviews`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmitReviewRequest {
    pub quest_id: RecordId,
    pub decision: ReviewDecision,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

// ============================================================================
// Dashboard aggregates
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DailyCount {
    pub date: String,
    pub count: u64,
}

/// `GET /dashboard/analytics`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DashboardAnalytics {
    #[serde(default)]
    pub total_reports: u64,
    #[serde(default)]
    pub active_quests: u64,
    #[serde(default)]
    pub completed_quests: u64,
    #[serde(default)]
    pub total_collectors: u64,
    #[serde(default)]
    pub total_bounty_points: u64,
    #[serde(default)]
    pub reports_by_waste_type: BTreeMap<String, u64>,
    #[serde(default)]
    pub daily_reports: Vec<DailyCount>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HeatmapPoint {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub intensity: f64,
    #[serde(default)]
    pub geohash: Option<String>,
}

/// `GET /dashboard/heatmap`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Heatmap {
    pub points: Vec<HeatmapPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LeaderboardEntry {
    pub rank: u32,
    pub user_id: RecordId,
    pub name: String,
    #[serde(default)]
    pub bounty_points: u64,
    #[serde(default)]
    pub quests_completed: u64,
}

/// `GET /dashboard/leaderboard`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Leaderboard {
    pub entries: Vec<LeaderboardEntry>,
}

/// `GET /dashboard/ewaste-analytics`
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct EwasteAnalytics {
    #[serde(default)]
    pub total_listings: u64,
    #[serde(default)]
    pub active_listings: u64,
    #[serde(default)]
    pub total_bids: u64,
    #[serde(default)]
    pub accepted_bids: u64,
    #[serde(default)]
    pub total_value: f64,
    #[serde(default)]
    pub listings_by_device_type: BTreeMap<String, u64>,
}

// ============================================================================
// E-waste listings
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Active,
    PendingPickup,
    Sold,
    Cancelled,
    #[serde(other)]
    Unknown,
}

/// An e-waste item posted for pickup/sale
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Listing {
    pub id: RecordId,
    pub user_id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub device_type: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub predicted_price: Option<f64>,
    #[serde(default)]
    pub estimated_weight_kg: Option<f64>,
    pub status: ListingStatus,
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    #[serde(default)]
    pub bid_count: u32,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Query for `GET /listings`
#[derive(Debug, Clone, PartialEq)]
pub struct ListingQuery {
    pub page: PageRequest,
    pub status: Option<ListingStatus>,
    pub device_type: Option<String>,
}

impl ListingQuery {
    pub fn to_query(&self) -> Vec<(String, String)> {
        let mut query = self.page.to_query();
        if let Some(status) = self.status {
            if let Ok(serde_json::Value::String(s)) = serde_json::to_value(status) {
                query.push(("status".to_string(), s));
            }
        }
        if let Some(device_type) = &self.device_type {
            query.push(("device_type".to_string(), device_type.clone()));
        }
        query
    }
}

/// AI analysis from `POST /listings/analyze`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ListingAnalysis {
    pub device_type: String,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub condition: Option<String>,
    #[serde(default)]
    pub predicted_price: Option<f64>,
    #[serde(default)]
    pub estimated_weight_kg: Option<f64>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence_score: Option<f64>,
}

/// Body of `POST /listings`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CreateListingRequest {
    pub title: String,
    pub description: String,
    pub device_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<String>,
    pub image_urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub predicted_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_weight_kg: Option<f64>,
    pub latitude: f64,
    pub longitude: f64,
}

// ============================================================================
// Bids
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BidStatus {
    Pending,
    Accepted,
    Rejected,
    Withdrawn,
}

/// A kabadiwala's offer on a listing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bid {
    pub id: RecordId,
    pub listing_id: RecordId,
    #[serde(alias = "kabadiwala_id")]
    pub bidder_id: RecordId,
    pub offered_price: f64,
    #[serde(default)]
    pub pickup_time_estimate: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    pub status: BidStatus,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Body of `POST /bids/confirm-weight`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfirmWeightRequest {
    pub bid_id: RecordId,
    pub weight_kg: f64,
}

// ============================================================================
// Structured rejections (400 `detail` payloads)
// ============================================================================

/// A reverse-image-search hit reported with a fraud rejection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum WebMatch {
    Detailed {
        url: String,
        #[serde(default)]
        title: Option<String>,
        #[serde(default)]
        score: Option<f64>,
    },
    Url(String),
}

impl WebMatch {
    pub fn url(&self) -> &str {
        match self {
            WebMatch::Detailed { url, .. } => url,
            WebMatch::Url(url) => url,
        }
    }
}

/// `detail` of a 400 from an analysis endpoint that flagged the image
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudDetail {
    pub error: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub confidence_score: Option<f64>,
    #[serde(default)]
    pub web_matches: Vec<WebMatch>,
}

/// `detail` of a 400 from `POST /bids/confirm-weight`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeightValidationDetail {
    #[serde(default)]
    pub error: String,
    #[serde(default)]
    pub message: String,
    pub entered_weight: f64,
    #[serde(default)]
    pub typical_weight: Option<f64>,
    #[serde(default)]
    pub max_expected_weight: Option<f64>,
    #[serde(default)]
    pub suggestion: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_id_accepts_int_and_string() {
        let a: RecordId = serde_json::from_str("42").unwrap();
        let b: RecordId = serde_json::from_str("\"abc-1\"").unwrap();
        assert_eq!(a.as_str(), "42");
        assert_eq!(b.as_str(), "abc-1");
        assert_eq!(serde_json::to_string(&a).unwrap(), "\"42\"");
    }

    #[test]
    fn test_quest_status_is_forward_only() {
        assert!(QuestStatus::Pending.can_advance_to(QuestStatus::Assigned));
        assert!(QuestStatus::Assigned.can_advance_to(QuestStatus::Completed));
        assert!(QuestStatus::Completed.can_advance_to(QuestStatus::Verified));
        assert!(!QuestStatus::Completed.can_advance_to(QuestStatus::Pending));
        assert!(!QuestStatus::Verified.can_advance_to(QuestStatus::Verified));
    }

    #[test]
    fn test_waste_type_unknown_maps_to_other() {
        let parsed: WasteType = serde_json::from_str("\"textiles\"").unwrap();
        assert_eq!(parsed, WasteType::Other);
        let ewaste: WasteType = serde_json::from_str("\"ewaste\"").unwrap();
        assert_eq!(ewaste, WasteType::EWaste);
    }

    #[test]
    fn test_unknown_severity_does_not_break_quest_decode() {
        let body = r#"{"id":5,"reporter_id":1,"latitude":12.9,"longitude":77.6,"waste_type":"plastic","severity":"extreme","status":"pending"}"#;
        let quest: Quest = serde_json::from_str(body).unwrap();
        assert_eq!(quest.severity, Severity::Unknown);
        assert_eq!(quest.severity.to_string(), "unknown");
    }

    #[test]
    fn test_notification_deserializes_type_tag() {
        let raw = r#"{
            "id": 7,
            "type": "bounty_awarded",
            "title": "Bounty!",
            "message": "You earned 50 points",
            "metadata": {"bounty_amount": 50, "severity": "high"},
            "is_read": false
        }"#;
        let n: Notification = serde_json::from_str(raw).unwrap();
        assert_eq!(n.category, "bounty_awarded");
        assert_eq!(n.id.as_str(), "7");
        let meta = n.metadata.unwrap();
        assert_eq!(meta.bounty_amount, Some(50));
        assert_eq!(meta.severity, Some(Severity::High));
    }

    #[test]
    fn test_parse_timestamp_naive_and_rfc3339() {
        assert!(parse_timestamp("2024-03-01T10:15:30").is_some());
        assert!(parse_timestamp("2024-03-01T10:15:30.123456").is_some());
        assert!(parse_timestamp("2024-03-01T10:15:30Z").is_some());
        assert!(parse_timestamp("yesterday").is_none());
    }

    #[test]
    fn test_fraud_detail_web_matches_shapes() {
        let raw = r#"{
            "error": "Image fraud detected",
            "confidence_score": 0.93,
            "web_matches": ["https://stock.example/a.jpg", {"url": "https://b.example/x.png", "score": 0.8}]
        }"#;
        let detail: FraudDetail = serde_json::from_str(raw).unwrap();
        assert_eq!(detail.web_matches.len(), 2);
        assert_eq!(detail.web_matches[0].url(), "https://stock.example/a.jpg");
        assert_eq!(detail.web_matches[1].url(), "https://b.example/x.png");
    }

    #[test]
    fn test_listing_query_includes_status() {
        let q = ListingQuery {
            page: PageRequest::new(10, 5),
            status: Some(ListingStatus::PendingPickup),
            device_type: Some("laptop".to_string()),
        };
        let query = q.to_query();
        assert!(query.contains(&("status".to_string(), "pending_pickup".to_string())));
        assert!(query.contains(&("skip".to_string(), "10".to_string())));
        assert!(query.contains(&("device_type".to_string(), "laptop".to_string())));
    }

    #[test]
    fn test_geo_point_validation() {
        assert!(GeoPoint::new(12.97, 77.59).is_valid());
        assert!(!GeoPoint::new(91.0, 0.0).is_valid());
        assert!(!GeoPoint::new(f64::NAN, 0.0).is_valid());
    }
}
