//! ============================================================================
//! Submission Flow - Upload, analyze, then create
//! ============================================================================
//! Drives a waste report or e-waste listing through three delegated steps:
//! the photo goes to the image host, the resulting URL goes to an AI
//! analysis endpoint, and finally one atomic POST creates the record.
//!
//! Stages:
//!   Idle -> ImageSelected -> Uploading -> Analyzed -> ReadyToSubmit
//!        -> Submitting -> Created
//! with two detours: a fraud verdict during analysis lands in
//! FraudRejected (image state wiped, modal shown), and a failed submit
//! returns to ReadyToSubmit with an inline error.
//!
//! Every mutating step takes `&mut self`, so a flow cannot dispatch two
//! steps at once.
//! ============================================================================

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::{ListingApi, QuestApi};
use crate::error::{ApiError, SubmissionError};
use crate::events::EventSink;
use crate::types::{
    CreateListingRequest, CreateQuestRequest, FraudDetail, GeoPoint, ImageAnalysis, Listing,
    ListingAnalysis, Quest,
};
use crate::upload::{ImageUploader, SelectedImage};

/// Route the reports list lives at
pub const REPORTS_ROUTE: &str = "/reports";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ImageSelected,
    Uploading,
    Analyzed,
    FraudRejected,
    ReadyToSubmit,
    Submitting,
    Created,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::ImageSelected => "image selected",
            Stage::Uploading => "uploading",
            Stage::Analyzed => "analyzed",
            Stage::FraudRejected => "fraud rejected",
            Stage::ReadyToSubmit => "ready to submit",
            Stage::Submitting => "submitting",
            Stage::Created => "created",
        };
        write!(f, "{}", s)
    }
}

/// Where the submission's coordinates came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Manual,
    Device,
}

/// Everything the create step needs, assembled once all fields are present
#[derive(Debug, Clone, PartialEq)]
pub struct SubmissionDraft<A> {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub analysis: A,
    pub location: GeoPoint,
}

/// The record-specific half of a submission: which analysis endpoint to
/// call, how to build the create request and where to go afterwards.
#[async_trait]
pub trait SubmissionBackend: Send + Sync {
    type Analysis: Clone + fmt::Debug + Send + Sync;
    type Created: Clone + fmt::Debug + Send + Sync;

    /// Human label used in toasts ("report", "listing")
    fn kind(&self) -> &'static str;

    async fn analyze(&self, image_url: &str) -> Result<Self::Analysis, ApiError>;

    async fn create(
        &self,
        draft: &SubmissionDraft<Self::Analysis>,
    ) -> Result<Self::Created, ApiError>;

    /// Route to navigate to after creation
    fn redirect(&self, created: &Self::Created) -> String;
}

// ============================================================================
// Backends
// ============================================================================

/// Citizen waste report: `POST /quests/analyze-image` then `POST /quests`
pub struct ReportSubmission<Q> {
    api: Q,
}

impl<Q: QuestApi> ReportSubmission<Q> {
    pub fn new(api: Q) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<Q: QuestApi> SubmissionBackend for ReportSubmission<Q> {
    type Analysis = ImageAnalysis;
    type Created = Quest;

    fn kind(&self) -> &'static str {
        "report"
    }

    async fn analyze(&self, image_url: &str) -> Result<ImageAnalysis, ApiError> {
        self.api.analyze_image(image_url).await
    }

    async fn create(&self, draft: &SubmissionDraft<ImageAnalysis>) -> Result<Quest, ApiError> {
        let description = if draft.description.trim().is_empty() {
            draft.analysis.description.clone()
        } else {
            draft.description.clone()
        };

        let request = CreateQuestRequest {
            title: draft.title.clone(),
            description,
            waste_type: draft.analysis.waste_type,
            severity: draft.analysis.severity,
            latitude: draft.location.latitude,
            longitude: draft.location.longitude,
            image_url: draft.image_url.clone(),
        };
        self.api.create_quest(&request).await
    }

    fn redirect(&self, _created: &Quest) -> String {
        REPORTS_ROUTE.to_string()
    }
}

/// E-waste listing: `POST /listings/analyze` then `POST /listings`
pub struct ListingSubmission<L> {
    api: L,
}

impl<L: ListingApi> ListingSubmission<L> {
    pub fn new(api: L) -> Self {
        Self { api }
    }
}

#[async_trait]
impl<L: ListingApi> SubmissionBackend for ListingSubmission<L> {
    type Analysis = ListingAnalysis;
    type Created = Listing;

    fn kind(&self) -> &'static str {
        "listing"
    }

    async fn analyze(&self, image_url: &str) -> Result<ListingAnalysis, ApiError> {
        self.api.analyze_listing(image_url).await
    }

    async fn create(&self, draft: &SubmissionDraft<ListingAnalysis>) -> Result<Listing, ApiError> {
        let analysis = &draft.analysis;
        let description = if draft.description.trim().is_empty() {
            analysis.description.clone()
        } else {
            draft.description.clone()
        };

        let request = CreateListingRequest {
            title: draft.title.clone(),
            description,
            device_type: analysis.device_type.clone(),
            brand: analysis.brand.clone(),
            condition: analysis.condition.clone(),
            image_urls: vec![draft.image_url.clone()],
            predicted_price: analysis.predicted_price,
            estimated_weight_kg: analysis.estimated_weight_kg,
            latitude: draft.location.latitude,
            longitude: draft.location.longitude,
        };
        self.api.create_listing(&request).await
    }

    fn redirect(&self, created: &Listing) -> String {
        format!("/listings/{}", created.id)
    }
}

// ============================================================================
// Flow
// ============================================================================

/// Form state rendered by the submission page
#[derive(Debug, Clone)]
pub struct SubmissionState<A, C> {
    pub stage: Stage,
    pub image: Option<SelectedImage>,
    pub preview: Option<String>,
    pub image_url: Option<String>,
    /// Read-only fields bound from the analysis endpoint
    pub analysis: Option<A>,
    pub title: String,
    pub description: String,
    pub location: Option<GeoPoint>,
    pub location_source: Option<LocationSource>,
    /// Inline error under the form
    pub error: Option<String>,
    /// Verdict behind the last fraud rejection
    pub fraud: Option<FraudDetail>,
    pub created: Option<C>,
}

impl<A, C> Default for SubmissionState<A, C> {
    fn default() -> Self {
        Self {
            stage: Stage::Idle,
            image: None,
            preview: None,
            image_url: None,
            analysis: None,
            title: String::new(),
            description: String::new(),
            location: None,
            location_source: None,
            error: None,
            fraud: None,
            created: None,
        }
    }
}

pub struct SubmissionFlow<B: SubmissionBackend> {
    id: Uuid,
    backend: B,
    uploader: Arc<dyn ImageUploader>,
    sink: EventSink,
    state: SubmissionState<B::Analysis, B::Created>,
}

impl<B: SubmissionBackend> SubmissionFlow<B> {
    pub fn new(backend: B, uploader: Arc<dyn ImageUploader>, sink: EventSink) -> Self {
        Self {
            id: Uuid::new_v4(),
            backend,
            uploader,
            sink,
            state: SubmissionState::default(),
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn stage(&self) -> Stage {
        self.state.stage
    }

    pub fn state(&self) -> &SubmissionState<B::Analysis, B::Created> {
        &self.state
    }

    /// Title, analysis and location all present
    pub fn is_complete(&self) -> bool {
        !self.state.title.trim().is_empty()
            && self.state.analysis.is_some()
            && self.state.location.is_some()
    }

    /// Pick (or replace) the photo. Clears any previous upload and analysis.
    pub fn select_image(&mut self, image: SelectedImage) -> Result<(), SubmissionError> {
        self.require(
            "select an image",
            &[
                Stage::Idle,
                Stage::ImageSelected,
                Stage::Analyzed,
                Stage::FraudRejected,
                Stage::ReadyToSubmit,
            ],
        )?;

        info!("Submission {}: selected {}", self.id, image.file_name);
        self.state.preview = Some(image.preview_data_url());
        self.state.image = Some(image);
        self.state.image_url = None;
        self.state.analysis = None;
        self.state.fraud = None;
        self.state.error = None;
        self.state.stage = Stage::ImageSelected;
        Ok(())
    }

    /// Upload the selected photo and run AI analysis on it.
    ///
    /// A fraud verdict wipes the image state and opens the fraud modal.
    /// Any other failure returns to `ImageSelected` so the user can retry;
    /// an already uploaded URL is reused on the retry.
    pub async fn upload_and_analyze(&mut self) -> Result<(), SubmissionError> {
        if self.state.stage == Stage::Idle || self.state.stage == Stage::FraudRejected {
            return Err(SubmissionError::MissingField("image"));
        }
        self.require("analyze", &[Stage::ImageSelected])?;
        let image = self
            .state
            .image
            .clone()
            .ok_or(SubmissionError::MissingField("image"))?;

        self.state.stage = Stage::Uploading;
        self.state.error = None;

        let image_url = match self.state.image_url.clone() {
            Some(url) => url,
            None => match self.uploader.upload(&image).await {
                Ok(url) => {
                    self.state.image_url = Some(url.clone());
                    url
                }
                Err(err) => {
                    self.fail_to(Stage::ImageSelected, &err, "Failed to upload image");
                    return Err(err.into());
                }
            },
        };

        match self.backend.analyze(&image_url).await {
            Ok(analysis) => {
                info!("Submission {}: image analyzed", self.id);
                self.state.analysis = Some(analysis);
                self.state.stage = Stage::Analyzed;
                self.update_readiness();
                Ok(())
            }
            Err(ApiError::Fraud(detail)) => {
                warn!(
                    "Submission {}: image rejected as fraudulent ({:?})",
                    self.id, detail.confidence_score
                );
                self.state.image = None;
                self.state.preview = None;
                self.state.image_url = None;
                self.state.analysis = None;
                self.state.fraud = Some(detail.clone());
                self.state.stage = Stage::FraudRejected;

                let err = ApiError::Fraud(detail);
                self.sink.report(&err, "Image rejected");
                Err(err.into())
            }
            Err(err) => {
                self.fail_to(Stage::ImageSelected, &err, "Failed to analyze image");
                Err(err.into())
            }
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) {
        self.state.title = title.into();
        self.update_readiness();
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.state.description = description.into();
    }

    /// Coordinates typed by the user
    pub fn set_location(&mut self, point: GeoPoint) -> Result<(), SubmissionError> {
        self.apply_location(point, LocationSource::Manual)
    }

    /// Coordinates reported by the device's geolocation
    pub fn use_device_location(&mut self, point: GeoPoint) -> Result<(), SubmissionError> {
        self.apply_location(point, LocationSource::Device)
    }

    /// Create the record. On failure the form stays filled in and returns
    /// to `ReadyToSubmit` with an inline message.
    pub async fn submit(&mut self) -> Result<B::Created, SubmissionError> {
        self.require("submit", &[Stage::ReadyToSubmit])?;
        let draft = self.draft()?;

        info!("Submission {}: creating {}", self.id, self.backend.kind());
        self.state.stage = Stage::Submitting;
        self.state.error = None;

        match self.backend.create(&draft).await {
            Ok(created) => {
                let route = self.backend.redirect(&created);
                info!("Submission {}: created, redirecting to {}", self.id, route);

                self.state.created = Some(created.clone());
                self.state.stage = Stage::Created;
                self.sink
                    .success(format!("{} submitted successfully", capitalize(self.backend.kind())));
                self.sink.navigate(route);
                Ok(created)
            }
            Err(err) => {
                let context = format!("Failed to submit {}", self.backend.kind());
                self.fail_to(Stage::ReadyToSubmit, &err, &context);
                Err(err.into())
            }
        }
    }

    /// Start over with a fresh form
    pub fn reset(&mut self) {
        self.id = Uuid::new_v4();
        self.state = SubmissionState::default();
    }

    fn apply_location(
        &mut self,
        point: GeoPoint,
        source: LocationSource,
    ) -> Result<(), SubmissionError> {
        if !point.is_valid() {
            return Err(ApiError::Invalid(format!(
                "coordinates out of range: {}, {}",
                point.latitude, point.longitude
            ))
            .into());
        }
        self.state.location = Some(point);
        self.state.location_source = Some(source);
        self.update_readiness();
        Ok(())
    }

    fn update_readiness(&mut self) {
        let complete = self.is_complete();
        match self.state.stage {
            Stage::Analyzed if complete => self.state.stage = Stage::ReadyToSubmit,
            Stage::ReadyToSubmit if !complete => self.state.stage = Stage::Analyzed,
            _ => {}
        }
    }

    fn draft(&self) -> Result<SubmissionDraft<B::Analysis>, SubmissionError> {
        let title = self.state.title.trim();
        if title.is_empty() {
            return Err(SubmissionError::MissingField("title"));
        }
        Ok(SubmissionDraft {
            title: title.to_string(),
            description: self.state.description.clone(),
            image_url: self
                .state
                .image_url
                .clone()
                .ok_or(SubmissionError::MissingField("image"))?,
            analysis: self
                .state
                .analysis
                .clone()
                .ok_or(SubmissionError::MissingField("analysis"))?,
            location: self
                .state
                .location
                .ok_or(SubmissionError::MissingField("location"))?,
        })
    }

    fn require(&self, action: &'static str, allowed: &[Stage]) -> Result<(), SubmissionError> {
        if allowed.contains(&self.state.stage) {
            Ok(())
        } else {
            Err(SubmissionError::InvalidStage {
                action,
                stage: self.state.stage.to_string(),
            })
        }
    }

    fn fail_to(&mut self, stage: Stage, err: &ApiError, context: &str) {
        self.state.stage = stage;
        self.state.error = Some(err.user_message());
        self.sink.report(err, context);
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
