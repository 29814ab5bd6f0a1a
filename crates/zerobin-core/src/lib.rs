//! ============================================================================
//! ZEROBIN-CORE: Client for the ZeroBin waste and e-waste marketplace
//! ============================================================================
//! This crate holds everything below the UI:
//! - HTTP API client with response normalization (`api`)
//! - Optimistic mutations with per-record rollback (`optimistic`)
//! - List loading with labelled sample-data fallback (`fetch`)
//! - The upload -> analyze -> create submission flow (`submission`)
//! - Per-screen state owners (`views`)
//! ============================================================================

pub mod api;
pub mod config;
pub mod error;
pub mod events;
pub mod fallback;
pub mod fetch;
pub mod optimistic;
pub mod session;
pub mod stats;
pub mod submission;
pub mod types;
pub mod upload;
pub mod views;

// Re-export main types for convenience
pub use types::*;
pub use api::{ApiClient, BidApi, ListingApi, NotificationApi, QuestApi};
pub use config::ClientConfig;
pub use error::{ApiError, MutationError, SubmissionError};
pub use events::{EventSink, ModalContent, ToastLevel, UiEvent};
pub use fetch::{DataSource, ListState, ListView, Loaded};
pub use optimistic::{Keyed, MutationOutcome, OptimisticCollection};
pub use session::{Role, Session, SessionUser};
pub use stats::{BidStats, ListingStats, QuestStats};
pub use submission::{
    ListingSubmission, LocationSource, ReportSubmission, Stage, SubmissionBackend, SubmissionFlow,
};
pub use upload::{ImageHostUploader, ImageUploader, SelectedImage};
pub use views::{AdminDashboard, BidBoard, CollectorTaskBoard, DashboardSnapshot, NotificationFeed};
