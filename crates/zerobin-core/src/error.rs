//! ============================================================================
//! Error Types - Normalized failures from the ZeroBin API
//! ============================================================================
//! Every network call collapses into one `ApiError`. Domain rejections
//! (fraud, weight validation) keep their structured `detail` so callers can
//! route them to a dedicated modal instead of a generic toast.
//! ============================================================================

use crate::types::{FraudDetail, WeightValidationDetail};

/// Maximum characters of a non-JSON body kept for diagnostics
pub const BODY_SNIPPET_LEN: usize = 200;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ApiError {
    #[error("Network error: {0}")]
    Transport(String),

    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Expected JSON but got {content_type}: {snippet}")]
    NonJson {
        status: u16,
        content_type: String,
        snippet: String,
    },

    #[error("Malformed response: {0}")]
    Decode(String),

    #[error("Image fraud detected")]
    Fraud(FraudDetail),

    #[error("Weight validation failed: {}", .0.message)]
    WeightValidation(WeightValidationDetail),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Image upload failed: {0}")]
    Upload(String),

    #[error("Invalid input: {0}")]
    Invalid(String),
}

impl ApiError {
    /// HTTP status carried by this error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } | ApiError::NonJson { status, .. } => Some(*status),
            ApiError::Fraud(_) | ApiError::WeightValidation(_) => Some(400),
            _ => None,
        }
    }

    /// Domain rejections that need a blocking modal rather than a toast
    pub fn needs_acknowledgement(&self) -> bool {
        matches!(self, ApiError::Fraud(_) | ApiError::WeightValidation(_))
    }

    /// Human-readable message suitable for a toast or inline banner
    pub fn user_message(&self) -> String {
        match self {
            ApiError::Fraud(detail) => detail
                .message
                .clone()
                .unwrap_or_else(|| detail.error.clone()),
            ApiError::WeightValidation(detail) if !detail.message.is_empty() => {
                detail.message.clone()
            }
            other => other.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(e: reqwest::Error) -> Self {
        ApiError::Transport(e.to_string())
    }
}

/// Truncate a body to `BODY_SNIPPET_LEN` characters on a char boundary
pub fn snippet(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= BODY_SNIPPET_LEN {
        return trimmed.to_string();
    }
    let mut out: String = trimmed.chars().take(BODY_SNIPPET_LEN).collect();
    out.push_str("...");
    out
}

/// Failure of an optimistic mutation
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MutationError {
    #[error("Record not found: {0}")]
    NotFound(String),

    /// The server rejected the mutation; local state was rolled back
    #[error("{0}")]
    Rejected(ApiError),
}

/// Failure of a submission flow step
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SubmissionError {
    #[error("Cannot {action} while {stage}")]
    InvalidStage { action: &'static str, stage: String },

    #[error("Missing required field: {0}")]
    MissingField(&'static str),

    #[error("{0}")]
    Api(#[from] ApiError),
}
