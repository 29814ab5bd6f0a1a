//! ============================================================================
//! UI Events - Side channel for toasts, banners, modals and navigation
//! ============================================================================
//! View models never render anything themselves. They push `UiEvent`s into an
//! `EventSink`; the shell (CLI, desktop, web) drains the receiver and presents
//! them. Failures are never swallowed: each one becomes an event and a log line.
//! ============================================================================

use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{debug, error};

use crate::error::ApiError;
use crate::types::{FraudDetail, WeightValidationDetail};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

/// Content of a blocking modal that requires acknowledgement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModalContent {
    pub title: String,
    pub lines: Vec<String>,
}

impl ModalContent {
    pub fn fraud(detail: &FraudDetail) -> Self {
        let mut lines = Vec::new();
        if let Some(message) = &detail.message {
            lines.push(message.clone());
        }
        if let Some(score) = detail.confidence_score {
            lines.push(format!("Confidence Score: {:.0}%", score * 100.0));
        }
        if !detail.web_matches.is_empty() {
            lines.push(format!("Web Matches: {}", detail.web_matches.len()));
            for m in &detail.web_matches {
                lines.push(format!("  - {}", m.url()));
            }
        }
        lines.push("Please take a new photo of the actual waste and try again.".to_string());

        Self {
            title: detail.error.clone(),
            lines,
        }
    }

    pub fn weight(detail: &WeightValidationDetail) -> Self {
        let mut lines = Vec::new();
        if !detail.message.is_empty() {
            lines.push(detail.message.clone());
        }
        lines.push(format!("Entered Weight: {} kg", detail.entered_weight));
        if let Some(typical) = detail.typical_weight {
            lines.push(format!("Typical Weight: {} kg", typical));
        }
        if let Some(max) = detail.max_expected_weight {
            lines.push(format!("Max Expected Weight: {} kg", max));
        }
        if let Some(suggestion) = &detail.suggestion {
            lines.push(suggestion.clone());
        }

        Self {
            title: "Weight Validation Failed".to_string(),
            lines,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    /// Transient success/failure notice
    Toast { level: ToastLevel, message: String },
    /// Persistent list-level notice (e.g. sample data shown)
    Banner { message: String },
    /// Blocking domain error
    Modal(ModalContent),
    /// Redirect to a route
    Navigate { route: String },
}

/// Cloneable sender half of the UI event channel
#[derive(Debug, Clone)]
pub struct EventSink {
    tx: mpsc::UnboundedSender<UiEvent>,
}

impl EventSink {
    /// Create a sink and the receiver the shell drains
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<UiEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    pub fn emit(&self, event: UiEvent) {
        if self.tx.send(event).is_err() {
            debug!("UI event dropped: receiver closed");
        }
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(UiEvent::Toast {
            level: ToastLevel::Success,
            message: message.into(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(UiEvent::Toast {
            level: ToastLevel::Info,
            message: message.into(),
        });
    }

    pub fn banner(&self, message: impl Into<String>) {
        self.emit(UiEvent::Banner {
            message: message.into(),
        });
    }

    pub fn navigate(&self, route: impl Into<String>) {
        self.emit(UiEvent::Navigate {
            route: route.into(),
        });
    }

    /// Report a failed call. Domain rejections open a modal; everything
    /// else becomes an error toast prefixed with `context`.
    pub fn report(&self, err: &ApiError, context: &str) {
        error!("{}: {}", context, err);

        match err {
            ApiError::Fraud(detail) => self.emit(UiEvent::Modal(ModalContent::fraud(detail))),
            ApiError::WeightValidation(detail) => {
                self.emit(UiEvent::Modal(ModalContent::weight(detail)))
            }
            other => self.emit(UiEvent::Toast {
                level: ToastLevel::Error,
                message: format!("{}: {}", context, other.user_message()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::WebMatch;

    #[test]
    fn test_report_routes_weight_error_to_modal() {
        let (sink, mut rx) = EventSink::channel();
        let err = ApiError::WeightValidation(WeightValidationDetail {
            error: "weight_validation_failed".to_string(),
            message: "Entered weight is far below typical".to_string(),
            entered_weight: 0.05,
            typical_weight: Some(2.0),
            max_expected_weight: Some(6.0),
            suggestion: Some("Re-weigh the item".to_string()),
        });

        sink.report(&err, "Failed to confirm weight");

        match rx.try_recv().unwrap() {
            UiEvent::Modal(modal) => {
                assert!(modal.lines.contains(&"Entered Weight: 0.05 kg".to_string()));
                assert!(modal.lines.contains(&"Typical Weight: 2 kg".to_string()));
            }
            other => panic!("expected modal, got {:?}", other),
        }
    }

    #[test]
    fn test_report_routes_generic_error_to_toast() {
        let (sink, mut rx) = EventSink::channel();
        sink.report(&ApiError::Transport("connection refused".into()), "Failed to load quests");

        match rx.try_recv().unwrap() {
            UiEvent::Toast { level, message } => {
                assert_eq!(level, ToastLevel::Error);
                assert!(message.starts_with("Failed to load quests"));
                assert!(message.contains("connection refused"));
            }
            other => panic!("expected toast, got {:?}", other),
        }
    }

    #[test]
    fn test_fraud_modal_shows_score_and_matches() {
        let modal = ModalContent::fraud(&FraudDetail {
            error: "Image fraud detected".to_string(),
            message: None,
            confidence_score: Some(0.87),
            web_matches: vec![WebMatch::Url("https://stock.example/bin.jpg".to_string())],
        });
        assert_eq!(modal.title, "Image fraud detected");
        assert!(modal.lines.contains(&"Confidence Score: 87%".to_string()));
        assert!(modal.lines.iter().any(|l| l.contains("https://stock.example/bin.jpg")));
    }

    #[test]
    fn test_emit_after_receiver_dropped_is_silent() {
        let (sink, rx) = EventSink::channel();
        drop(rx);
        sink.success("still fine");
    }
}
