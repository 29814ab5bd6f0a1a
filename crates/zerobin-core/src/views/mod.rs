//! ============================================================================
//! Views - Per-screen state owners
//! ============================================================================
//! Each view owns its own slice of state and reports through an `EventSink`.
//! Nothing is shared between views except the read-only session inside the
//! API client.
//! ============================================================================

pub mod bids;
pub mod dashboard;
pub mod notifications;
pub mod quests;

pub use bids::BidBoard;
pub use dashboard::{AdminDashboard, DashboardSnapshot};
pub use notifications::NotificationFeed;
pub use quests::CollectorTaskBoard;
