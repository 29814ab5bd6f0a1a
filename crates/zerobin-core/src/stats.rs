//! Client-side aggregation for dashboard cards.
//!
//! Pure functions over whatever records a view currently holds. Nothing here
//! talks to the network.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::types::{Bid, BidStatus, Listing, ListingStatus, Notification, Quest, QuestStatus};

/// Counts and totals over a set of quests
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QuestStats {
    pub total: usize,
    pub by_status: BTreeMap<String, usize>,
    pub by_waste_type: BTreeMap<String, usize>,
    pub by_severity: BTreeMap<String, usize>,
    /// Open quests (pending, assigned, in progress)
    pub open: usize,
    /// Bounty on every quest in the set
    pub bounty_total: u64,
    /// Bounty on completed or verified quests
    pub bounty_earned: u64,
    pub mean_ai_score: Option<f64>,
}

impl QuestStats {
    pub fn from_quests(quests: &[Quest]) -> Self {
        let mut stats = QuestStats {
            total: quests.len(),
            ..Default::default()
        };

        let mut score_sum = 0.0;
        let mut score_count = 0usize;

        for quest in quests {
            *stats.by_status.entry(quest.status.to_string()).or_insert(0) += 1;
            *stats.by_waste_type.entry(quest.waste_type.to_string()).or_insert(0) += 1;
            *stats.by_severity.entry(quest.severity.to_string()).or_insert(0) += 1;

            stats.bounty_total += u64::from(quest.bounty_points);
            if quest.status.is_open() {
                stats.open += 1;
            } else {
                stats.bounty_earned += u64::from(quest.bounty_points);
            }

            if let Some(score) = quest.ai_verification_score {
                score_sum += score;
                score_count += 1;
            }
        }

        if score_count > 0 {
            stats.mean_ai_score = Some(score_sum / score_count as f64);
        }
        stats
    }

    pub fn count(&self, status: QuestStatus) -> usize {
        self.by_status.get(status.as_str()).copied().unwrap_or(0)
    }

    /// Share of quests that reached completed or verified, 0.0 - 1.0
    pub fn completion_rate(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        (self.total - self.open) as f64 / self.total as f64
    }
}

/// Counts and offer statistics over a set of bids
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BidStats {
    pub total: usize,
    pub pending: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub withdrawn: usize,
    pub highest_offer: Option<f64>,
    pub average_offer: Option<f64>,
}

impl BidStats {
    pub fn from_bids(bids: &[Bid]) -> Self {
        let mut stats = BidStats {
            total: bids.len(),
            ..Default::default()
        };

        for bid in bids {
            match bid.status {
                BidStatus::Pending => stats.pending += 1,
                BidStatus::Accepted => stats.accepted += 1,
                BidStatus::Rejected => stats.rejected += 1,
                BidStatus::Withdrawn => stats.withdrawn += 1,
            }
        }

        stats.highest_offer = bids
            .iter()
            .map(|b| b.offered_price)
            .fold(None, |max: Option<f64>, p| Some(max.map_or(p, |m| m.max(p))));

        if !bids.is_empty() {
            let sum: f64 = bids.iter().map(|b| b.offered_price).sum();
            stats.average_offer = Some(sum / bids.len() as f64);
        }
        stats
    }
}

/// Listing counts and predicted value
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ListingStats {
    pub total: usize,
    pub active: usize,
    pub pending_pickup: usize,
    pub sold: usize,
    pub by_device_type: BTreeMap<String, usize>,
    pub predicted_value: f64,
}

impl ListingStats {
    pub fn from_listings(listings: &[Listing]) -> Self {
        let mut stats = ListingStats {
            total: listings.len(),
            ..Default::default()
        };

        for listing in listings {
            match listing.status {
                ListingStatus::Active => stats.active += 1,
                ListingStatus::PendingPickup => stats.pending_pickup += 1,
                ListingStatus::Sold => stats.sold += 1,
                ListingStatus::Cancelled | ListingStatus::Unknown => {}
            }
            let device = if listing.device_type.is_empty() {
                "unknown".to_string()
            } else {
                listing.device_type.to_lowercase()
            };
            *stats.by_device_type.entry(device).or_insert(0) += 1;
            stats.predicted_value += listing.predicted_price.unwrap_or(0.0);
        }
        stats
    }
}

/// Notifications grouped by category tag, preserving feed order within a group
pub fn group_by_category(notifications: &[Notification]) -> BTreeMap<String, Vec<Notification>> {
    let mut groups: BTreeMap<String, Vec<Notification>> = BTreeMap::new();
    for n in notifications {
        groups.entry(n.category.clone()).or_default().push(n.clone());
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RecordId, Severity, WasteType};

    fn quest(id: u64, status: QuestStatus, waste: WasteType, bounty: u32) -> Quest {
        Quest {
            id: RecordId::from(id),
            reporter_id: RecordId::from(1u64),
            collector_id: None,
            title: format!("quest {}", id),
            description: String::new(),
            latitude: 0.0,
            longitude: 0.0,
            geohash: None,
            waste_type: waste,
            severity: Severity::Medium,
            status,
            bounty_points: bounty,
            image_urls: Vec::new(),
            ai_verification_score: None,
            created_at: None,
            assigned_at: None,
            completed_at: None,
            verified_at: None,
        }
    }

    fn bid(id: u64, price: f64, status: BidStatus) -> Bid {
        Bid {
            id: RecordId::from(id),
            listing_id: RecordId::from(1u64),
            bidder_id: RecordId::from(2u64),
            offered_price: price,
            pickup_time_estimate: None,
            message: None,
            status,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_quest_stats() {
        let mut verified = quest(3, QuestStatus::Verified, WasteType::Plastic, 50);
        verified.ai_verification_score = Some(0.9);
        let mut done = quest(4, QuestStatus::Completed, WasteType::Metal, 30);
        done.ai_verification_score = Some(0.7);

        let quests = vec![
            quest(1, QuestStatus::Pending, WasteType::Plastic, 10),
            quest(2, QuestStatus::InProgress, WasteType::Organic, 20),
            verified,
            done,
        ];
        let stats = QuestStats::from_quests(&quests);

        assert_eq!(stats.total, 4);
        assert_eq!(stats.open, 2);
        assert_eq!(stats.count(QuestStatus::Verified), 1);
        assert_eq!(stats.count(QuestStatus::Assigned), 0);
        assert_eq!(stats.by_waste_type["plastic"], 2);
        assert_eq!(stats.bounty_total, 110);
        assert_eq!(stats.bounty_earned, 80);
        assert!((stats.mean_ai_score.unwrap() - 0.8).abs() < 1e-9);
        assert!((stats.completion_rate() - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_empty_quest_stats() {
        let stats = QuestStats::from_quests(&[]);
        assert_eq!(stats.completion_rate(), 0.0);
        assert!(stats.mean_ai_score.is_none());
    }

    #[test]
    fn test_bid_stats() {
        let bids = vec![
            bid(1, 300.0, BidStatus::Pending),
            bid(2, 450.0, BidStatus::Accepted),
            bid(3, 150.0, BidStatus::Rejected),
        ];
        let stats = BidStats::from_bids(&bids);
        assert_eq!(stats.accepted, 1);
        assert_eq!(stats.highest_offer, Some(450.0));
        assert_eq!(stats.average_offer, Some(300.0));
        assert_eq!(BidStats::from_bids(&[]).highest_offer, None);
    }
}
