//! ============================================================================
//! Fallback Datasets - Sample data shown when a dashboard load fails
//! ============================================================================
//! These values are illustrative only. Anything built from them is tagged
//! `DataSource::Fallback` and must be presented as sample data.
//! ============================================================================

use std::collections::BTreeMap;

use crate::types::{
    CollectorWorkload, DailyCount, DashboardAnalytics, EwasteAnalytics, Heatmap, HeatmapPoint,
    Leaderboard, LeaderboardEntry, RecordId, ReviewPage,
};

pub fn dashboard_analytics() -> DashboardAnalytics {
    let reports_by_waste_type: BTreeMap<String, u64> = [
        ("plastic", 142),
        ("organic", 96),
        ("paper", 54),
        ("e_waste", 31),
        ("metal", 18),
        ("glass", 12),
    ]
    .into_iter()
    .map(|(k, v)| (k.to_string(), v))
    .collect();

    let daily_reports = [
        ("Mon", 41),
        ("Tue", 52),
        ("Wed", 47),
        ("Thu", 60),
        ("Fri", 55),
        ("Sat", 71),
        ("Sun", 27),
    ]
    .into_iter()
    .map(|(date, count)| DailyCount {
        date: date.to_string(),
        count,
    })
    .collect();

    DashboardAnalytics {
        total_reports: 353,
        active_quests: 48,
        completed_quests: 287,
        total_collectors: 24,
        total_bounty_points: 14_350,
        reports_by_waste_type,
        daily_reports,
    }
}

pub fn heatmap() -> Heatmap {
    let points = [
        (28.6139, 77.2090, 0.9),
        (28.6280, 77.2197, 0.7),
        (28.5921, 77.2307, 0.5),
        (28.6517, 77.1906, 0.4),
        (28.5355, 77.3910, 0.3),
    ]
    .into_iter()
    .map(|(latitude, longitude, intensity)| HeatmapPoint {
        latitude,
        longitude,
        intensity,
        geohash: None,
    })
    .collect();

    Heatmap { points }
}

pub fn leaderboard() -> Leaderboard {
    let entries = [
        ("Sample Collector A", 2_450, 61),
        ("Sample Collector B", 1_980, 47),
        ("Sample Collector C", 1_615, 40),
        ("Sample Collector D", 1_210, 29),
        ("Sample Collector E", 860, 21),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (name, bounty_points, quests_completed))| LeaderboardEntry {
        rank: i as u32 + 1,
        user_id: RecordId::new(format!("sample-{}", i + 1)),
        name: name.to_string(),
        bounty_points,
        quests_completed,
    })
    .collect();

    Leaderboard { entries }
}

pub fn ewaste_analytics() -> EwasteAnalytics {
    EwasteAnalytics {
        total_listings: 126,
        active_listings: 38,
        total_bids: 412,
        accepted_bids: 71,
        total_value: 184_500.0,
        listings_by_device_type: [("laptop", 34), ("phone", 52), ("monitor", 19), ("other", 21)]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect(),
    }
}

pub fn collector_workload() -> CollectorWorkload {
    CollectorWorkload {
        active_quests: 2,
        max_concurrent: 5,
        capacity_remaining: 3,
        completed_last_week: 11,
        status: "available".to_string(),
        fraud_risk_score: 0.0,
    }
}

/// The review queue never shows sample items, only an empty queue
pub fn review_page() -> ReviewPage {
    ReviewPage::default()
}
