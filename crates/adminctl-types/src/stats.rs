//! Dashboard counters and platform metrics.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardStats {
    pub total_users: u64,
    pub new_users_today: u64,
    pub active_users_last_7_days: u64,
    pub active_jobs: u64,
    pub completed_jobs: u64,
    pub total_disputes: u64,
    pub open_disputes: u64,
    pub pending_verifications: u64,
    pub platform_earnings: f64,
    pub platform_earnings_last_7_days: f64,
    pub user_growth_rate: f64,
    pub job_completion_rate: f64,
}

impl DashboardStats {
    /// Label/value pairs in display order.
    pub fn rows(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Total users", self.total_users.to_string()),
            ("New users today", self.new_users_today.to_string()),
            (
                "Active users (7d)",
                self.active_users_last_7_days.to_string(),
            ),
            ("Active jobs", self.active_jobs.to_string()),
            ("Completed jobs", self.completed_jobs.to_string()),
            ("Total disputes", self.total_disputes.to_string()),
            ("Open disputes", self.open_disputes.to_string()),
            (
                "Pending verifications",
                self.pending_verifications.to_string(),
            ),
            ("Platform earnings", format!("{:.2}", self.platform_earnings)),
            (
                "Platform earnings (7d)",
                format!("{:.2}", self.platform_earnings_last_7_days),
            ),
            ("User growth rate", format!("{:.1}%", self.user_growth_rate)),
            (
                "Job completion rate",
                format!("{:.1}%", self.job_completion_rate),
            ),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DailyGrowth {
    pub date: String,
    pub count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserGrowth {
    pub daily_growth: Vec<DailyGrowth>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsMetrics {
    pub completion_rate: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaymentsMetrics {
    pub total_volume: f64,
    pub transaction_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngagementMetrics {
    pub message_count: u64,
    pub review_count: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformMetrics {
    pub user_growth: UserGrowth,
    pub jobs: JobsMetrics,
    pub payments: PaymentsMetrics,
    pub engagement: EngagementMetrics,
}

impl PlatformMetrics {
    /// Sum of daily signups in the window.
    pub fn new_users(&self) -> u64 {
        self.user_growth.daily_growth.iter().map(|d| d.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_metrics_default_missing_sections() {
        let metrics: PlatformMetrics = serde_json::from_str(
            r#"{"user_growth": {"daily_growth": [{"date": "2026-01-01", "count": 3}, {"date": "2026-01-02", "count": 4}]}}"#,
        )
        .unwrap();
        assert_eq!(metrics.new_users(), 7);
        assert_eq!(metrics.payments.transaction_count, 0);
    }

    #[test]
    fn test_dashboard_rows_cover_every_counter() {
        let stats = DashboardStats {
            open_disputes: 4,
            ..Default::default()
        };
        let rows = stats.rows();
        assert_eq!(rows.len(), 12);
        assert!(rows.contains(&("Open disputes", "4".to_string())));
    }
}
