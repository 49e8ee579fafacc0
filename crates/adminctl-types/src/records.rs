//! Marketplace records surfaced by the admin endpoints.

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    Worker,
    Employer,
    Admin,
    #[serde(other)]
    Unknown,
}

impl UserRole {
    pub fn as_str(self) -> &'static str {
        match self {
            UserRole::Worker => "worker",
            UserRole::Employer => "employer",
            UserRole::Admin => "admin",
            UserRole::Unknown => "unknown",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Open,
    InProgress,
    Completed,
    Cancelled,
    Disputed,
    #[serde(other)]
    Unknown,
}

impl JobStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            JobStatus::Open => "open",
            JobStatus::InProgress => "in_progress",
            JobStatus::Completed => "completed",
            JobStatus::Cancelled => "cancelled",
            JobStatus::Disputed => "disputed",
            JobStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Message,
    Job,
    Review,
    Profile,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ContentType::Message => "message",
            ContentType::Job => "job",
            ContentType::Review => "review",
            ContentType::Profile => "profile",
            ContentType::Unknown => "unknown",
        };
        f.write_str(label)
    }
}

/// Outcome an admin records for a KYC submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KycDecision {
    Approved,
    Rejected,
}

/// Outcome an admin records for flagged content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModerationAction {
    Approved,
    Removed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub full_name: String,
    pub role: UserRole,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub is_verified: bool,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub reputation_score: f64,
    #[serde(default)]
    pub wallet_balance: f64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

impl User {
    /// `active`, `inactive`, with a `+verified` suffix when applicable.
    pub fn status_label(&self) -> String {
        let base = if self.is_active { "active" } else { "inactive" };
        if self.is_verified {
            format!("{base}+verified")
        } else {
            base.to_string()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub requirements: Vec<String>,
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub location_type: String,
    pub status: JobStatus,
    #[serde(default)]
    pub employer_id: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub is_high_value: bool,
    #[serde(default)]
    pub escrow_required: bool,
    #[serde(default)]
    pub commission_rate: f64,
    #[serde(default)]
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dispute {
    pub id: i64,
    #[serde(default)]
    pub job_id: i64,
    #[serde(default)]
    pub employer_id: i64,
    #[serde(default)]
    pub worker_id: i64,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub resolution: Option<String>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModeratedContent {
    pub id: i64,
    pub content_type: ContentType,
    #[serde(default)]
    pub content_id: i64,
    #[serde(default)]
    pub content_preview: String,
    #[serde(default)]
    pub reporter_id: Option<i64>,
    #[serde(default)]
    pub reporter_name: Option<String>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub moderated_at: Option<String>,
    #[serde(default)]
    pub moderator_id: Option<i64>,
    #[serde(default)]
    pub moderator_name: Option<String>,
    #[serde(default)]
    pub action_taken: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KycSubmission {
    pub id: i64,
    #[serde(default)]
    pub user_id: i64,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub document_type: String,
    #[serde(default)]
    pub document_url: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub submitted_at: String,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub id: i64,
    #[serde(default)]
    pub job_id: Option<i64>,
    #[serde(default)]
    pub payer_id: Option<i64>,
    #[serde(default)]
    pub payee_id: Option<i64>,
    #[serde(default)]
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub created_at: String,
}

/// Aggregate row from `GET /admin/reports/payments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentReport {
    #[serde(default, alias = "date", alias = "month")]
    pub period: String,
    #[serde(default)]
    pub total_volume: f64,
    #[serde(default)]
    pub transaction_count: u64,
    #[serde(default)]
    pub platform_earnings: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i64,
    #[serde(default)]
    pub rating: f64,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub job_id: i64,
    #[serde(default)]
    pub reviewer_id: i64,
    #[serde(default)]
    pub reviewee_id: i64,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub reviewer_name: String,
    #[serde(default)]
    pub reviewee_name: String,
    #[serde(default)]
    pub job_title: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Badge {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub criteria: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Body of `POST /admin/badges`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBadge {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub criteria: String,
}
