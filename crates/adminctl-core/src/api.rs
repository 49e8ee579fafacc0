//! Typed admin endpoints.
//!
//! Thin wrappers over [`Gateway`]: each method builds a path (plus query
//! string for list endpoints) and decodes the reply into a wire type.

use std::sync::Arc;

use adminctl_types::{
    AuthUser, Badge, DashboardStats, Dispute, Job, KycDecision, KycSubmission, LoginRequest,
    ModeratedContent, ModerationAction, NewBadge, Page, Payment, PaymentReport, PlatformMetrics,
    Review, TokenPair, User,
};
use anyhow::Result;
use reqwest::Method;
use serde_json::{Value, json};
use thiserror::Error;
use url::form_urlencoded;

use crate::gateway::{Gateway, GatewayError};

/// 1-based page selector, sent as `skip`/`limit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageQuery {
    fn default() -> Self {
        Self { page: 1, limit: 10 }
    }
}

impl PageQuery {
    pub fn new(page: u32, limit: u32) -> Self {
        Self { page, limit }
    }

    /// Items to skip; page 0 is treated as page 1.
    pub fn skip(&self) -> u64 {
        u64::from(self.page.max(1) - 1) * u64::from(self.limit)
    }

    fn pairs(&self) -> [(&'static str, Option<String>); 2] {
        [
            ("skip", Some(self.skip().to_string())),
            ("limit", Some(self.limit.to_string())),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserFilter {
    pub role: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobFilter {
    pub status: Option<String>,
    pub has_dispute: Option<bool>,
    pub search: Option<String>,
}

/// Appends the non-empty pairs to `path` as a query string.
fn with_query(path: &str, pairs: &[(&str, Option<String>)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    let mut any = false;
    for (key, value) in pairs {
        if let Some(value) = value.as_deref().map(str::trim)
            && !value.is_empty()
        {
            serializer.append_pair(key, value);
            any = true;
        }
    }

    if any {
        format!("{path}?{}", serializer.finish())
    } else {
        path.to_string()
    }
}

fn paged(path: &str, query: PageQuery, filters: &[(&str, Option<String>)]) -> String {
    let mut pairs: Vec<(&str, Option<String>)> = query.pairs().to_vec();
    pairs.extend(filters.iter().cloned());
    with_query(path, &pairs)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BadgeValidationError {
    #[error("Badge name must be at least 3 characters")]
    NameTooShort,
    #[error("Description must be at least 10 characters")]
    DescriptionTooShort,
    #[error("Criteria must be at least 10 characters")]
    CriteriaTooShort,
    #[error("Image URL is not a valid URL")]
    InvalidImageUrl,
}

/// Client-side checks applied before `create_badge` sends anything.
///
/// # Errors
/// Returns the first rule the badge breaks.
pub fn validate_badge(badge: &NewBadge) -> Result<(), BadgeValidationError> {
    if badge.name.trim().chars().count() < 3 {
        return Err(BadgeValidationError::NameTooShort);
    }
    if badge.description.trim().chars().count() < 10 {
        return Err(BadgeValidationError::DescriptionTooShort);
    }
    if badge.criteria.trim().chars().count() < 10 {
        return Err(BadgeValidationError::CriteriaTooShort);
    }
    if let Some(url) = badge.image_url.as_deref().map(str::trim)
        && !url.is_empty()
        && url::Url::parse(url).is_err()
    {
        return Err(BadgeValidationError::InvalidImageUrl);
    }
    Ok(())
}

#[derive(Clone)]
pub struct AdminApi {
    gateway: Arc<Gateway>,
}

impl AdminApi {
    pub fn new(gateway: Arc<Gateway>) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &Arc<Gateway> {
        &self.gateway
    }

    // Auth

    /// Exchanges credentials for a token pair. Never sends the stored token.
    ///
    /// # Errors
    /// `Http` if the backend rejects the credentials.
    pub async fn login(&self, identifier: &str, password: &str) -> Result<TokenPair, GatewayError> {
        let body = serde_json::to_value(LoginRequest {
            identifier,
            password,
        })?;
        self.gateway
            .public_json(Method::POST, "/auth/login", Some(&body))
            .await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn get_me(&self) -> Result<AuthUser, GatewayError> {
        self.gateway.get_json("/users/me").await
    }

    // Dashboard

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn dashboard_stats(&self) -> Result<DashboardStats, GatewayError> {
        self.gateway.get_json("/admin/dashboard").await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn metrics(&self) -> Result<PlatformMetrics, GatewayError> {
        self.gateway.get_json("/admin/metrics").await
    }

    /// Metrics restricted to `[start, end]` (`YYYY-MM-DD`).
    ///
    /// # Errors
    /// See [`Gateway::request`].
    pub async fn platform_metrics(
        &self,
        start: &str,
        end: &str,
    ) -> Result<PlatformMetrics, GatewayError> {
        let path = with_query(
            "/admin/metrics",
            &[
                ("start_date", Some(start.to_string())),
                ("end_date", Some(end.to_string())),
            ],
        );
        self.gateway.get_json(&path).await
    }

    // Users

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn list_users(
        &self,
        query: PageQuery,
        filter: &UserFilter,
    ) -> Result<Page<User>, GatewayError> {
        let path = paged(
            "/admin/users",
            query,
            &[
                ("role", filter.role.clone()),
                ("status", filter.status.clone()),
            ],
        );
        self.gateway.get_json(&path).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn get_user(&self, id: i64) -> Result<User, GatewayError> {
        self.gateway.get_json(&format!("/users/{id}")).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn verify_user(&self, id: i64) -> Result<Value, GatewayError> {
        self.gateway
            .send_json(Method::PUT, &format!("/users/{id}/verify"), None)
            .await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn deactivate_user(&self, id: i64) -> Result<Value, GatewayError> {
        self.gateway
            .send_json(Method::PUT, &format!("/users/{id}/deactivate"), None)
            .await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn suspend_user(
        &self,
        id: i64,
        duration_days: u32,
        reason: &str,
    ) -> Result<Value, GatewayError> {
        let body = json!({ "duration_days": duration_days, "reason": reason });
        self.gateway
            .send_json(
                Method::POST,
                &format!("/admin/users/{id}/suspend"),
                Some(&body),
            )
            .await
    }

    // Jobs

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn list_jobs(
        &self,
        query: PageQuery,
        filter: &JobFilter,
    ) -> Result<Page<Job>, GatewayError> {
        let path = paged(
            "/admin/jobs",
            query,
            &[
                ("status", filter.status.clone()),
                ("hasDispute", filter.has_dispute.map(|b| b.to_string())),
                ("search", filter.search.clone()),
            ],
        );
        self.gateway.get_json(&path).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn get_job(&self, id: i64) -> Result<Job, GatewayError> {
        self.gateway.get_json(&format!("/jobs/{id}")).await
    }

    // Disputes

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn list_disputes(
        &self,
        query: PageQuery,
        status: Option<&str>,
    ) -> Result<Page<Dispute>, GatewayError> {
        let path = paged(
            "/admin/disputes",
            query,
            &[("status", status.map(str::to_string))],
        );
        self.gateway.get_json(&path).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn resolve_dispute(&self, id: i64, resolution: &str) -> Result<Value, GatewayError> {
        let body = json!({ "resolution": resolution });
        self.gateway
            .send_json(
                Method::POST,
                &format!("/admin/disputes/{id}/resolve"),
                Some(&body),
            )
            .await
    }

    // KYC

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn pending_kyc(&self, query: PageQuery) -> Result<Page<KycSubmission>, GatewayError> {
        let path = paged("/admin/kyc/pending", query, &[]);
        self.gateway.get_json(&path).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn verify_kyc(
        &self,
        id: i64,
        decision: KycDecision,
        notes: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let body = json!({ "status": decision, "notes": notes });
        self.gateway
            .send_json(Method::POST, &format!("/kyc/{id}/verify"), Some(&body))
            .await
    }

    // Content moderation

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn flagged_content(
        &self,
        query: PageQuery,
        status: Option<&str>,
    ) -> Result<Page<ModeratedContent>, GatewayError> {
        let path = paged(
            "/admin/content-moderation",
            query,
            &[("status", status.map(str::to_string))],
        );
        self.gateway.get_json(&path).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn moderate_content(
        &self,
        id: i64,
        action: ModerationAction,
        reason: Option<&str>,
    ) -> Result<Value, GatewayError> {
        let mut body = json!({ "action": action });
        if let Some(reason) = reason.map(str::trim).filter(|r| !r.is_empty()) {
            body["reason"] = Value::String(reason.to_string());
        }
        self.gateway
            .send_json(
                Method::POST,
                &format!("/admin/content-moderation/{id}/moderate"),
                Some(&body),
            )
            .await
    }

    // Payments

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn payment_history(&self, query: PageQuery) -> Result<Page<Payment>, GatewayError> {
        let path = paged("/payments/history", query, &[]);
        self.gateway.get_json(&path).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn payment_reports(&self) -> Result<Page<PaymentReport>, GatewayError> {
        self.gateway.get_json("/admin/reports/payments").await
    }

    // Reviews and badges

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn list_reviews(&self, query: PageQuery) -> Result<Page<Review>, GatewayError> {
        let path = paged("/admin/reviews", query, &[]);
        self.gateway.get_json(&path).await
    }

    /// # Errors
    /// See [`Gateway::request`].
    pub async fn list_badges(&self, query: PageQuery) -> Result<Page<Badge>, GatewayError> {
        let path = paged("/admin/badges", query, &[]);
        self.gateway.get_json(&path).await
    }

    /// Validates and creates a badge.
    ///
    /// # Errors
    /// A [`BadgeValidationError`] before any request is sent, otherwise a
    /// [`GatewayError`].
    pub async fn create_badge(&self, badge: &NewBadge) -> Result<Badge> {
        validate_badge(badge)?;
        let body = serde_json::to_value(badge).map_err(GatewayError::from)?;
        Ok(self
            .gateway
            .send_json(Method::POST, "/admin/badges", Some(&body))
            .await?)
    }
}
