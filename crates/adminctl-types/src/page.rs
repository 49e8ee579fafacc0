//! Paginated list envelope.

use serde::{Deserialize, Serialize};

/// One page of a list endpoint.
///
/// Endpoints disagree on the name of the list field (`users`, `jobs`,
/// `disputes`, ...); all of them land in `items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Page<T> {
    #[serde(
        default = "Vec::new",
        alias = "data",
        alias = "users",
        alias = "jobs",
        alias = "disputes",
        alias = "submissions",
        alias = "content",
        alias = "payments",
        alias = "badges",
        alias = "reviews"
    )]
    pub items: Vec<T>,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub page: Option<u64>,
    #[serde(default)]
    pub per_page: Option<u64>,
    #[serde(default)]
    pub total_pages: Option<u64>,
    #[serde(default)]
    pub has_next: Option<bool>,
    #[serde(default)]
    pub has_prev: Option<bool>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            total: 0,
            page: None,
            per_page: None,
            total_pages: None,
            has_next: None,
            has_prev: None,
        }
    }
}

impl<T> Page<T> {
    /// Short footer like `page 2/5 (43 total)`.
    pub fn summary(&self) -> String {
        match (self.page, self.total_pages) {
            (Some(page), Some(pages)) => format!("page {page}/{pages} ({} total)", self.total),
            _ => format!("{} of {} shown", self.items.len(), self.total),
        }
    }
}
