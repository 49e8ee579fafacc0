//! Dispute review.

use adminctl_core::api::PageQuery;
use adminctl_core::config::Config;
use anyhow::{Result, bail};

use super::output::{Output, clip, date, or_dash};

pub async fn list(
    config: &Config,
    out: &Output,
    query: PageQuery,
    status: Option<&str>,
) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().list_disputes(query, status).await?;
    out.page(
        &page,
        &["ID", "Job", "Employer", "Worker", "Reason", "Status", "Opened"],
        |dispute| {
            vec![
                dispute.id.to_string(),
                dispute.job_id.to_string(),
                dispute.employer_id.to_string(),
                dispute.worker_id.to_string(),
                clip(&dispute.reason, 40),
                or_dash(Some(dispute.status.as_str())),
                date(&dispute.created_at),
            ]
        },
        "No disputes found.",
    )
}

pub async fn resolve(config: &Config, out: &Output, id: i64, resolution: &str) -> Result<()> {
    if resolution.trim().is_empty() {
        bail!("Resolution cannot be empty");
    }
    let client = super::signed_in(config).await?;
    let reply = client.api().resolve_dispute(id, resolution.trim()).await?;
    out.done(&reply, &format!("Resolved dispute {id}"))
}
