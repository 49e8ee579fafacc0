//! Job browsing.

use adminctl_core::api::{JobFilter, PageQuery};
use adminctl_core::config::Config;
use anyhow::Result;

use super::output::{Output, clip, date, money, or_dash};

pub async fn list(config: &Config, out: &Output, query: PageQuery, filter: &JobFilter) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().list_jobs(query, filter).await?;
    out.page(
        &page,
        &["ID", "Title", "Status", "Budget", "Location", "Posted"],
        |job| {
            vec![
                job.id.to_string(),
                clip(&job.title, 40),
                job.status.to_string(),
                money(job.budget),
                or_dash(job.location.as_deref()),
                date(&job.created_at),
            ]
        },
        "No jobs found.",
    )
}

pub async fn show(config: &Config, out: &Output, id: i64) -> Result<()> {
    let client = super::signed_in(config).await?;
    let job = client.api().get_job(id).await?;
    out.record(
        &job,
        vec![
            ("ID", job.id.to_string()),
            ("Title", job.title.clone()),
            ("Status", job.status.to_string()),
            ("Budget", money(job.budget)),
            ("Employer", job.employer_id.to_string()),
            ("Location", or_dash(job.location.as_deref())),
            ("Location type", or_dash(Some(job.location_type.as_str()))),
            ("Requirements", job.requirements.join(", ")),
            ("High value", job.is_high_value.to_string()),
            ("Escrow required", job.escrow_required.to_string()),
            ("Commission", format!("{:.1}%", job.commission_rate * 100.0)),
            ("Posted", date(&job.created_at)),
            ("Completed", job.completed_at.as_deref().map_or_else(|| "-".to_string(), date)),
            ("Description", job.description.clone()),
        ],
    )
}
