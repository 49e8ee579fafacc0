use adminctl_core::api::PageQuery;
use adminctl_core::config::Config;
use anyhow::Result;

use super::output::{Output, clip, date, or_dash};

pub async fn list(config: &Config, out: &Output, query: PageQuery) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().list_reviews(query).await?;
    out.page(
        &page,
        &["ID", "Rating", "Reviewer", "Reviewee", "Job", "Comment", "Date"],
        |review| {
            vec![
                review.id.to_string(),
                format!("{:.1}", review.rating),
                or_dash(Some(review.reviewer_name.as_str())),
                or_dash(Some(review.reviewee_name.as_str())),
                or_dash(Some(review.job_title.as_str())),
                clip(&review.comment, 40),
                date(&review.created_at),
            ]
        },
        "No reviews found.",
    )
}
