//! Badge management.

use adminctl_core::api::PageQuery;
use adminctl_core::config::Config;
use adminctl_types::NewBadge;
use anyhow::Result;

use super::output::{Output, clip, date};

pub async fn list(config: &Config, out: &Output, query: PageQuery) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().list_badges(query).await?;
    out.page(
        &page,
        &["ID", "Name", "Description", "Criteria", "Created"],
        |badge| {
            vec![
                badge.id.to_string(),
                badge.name.clone(),
                clip(&badge.description, 40),
                clip(&badge.criteria, 40),
                date(&badge.created_at),
            ]
        },
        "No badges found.",
    )
}

pub async fn create(config: &Config, out: &Output, badge: &NewBadge) -> Result<()> {
    // Fail on invalid input before touching the session.
    adminctl_core::api::validate_badge(badge)?;

    let client = super::signed_in(config).await?;
    let created = client.api().create_badge(badge).await?;
    if out.is_json() {
        return Output::json(&created);
    }
    println!("✓ Created badge {} (id {})", created.name, created.id);
    Ok(())
}
