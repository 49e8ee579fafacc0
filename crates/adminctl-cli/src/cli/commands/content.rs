//! Content moderation.

use adminctl_core::api::PageQuery;
use adminctl_core::config::Config;
use adminctl_types::ModerationAction;
use anyhow::Result;

use super::output::{Output, clip, date, or_dash};

pub async fn list(
    config: &Config,
    out: &Output,
    query: PageQuery,
    status: Option<&str>,
) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().flagged_content(query, status).await?;
    out.page(
        &page,
        &["ID", "Type", "Preview", "Reason", "Reporter", "Status", "Flagged"],
        |item| {
            vec![
                item.id.to_string(),
                item.content_type.to_string(),
                clip(&item.content_preview, 40),
                clip(&item.reason, 30),
                or_dash(item.reporter_name.as_deref()),
                or_dash(Some(item.status.as_str())),
                date(&item.created_at),
            ]
        },
        "No flagged content.",
    )
}

pub async fn moderate(
    config: &Config,
    out: &Output,
    id: i64,
    action: ModerationAction,
    reason: Option<&str>,
) -> Result<()> {
    let client = super::signed_in(config).await?;
    let reply = client.api().moderate_content(id, action, reason).await?;
    let verb = match action {
        ModerationAction::Approved => "Approved",
        ModerationAction::Removed => "Removed",
    };
    out.done(&reply, &format!("{verb} content {id}"))
}
