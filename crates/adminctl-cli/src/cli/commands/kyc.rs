//! KYC review.

use adminctl_core::api::PageQuery;
use adminctl_core::config::Config;
use adminctl_types::KycDecision;
use anyhow::Result;

use super::output::{Output, date, or_dash};

pub async fn pending(config: &Config, out: &Output, query: PageQuery) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().pending_kyc(query).await?;
    out.page(
        &page,
        &["ID", "User", "Name", "Document", "Submitted"],
        |submission| {
            vec![
                submission.id.to_string(),
                submission.user_id.to_string(),
                or_dash(submission.full_name.as_deref()),
                or_dash(Some(submission.document_type.as_str())),
                date(&submission.submitted_at),
            ]
        },
        "No pending KYC submissions.",
    )
}

pub async fn verify(
    config: &Config,
    out: &Output,
    id: i64,
    decision: KycDecision,
    notes: Option<&str>,
) -> Result<()> {
    let client = super::signed_in(config).await?;
    let reply = client.api().verify_kyc(id, decision, notes).await?;
    let verb = match decision {
        KycDecision::Approved => "Approved",
        KycDecision::Rejected => "Rejected",
    };
    out.done(&reply, &format!("{verb} KYC submission {id}"))
}
