//! Payment history and reports.

use adminctl_core::api::PageQuery;
use adminctl_core::config::Config;
use anyhow::Result;

use super::output::{Output, date, money, or_dash};

pub async fn history(config: &Config, out: &Output, query: PageQuery) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().payment_history(query).await?;
    out.page(
        &page,
        &["ID", "Job", "Amount", "Currency", "Status", "Type", "Date"],
        |payment| {
            vec![
                payment.id.to_string(),
                payment
                    .job_id
                    .map_or_else(|| "-".to_string(), |id| id.to_string()),
                money(payment.amount),
                or_dash(payment.currency.as_deref()),
                or_dash(Some(payment.status.as_str())),
                or_dash(payment.payment_type.as_deref()),
                date(&payment.created_at),
            ]
        },
        "No payments found.",
    )
}

pub async fn reports(config: &Config, out: &Output) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().payment_reports().await?;
    out.page(
        &page,
        &["Period", "Volume", "Transactions", "Earnings"],
        |report| {
            vec![
                or_dash(Some(report.period.as_str())),
                money(report.total_volume),
                report.transaction_count.to_string(),
                money(report.platform_earnings),
            ]
        },
        "No payment reports available.",
    )
}
