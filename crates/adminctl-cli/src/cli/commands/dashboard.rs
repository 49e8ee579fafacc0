//! Dashboard counters and platform metrics.

use adminctl_core::config::Config;
use anyhow::{Context, Result, bail};
use chrono::NaiveDate;

use super::output::{Output, money, table};

pub async fn stats(config: &Config, out: &Output) -> Result<()> {
    let client = super::signed_in(config).await?;
    let stats = client.api().dashboard_stats().await?;
    out.record(&stats, stats.rows())
}

fn parse_date(value: &str, flag: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
        .with_context(|| format!("{flag} must be a date like 2026-01-31, got '{value}'"))
}

pub async fn metrics(
    config: &Config,
    out: &Output,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<()> {
    let range = match (start, end) {
        (Some(start), Some(end)) => {
            if parse_date(start, "--start")? > parse_date(end, "--end")? {
                bail!("--start must not be after --end");
            }
            Some((start.trim(), end.trim()))
        }
        _ => None,
    };

    let client = super::signed_in(config).await?;
    let metrics = match range {
        Some((start, end)) => client.api().platform_metrics(start, end).await?,
        None => client.api().metrics().await?,
    };

    if out.is_json() {
        return Output::json(&metrics);
    }

    out.record(
        &metrics,
        vec![
            ("New users", metrics.new_users().to_string()),
            (
                "Job completion rate",
                format!("{:.1}%", metrics.jobs.completion_rate),
            ),
            ("Payment volume", money(metrics.payments.total_volume)),
            (
                "Transactions",
                metrics.payments.transaction_count.to_string(),
            ),
            ("Messages", metrics.engagement.message_count.to_string()),
            ("Reviews", metrics.engagement.review_count.to_string()),
        ],
    )?;

    let daily = &metrics.user_growth.daily_growth;
    if !daily.is_empty() {
        let rows: Vec<Vec<String>> = daily
            .iter()
            .map(|day| vec![day.date.clone(), day.count.to_string()])
            .collect();
        println!("{}", table(&["Date", "New users"], &rows));
    }
    Ok(())
}
