//! User management.

use adminctl_core::api::{PageQuery, UserFilter};
use adminctl_core::config::Config;
use anyhow::Result;

use super::output::{Output, date, money, or_dash};

pub async fn list(config: &Config, out: &Output, query: PageQuery, filter: &UserFilter) -> Result<()> {
    let client = super::signed_in(config).await?;
    let page = client.api().list_users(query, filter).await?;
    out.page(
        &page,
        &["ID", "Name", "Email", "Role", "Status", "Joined"],
        |user| {
            vec![
                user.id.to_string(),
                or_dash(Some(user.full_name.as_str())),
                or_dash(Some(user.email.as_str())),
                user.role.to_string(),
                user.status_label(),
                date(&user.created_at),
            ]
        },
        "No users found.",
    )
}

pub async fn show(config: &Config, out: &Output, id: i64) -> Result<()> {
    let client = super::signed_in(config).await?;
    let user = client.api().get_user(id).await?;
    out.record(
        &user,
        vec![
            ("ID", user.id.to_string()),
            ("Name", or_dash(Some(user.full_name.as_str()))),
            ("Email", or_dash(Some(user.email.as_str()))),
            ("Phone", or_dash(user.phone.as_deref())),
            ("Role", user.role.to_string()),
            ("Status", user.status_label()),
            ("Reputation", format!("{:.1}", user.reputation_score)),
            ("Wallet", money(user.wallet_balance)),
            ("Joined", date(&user.created_at)),
            ("Updated", date(&user.updated_at)),
        ],
    )
}

pub async fn verify(config: &Config, out: &Output, id: i64) -> Result<()> {
    let client = super::signed_in(config).await?;
    let reply = client.api().verify_user(id).await?;
    out.done(&reply, &format!("Verified user {id}"))
}

pub async fn deactivate(config: &Config, out: &Output, id: i64) -> Result<()> {
    let client = super::signed_in(config).await?;
    let reply = client.api().deactivate_user(id).await?;
    out.done(&reply, &format!("Deactivated user {id}"))
}

pub async fn suspend(config: &Config, out: &Output, id: i64, days: u32, reason: &str) -> Result<()> {
    let client = super::signed_in(config).await?;
    let reply = client.api().suspend_user(id, days, reason).await?;
    out.done(&reply, &format!("Suspended user {id} for {days} day(s)"))
}
