use chrono::Local;
use tracing::{info, warn};

use crate::error::Result;
use crate::models::{validate_tenant, DailySummary};
use crate::notify::{self, Notifier};
use crate::store::OrderStore;

/// Today's date in local time, as `YYYY-MM-DD`.
pub fn today_local() -> String {
    Local::now().format("%Y-%m-%d").to_string()
}

/// Build the day's summary and post it to the staff channel. The summary is
/// returned even when delivery fails.
pub async fn send_daily_summary<S: OrderStore, N: Notifier>(
    store: &S,
    notifier: &N,
    user_id: &str,
    date: &str,
) -> Result<(DailySummary, bool)> {
    validate_tenant(user_id)?;
    let summary = store.daily_summary(user_id, date)?;

    let notified = notifier
        .send_message(&notify::daily_summary_message(&summary))
        .await;
    if notified {
        info!(user_id, date, orders = summary.total_orders, "Daily summary sent");
    } else {
        warn!(user_id, date, "Daily summary was not delivered");
    }

    Ok((summary, notified))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_today_local_format() {
        let today = today_local();
        assert_eq!(today.len(), 10);
        assert!(chrono::NaiveDate::parse_from_str(&today, "%Y-%m-%d").is_ok());
    }
}
