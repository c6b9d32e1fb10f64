use tauri::AppHandle;

use crate::models::{DailySummary, MenuStats};
use crate::reports::{self, today_local};
use crate::state::AppStateExt;
use crate::store::OrderStore;

#[tauri::command]
pub fn get_menu_stats(app: AppHandle, user_id: String) -> Result<MenuStats, String> {
    Ok(app.app_state().db.menu_stats(&user_id)?)
}

#[tauri::command]
pub fn get_daily_summary(
    app: AppHandle,
    user_id: String,
    date: Option<String>,
) -> Result<DailySummary, String> {
    let date = date.unwrap_or_else(today_local);
    Ok(app.app_state().db.daily_summary(&user_id, &date)?)
}

/// Posts the summary to the staff channel. Defaults to today.
#[tauri::command]
pub async fn send_daily_summary(
    app: AppHandle,
    user_id: String,
    date: Option<String>,
) -> Result<DailySummary, String> {
    let state = app.app_state();
    let date = date.unwrap_or_else(today_local);
    let (summary, notified) =
        reports::send_daily_summary(&state.db, &state.notifier, &user_id, &date).await?;
    if !notified {
        return Err(format!("Summary for {} could not be delivered", date));
    }
    Ok(summary)
}
