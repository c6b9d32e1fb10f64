use tauri::AppHandle;
use tauri_plugin_dialog::{DialogExt, MessageDialogButtons, MessageDialogKind};
use tokio::sync::oneshot;

use crate::dashboard::DashboardData;
use crate::models::TableBill;
use crate::state::AppStateExt;
use crate::workflow::Approval;

#[tauri::command]
pub fn load_dashboard(app: AppHandle, user_id: String) -> Result<DashboardData, String> {
    Ok(app.app_state().dashboard().load(&user_id)?)
}

#[tauri::command]
pub fn approve_order(app: AppHandle, user_id: String, order_id: i64) -> Result<Approval, String> {
    Ok(app.app_state().dashboard().approve(&user_id, order_id)?)
}

#[tauri::command]
pub fn reject_order(app: AppHandle, user_id: String, order_id: i64) -> Result<(), String> {
    Ok(app.app_state().dashboard().reject(&user_id, order_id)?)
}

#[tauri::command]
pub fn add_item_to_bill(
    app: AppHandle,
    user_id: String,
    table_number: String,
    menu_item_id: i64,
) -> Result<TableBill, String> {
    Ok(app
        .app_state()
        .dashboard()
        .add_item_to_bill(&user_id, &table_number, menu_item_id)?)
}

#[tauri::command]
pub fn remove_item_from_bill(
    app: AppHandle,
    user_id: String,
    table_number: String,
    menu_item_id: i64,
) -> Result<TableBill, String> {
    Ok(app
        .app_state()
        .dashboard()
        .remove_item_from_bill(&user_id, &table_number, menu_item_id)?)
}

/// Asks staff to confirm before closing the bill.
#[tauri::command]
pub async fn mark_bill_as_paid(
    app: AppHandle,
    user_id: String,
    table_number: String,
) -> Result<bool, String> {
    let (tx, rx) = oneshot::channel();
    app.dialog()
        .message(format!("Mark the bill for table {} as paid?", table_number))
        .title("Confirm payment")
        .kind(MessageDialogKind::Warning)
        .buttons(MessageDialogButtons::OkCancel)
        .show(move |confirmed| {
            let _ = tx.send(confirmed);
        });
    let confirmed = rx.await.unwrap_or(false);

    Ok(app
        .app_state()
        .dashboard()
        .mark_bill_as_paid(&user_id, &table_number, confirmed)?)
}
