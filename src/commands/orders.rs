use tauri::AppHandle;

use crate::models::{PaymentMethod, TableBill};
use crate::payment::{BillSettlement, Screenshot};
use crate::state::AppStateExt;
use crate::store::OrderStore;
use crate::workflow::Submission;

#[tauri::command]
pub async fn place_order(
    app: AppHandle,
    user_id: String,
    table_number: String,
) -> Result<Option<Submission>, String> {
    let state = app.app_state();
    let mut cart = state.take_cart(&user_id, &table_number)?;

    let result = state
        .workflow()
        .submit_order(&user_id, &table_number, &mut cart)
        .await;

    state.put_cart(&user_id, &table_number, cart)?;
    Ok(result?)
}

#[tauri::command]
pub async fn submit_payment(
    app: AppHandle,
    user_id: String,
    table_number: String,
    method: PaymentMethod,
    screenshot: Screenshot,
) -> Result<Option<Submission>, String> {
    let state = app.app_state();
    let mut cart = state.take_cart(&user_id, &table_number)?;

    let result = state
        .workflow()
        .checkout_with_payment(&user_id, &table_number, &mut cart, method, &screenshot)
        .await;

    state.put_cart(&user_id, &table_number, cart)?;
    Ok(result?)
}

#[tauri::command]
pub async fn settle_bill(
    app: AppHandle,
    user_id: String,
    table_number: String,
    method: PaymentMethod,
    screenshot: Screenshot,
) -> Result<BillSettlement, String> {
    Ok(app
        .app_state()
        .workflow()
        .settle_bill(&user_id, &table_number, method, &screenshot)
        .await?)
}

#[tauri::command]
pub fn get_payment_instructions(
    app: AppHandle,
    method: PaymentMethod,
    table_number: String,
) -> Vec<String> {
    app.app_state()
        .config
        .payment
        .instructions(method, &table_number)
}

#[tauri::command]
pub async fn call_waiter(
    app: AppHandle,
    user_id: String,
    table_number: String,
) -> Result<bool, String> {
    Ok(app
        .app_state()
        .workflow()
        .call_waiter(&user_id, &table_number)
        .await?)
}

#[tauri::command]
pub async fn request_bill(
    app: AppHandle,
    user_id: String,
    table_number: String,
) -> Result<bool, String> {
    Ok(app
        .app_state()
        .workflow()
        .request_bill(&user_id, &table_number)
        .await?)
}

#[tauri::command]
pub fn get_table_bill(
    app: AppHandle,
    user_id: String,
    table_number: String,
) -> Result<Option<TableBill>, String> {
    Ok(app.app_state().db.get_table_bill(&user_id, &table_number)?)
}

/// Subscribe the diner view to bill changes for its table. Returns the
/// current bill; later changes arrive as events.
#[tauri::command]
pub fn watch_table_bill(
    app: AppHandle,
    user_id: String,
    table_number: String,
) -> Result<Option<TableBill>, String> {
    let state = app.app_state();
    state.watch_table(&user_id, &table_number)?;
    Ok(state.db.get_table_bill(&user_id, &table_number)?)
}

/// Called when the diner view leaves a table. Stops bill events for it and
/// drops any cart left behind.
#[tauri::command]
pub fn unwatch_table_bill(
    app: AppHandle,
    user_id: String,
    table_number: String,
) -> Result<(), String> {
    Ok(app.app_state().unwatch_table(&user_id, &table_number)?)
}
