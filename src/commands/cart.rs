use serde::Serialize;
use tauri::AppHandle;

use crate::cart::Cart;
use crate::catalog::MenuCatalog;
use crate::models::OrderItem;
use crate::state::AppStateExt;
use crate::store::OrderStore;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartView {
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub total_items: u32,
}

impl From<Cart> for CartView {
    fn from(cart: Cart) -> Self {
        Self {
            total_amount: cart.total_amount(),
            total_items: cart.total_items(),
            items: cart.items().to_vec(),
        }
    }
}

#[tauri::command]
pub fn get_cart(app: AppHandle, user_id: String, table_number: String) -> Result<CartView, String> {
    Ok(app.app_state().cart(&user_id, &table_number)?.into())
}

#[tauri::command]
pub fn add_to_cart(
    app: AppHandle,
    user_id: String,
    table_number: String,
    menu_item_id: i64,
    quantity: Option<u32>,
) -> Result<CartView, String> {
    let state = app.app_state();
    let catalog = MenuCatalog::new(state.db.get_menu_items(&user_id)?);
    let item = catalog.orderable(menu_item_id)?;

    let cart = state.update_cart(&user_id, &table_number, |cart| {
        cart.add_quantity(item, quantity.unwrap_or(1))
    })?;
    Ok(cart.into())
}

#[tauri::command]
pub fn update_cart_quantity(
    app: AppHandle,
    user_id: String,
    table_number: String,
    menu_item_id: i64,
    quantity: i64,
) -> Result<CartView, String> {
    let cart = app
        .app_state()
        .update_cart(&user_id, &table_number, |cart| {
            cart.update_quantity(menu_item_id, quantity)
        })?;
    Ok(cart.into())
}

#[tauri::command]
pub fn remove_from_cart(
    app: AppHandle,
    user_id: String,
    table_number: String,
    menu_item_id: i64,
) -> Result<CartView, String> {
    let cart = app
        .app_state()
        .update_cart(&user_id, &table_number, |cart| {
            cart.remove_item(menu_item_id);
            Ok(())
        })?;
    Ok(cart.into())
}

#[tauri::command]
pub fn clear_cart(app: AppHandle, user_id: String, table_number: String) -> Result<(), String> {
    app.app_state().update_cart(&user_id, &table_number, |cart| {
        cart.clear();
        Ok(())
    })?;
    Ok(())
}
