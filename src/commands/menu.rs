use tauri::AppHandle;

use crate::catalog::{self, MenuCatalog, ALL_CATEGORIES};
use crate::models::{CreateMenuItem, MenuItem, UpdateMenuItem};
use crate::state::AppStateExt;
use crate::store::OrderStore;

#[tauri::command]
pub fn get_menu(
    app: AppHandle,
    user_id: String,
    category: Option<String>,
) -> Result<Vec<MenuItem>, String> {
    let items = app.app_state().db.get_menu_items(&user_id)?;
    let catalog = MenuCatalog::new(items);
    Ok(catalog.filter(category.as_deref().unwrap_or(ALL_CATEGORIES)))
}

#[tauri::command]
pub fn get_menu_categories(app: AppHandle, user_id: String) -> Result<Vec<String>, String> {
    let items = app.app_state().db.get_menu_items(&user_id)?;
    Ok(MenuCatalog::new(items).categories())
}

#[tauri::command]
pub fn open_menu_item(app: AppHandle, user_id: String, id: i64) -> Result<MenuItem, String> {
    Ok(catalog::open_item(&app.app_state().db, &user_id, id)?)
}

#[tauri::command]
pub fn create_menu_item(
    app: AppHandle,
    user_id: String,
    item: CreateMenuItem,
) -> Result<MenuItem, String> {
    Ok(app.app_state().db.create_menu_item(&user_id, &item)?)
}

#[tauri::command]
pub fn update_menu_item(
    app: AppHandle,
    user_id: String,
    item: UpdateMenuItem,
) -> Result<MenuItem, String> {
    Ok(app.app_state().db.update_menu_item(&user_id, &item)?)
}
