use tauri::AppHandle;

use crate::models::Feedback;
use crate::state::AppStateExt;
use crate::store::FeedbackStore;

#[tauri::command]
pub fn submit_feedback(app: AppHandle, feedback: Feedback) -> Result<Feedback, String> {
    Ok(crate::feedback::submit_feedback(&app.app_state().db, feedback)?)
}

#[tauri::command]
pub fn get_feedback(app: AppHandle) -> Result<Vec<Feedback>, String> {
    Ok(app.app_state().db.list()?)
}
