use chrono::Utc;
use tracing::info;

use crate::db::Database;
use crate::error::Result;
use crate::models::Feedback;
use crate::store::FeedbackStore;

const FEEDBACK_KEY: &str = "feedbacks";

impl FeedbackStore for Database {
    fn store(&self, feedback: &Feedback) -> Result<()> {
        let mut all = self.list()?;
        all.push(feedback.clone());
        self.kv_put(FEEDBACK_KEY, &serde_json::to_string(&all)?)
    }

    fn list(&self) -> Result<Vec<Feedback>> {
        match self.kv_get(FEEDBACK_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }
}

/// Validate and keep a diner's rating, stamped with the time received.
pub fn submit_feedback<F: FeedbackStore>(store: &F, mut feedback: Feedback) -> Result<Feedback> {
    feedback.validate()?;
    feedback.submitted_at = Utc::now().to_rfc3339();
    store.store(&feedback)?;
    info!(
        order_id = feedback.order_id,
        rating = feedback.rating,
        "Feedback recorded"
    );
    Ok(feedback)
}
