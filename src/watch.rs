use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use crate::models::TableBill;
use crate::store::OrderStore;

/// Event name carrying a [`BillUpdate`] to the diner view.
pub const BILL_UPDATED_EVENT: &str = "table-bill-updated";

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BillUpdate {
    pub user_id: String,
    pub table_number: String,
    /// `None` once the table has no open bill.
    pub bill: Option<TableBill>,
}

/// Tracks the last bill seen for each watched table and reports the ones
/// that changed since.
#[derive(Debug, Default)]
pub struct BillWatch {
    seen: HashMap<(String, String), Option<TableBill>>,
}

impl BillWatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn watch(&mut self, user_id: &str, table_number: &str) {
        self.seen
            .entry((user_id.to_string(), table_number.to_string()))
            .or_insert(None);
    }

    pub fn unwatch(&mut self, user_id: &str, table_number: &str) {
        self.seen
            .remove(&(user_id.to_string(), table_number.to_string()));
    }

    pub fn targets(&self) -> Vec<(String, String)> {
        self.seen.keys().cloned().collect()
    }

    /// Record the current bill for a watched table. Returns an update only
    /// when it differs from the last one recorded.
    pub fn observe(
        &mut self,
        user_id: &str,
        table_number: &str,
        bill: Option<TableBill>,
    ) -> Option<BillUpdate> {
        let previous = self
            .seen
            .get_mut(&(user_id.to_string(), table_number.to_string()))?;
        if *previous == bill {
            return None;
        }
        *previous = bill.clone();

        Some(BillUpdate {
            user_id: user_id.to_string(),
            table_number: table_number.to_string(),
            bill,
        })
    }

    /// Re-read every watched table. A table whose read fails keeps its
    /// previous state and is retried on the next refresh.
    pub fn refresh<S: OrderStore>(&mut self, store: &S) -> Vec<BillUpdate> {
        let mut updates = Vec::new();
        for (user_id, table_number) in self.targets() {
            match store.get_table_bill(&user_id, &table_number) {
                Ok(bill) => {
                    if let Some(update) = self.observe(&user_id, &table_number, bill) {
                        updates.push(update);
                    }
                }
                Err(e) => warn!(user_id, table_number, "Failed to refresh bill: {e}"),
            }
        }
        updates
    }
}

#[cfg(feature = "desktop")]
pub fn spawn_bill_watcher(app: tauri::AppHandle, interval: std::time::Duration) {
    use tauri::Emitter;

    use crate::state::AppStateExt;

    tauri::async_runtime::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;

            let state = app.app_state();
            let updates = match state.watch.lock() {
                Ok(mut watch) => watch.refresh(&state.db),
                Err(e) => {
                    warn!("Bill watch lock poisoned: {e}");
                    continue;
                }
            };

            for update in updates {
                if let Err(e) = app.emit(BILL_UPDATED_EVENT, &update) {
                    warn!(table_number = %update.table_number, "Failed to emit bill update: {e}");
                }
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::OrderItem;

    #[test]
    fn test_observe_reports_only_changes() {
        let mut watch = BillWatch::new();
        watch.watch("tenant", "1");

        assert!(watch.observe("tenant", "1", None).is_none());

        let mut bill = TableBill::new("tenant", "1");
        bill.merge_items(&[OrderItem::new(1, "Soup", 4.0, 1)]).unwrap();

        let update = watch.observe("tenant", "1", Some(bill.clone())).unwrap();
        assert_eq!(update.bill.as_ref(), Some(&bill));
        assert!(watch.observe("tenant", "1", Some(bill)).is_none());

        let cleared = watch.observe("tenant", "1", None).unwrap();
        assert!(cleared.bill.is_none());
    }

    #[test]
    fn test_unwatched_tables_are_ignored() {
        let mut watch = BillWatch::new();
        watch.watch("tenant", "1");
        watch.unwatch("tenant", "1");

        assert!(watch.targets().is_empty());
        assert!(watch
            .observe("tenant", "1", Some(TableBill::new("tenant", "1")))
            .is_none());
    }
}
