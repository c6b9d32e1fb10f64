use crate::error::Result;
use crate::models::{
    ApprovedOrder, CreateMenuItem, DailySummary, Feedback, MenuItem, MenuStats, NewPendingOrder,
    OrderItem, PendingOrder, ServiceCallKind, TableBill, UpdateMenuItem,
};

/// Backend the ordering workflow reads and writes. Every record is
/// namespaced by tenant (`user_id`).
pub trait OrderStore: Send + Sync {
    fn get_menu_items(&self, user_id: &str) -> Result<Vec<MenuItem>>;
    fn get_menu_item(&self, user_id: &str, id: i64) -> Result<Option<MenuItem>>;
    fn create_menu_item(&self, user_id: &str, item: &CreateMenuItem) -> Result<MenuItem>;
    fn update_menu_item(&self, user_id: &str, item: &UpdateMenuItem) -> Result<MenuItem>;
    fn record_item_view(&self, user_id: &str, id: i64) -> Result<()>;
    fn record_item_orders(&self, user_id: &str, items: &[OrderItem]) -> Result<()>;

    /// Insert a pending order and return it with its generated id.
    fn add_pending_order(&self, order: &NewPendingOrder) -> Result<PendingOrder>;
    fn get_pending_orders(&self, user_id: &str) -> Result<Vec<PendingOrder>>;
    fn get_pending_order(&self, user_id: &str, id: i64) -> Result<Option<PendingOrder>>;
    /// Returns false if no such pending order existed.
    fn delete_pending_order(&self, user_id: &str, id: i64) -> Result<bool>;
    /// Fold a pending order into its table's open bill (opening one if
    /// needed), archive the order and drop it from the pending set, all in
    /// one transaction. NotFound if the order is gone; nothing is written
    /// on error.
    fn approve_pending_order(
        &self,
        user_id: &str,
        order_id: i64,
    ) -> Result<(TableBill, ApprovedOrder)>;

    /// The open bill for a table, if any.
    fn get_table_bill(&self, user_id: &str, table_number: &str) -> Result<Option<TableBill>>;
    fn get_table_bills(&self, user_id: &str) -> Result<Vec<TableBill>>;
    /// Insert or overwrite a bill and its lines; returns the stored bill.
    fn save_table_bill(&self, bill: &TableBill) -> Result<TableBill>;
    /// Returns false if the table had no open bill.
    fn mark_table_bill_paid(&self, user_id: &str, table_number: &str) -> Result<bool>;

    fn record_service_call(
        &self,
        user_id: &str,
        table_number: &str,
        kind: ServiceCallKind,
    ) -> Result<()>;

    fn menu_stats(&self, user_id: &str) -> Result<MenuStats>;
    /// `date` is `YYYY-MM-DD` in local time.
    fn daily_summary(&self, user_id: &str, date: &str) -> Result<DailySummary>;
}

/// Local record of diner feedback.
pub trait FeedbackStore: Send + Sync {
    fn store(&self, feedback: &Feedback) -> Result<()>;
    fn list(&self) -> Result<Vec<Feedback>>;
}
