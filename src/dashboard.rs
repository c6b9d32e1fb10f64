use serde::Serialize;
use tracing::info;

use crate::error::{AppError, Result};
use crate::models::{
    validate_table_number, MenuItem, MenuStats, OrderItem, PendingOrder, TableBill,
};
use crate::notify::Notifier;
use crate::store::OrderStore;
use crate::workflow::{Approval, OrderWorkflow};

/// Everything the staff screen shows for one tenant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub stats: MenuStats,
    pub pending_orders: Vec<PendingOrder>,
    pub table_bills: Vec<TableBill>,
    pub menu_items: Vec<MenuItem>,
    pub tables: Vec<String>,
}

pub struct Dashboard<'a, S: OrderStore, N: Notifier> {
    workflow: OrderWorkflow<'a, S, N>,
    default_table_count: u32,
}

impl<'a, S: OrderStore, N: Notifier> Dashboard<'a, S, N> {
    pub fn new(store: &'a S, notifier: &'a N, default_table_count: u32) -> Self {
        Self {
            workflow: OrderWorkflow::new(store, notifier),
            default_table_count,
        }
    }

    fn store(&self) -> &'a S {
        self.workflow.store()
    }

    pub fn load(&self, user_id: &str) -> Result<DashboardData> {
        let store = self.store();
        let table_bills = store.get_table_bills(user_id)?;
        let tables = table_numbers(&table_bills, self.default_table_count);

        Ok(DashboardData {
            stats: store.menu_stats(user_id)?,
            pending_orders: store.get_pending_orders(user_id)?,
            menu_items: store.get_menu_items(user_id)?,
            table_bills,
            tables,
        })
    }

    pub fn approve(&self, user_id: &str, order_id: i64) -> Result<Approval> {
        self.workflow.approve(user_id, order_id)
    }

    pub fn reject(&self, user_id: &str, order_id: i64) -> Result<()> {
        self.workflow.reject(user_id, order_id)
    }

    /// Add one unit of a menu item straight onto a table's bill, opening a
    /// bill if the table has none.
    pub fn add_item_to_bill(
        &self,
        user_id: &str,
        table_number: &str,
        menu_item_id: i64,
    ) -> Result<TableBill> {
        validate_table_number(table_number)?;
        let store = self.store();

        let item = store
            .get_menu_item(user_id, menu_item_id)?
            .ok_or_else(|| AppError::not_found(format!("Menu item {}", menu_item_id)))?;
        if !item.available {
            return Err(AppError::validation(format!(
                "{} is currently unavailable",
                item.name
            )));
        }

        let mut bill = store
            .get_table_bill(user_id, table_number)?
            .unwrap_or_else(|| TableBill::new(user_id, table_number));
        bill.merge_items(&[OrderItem::from_menu_item(&item, 1)])?;

        let saved = store.save_table_bill(&bill)?;
        info!(table_number, item = %item.name, total = saved.total, "Item added to bill");
        Ok(saved)
    }

    /// Remove a whole line from a table's bill.
    pub fn remove_item_from_bill(
        &self,
        user_id: &str,
        table_number: &str,
        menu_item_id: i64,
    ) -> Result<TableBill> {
        let store = self.store();
        let mut bill = store
            .get_table_bill(user_id, table_number)?
            .ok_or_else(|| AppError::not_found(format!("Open bill for table {}", table_number)))?;

        if !bill.remove_line(menu_item_id) {
            return Err(AppError::not_found(format!(
                "Item {} on table {} bill",
                menu_item_id, table_number
            )));
        }

        let saved = store.save_table_bill(&bill)?;
        info!(table_number, menu_item_id, total = saved.total, "Item removed from bill");
        Ok(saved)
    }

    /// Close the table's bill once staff confirm it has been paid. Returns
    /// false without touching anything when not confirmed.
    pub fn mark_bill_as_paid(
        &self,
        user_id: &str,
        table_number: &str,
        confirmed: bool,
    ) -> Result<bool> {
        if !confirmed {
            return Ok(false);
        }
        if !self.store().mark_table_bill_paid(user_id, table_number)? {
            return Err(AppError::not_found(format!(
                "Open bill for table {}",
                table_number
            )));
        }
        info!(user_id, table_number, "Bill marked as paid");
        Ok(true)
    }
}

/// Tables the staff screen lists: `1..=default_count` plus any table with
/// an open bill. Numeric tables come first in numeric order, the rest
/// follow sorted as text. Codes are listed exactly as stored.
pub fn table_numbers(bills: &[TableBill], default_count: u32) -> Vec<String> {
    let mut numeric: Vec<(u64, String)> = (1..=u64::from(default_count))
        .map(|n| (n, n.to_string()))
        .collect();
    let mut named: Vec<String> = Vec::new();

    for bill in bills {
        match bill.table_number.parse::<u64>() {
            Ok(n) => numeric.push((n, bill.table_number.clone())),
            Err(_) => named.push(bill.table_number.clone()),
        }
    }

    numeric.sort_unstable();
    numeric.dedup();
    named.sort();
    named.dedup();

    numeric
        .into_iter()
        .map(|(_, code)| code)
        .chain(named)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bill(table: &str) -> TableBill {
        TableBill::new("tenant", table)
    }

    #[test]
    fn test_table_numbers_defaults() {
        assert_eq!(table_numbers(&[], 3), vec!["1", "2", "3"]);
        assert!(table_numbers(&[], 0).is_empty());
    }

    #[test]
    fn test_table_numbers_numeric_before_named() {
        let bills = vec![bill("Patio"), bill("12"), bill("2"), bill("Bar")];
        assert_eq!(
            table_numbers(&bills, 3),
            vec!["1", "2", "3", "12", "Bar", "Patio"]
        );
    }

    #[test]
    fn test_table_numbers_keep_stored_codes() {
        let bills = vec![bill("01"), bill("2"), bill("10")];
        assert_eq!(
            table_numbers(&bills, 2),
            vec!["01", "1", "2", "10"]
        );
    }
}
