use chrono::Local;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cart::Cart;
use crate::error::{AppError, Result};
use crate::models::{
    round_cents, validate_table_number, validate_tenant, ApprovedOrder, NewPendingOrder,
    OrderPaymentMethod, PendingOrder, ServiceCallKind, TableBill,
};
use crate::notify::{self, Notifier};
use crate::store::OrderStore;

/// A cart that went out to staff as a pending order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub order: PendingOrder,
    /// Whether staff were reached. The order stands either way.
    pub notified: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Approval {
    pub bill: TableBill,
    pub approved: ApprovedOrder,
}

/// Moves orders from a diner's cart through staff approval onto the
/// table's running bill.
pub struct OrderWorkflow<'a, S: OrderStore, N: Notifier> {
    store: &'a S,
    notifier: &'a N,
}

impl<'a, S: OrderStore, N: Notifier> OrderWorkflow<'a, S, N> {
    pub fn new(store: &'a S, notifier: &'a N) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &'a S {
        self.store
    }

    pub fn notifier(&self) -> &'a N {
        self.notifier
    }

    /// Persist the cart as a pending order. `None` for an empty cart.
    /// The cart is left untouched; callers clear it once staff have been told.
    pub(crate) fn place_order(
        &self,
        user_id: &str,
        table_number: &str,
        cart: &Cart,
        payment_method: Option<OrderPaymentMethod>,
    ) -> Result<Option<PendingOrder>> {
        if cart.is_empty() {
            debug!(user_id, table_number, "Ignoring submit of empty cart");
            return Ok(None);
        }
        validate_tenant(user_id)?;
        validate_table_number(table_number)?;

        let order = self.store.add_pending_order(&NewPendingOrder {
            user_id: user_id.to_string(),
            table_number: table_number.to_string(),
            items: cart.items().to_vec(),
            total_amount: round_cents(cart.total_amount()),
            payment_method,
        })?;

        if let Err(e) = self.store.record_item_orders(user_id, &order.items) {
            warn!(order_id = order.id, "Failed to update order counters: {e}");
        }

        info!(
            order_id = order.id,
            user_id,
            table_number,
            total = order.total_amount,
            "Pending order created"
        );
        Ok(Some(order))
    }

    /// Send the cart to staff for approval. Nothing happens for an empty cart.
    pub async fn submit_order(
        &self,
        user_id: &str,
        table_number: &str,
        cart: &mut Cart,
    ) -> Result<Option<Submission>> {
        let Some(order) = self.place_order(user_id, table_number, cart, None)? else {
            return Ok(None);
        };

        let notified = self
            .notifier
            .send_message(&notify::order_message(&order, &Local::now()))
            .await;
        if !notified {
            warn!(order_id = order.id, "Staff were not notified of new order");
        }

        cart.clear();
        Ok(Some(Submission { order, notified }))
    }

    /// Fold a pending order into its table's open bill, opening one if the
    /// table has none.
    pub fn approve(&self, user_id: &str, order_id: i64) -> Result<Approval> {
        let (bill, approved) = self.store.approve_pending_order(user_id, order_id)?;

        info!(
            order_id,
            table_number = %bill.table_number,
            total = bill.total,
            "Order approved"
        );
        Ok(Approval { bill, approved })
    }

    pub fn reject(&self, user_id: &str, order_id: i64) -> Result<()> {
        if !self.store.delete_pending_order(user_id, order_id)? {
            return Err(AppError::not_found(format!("Pending order {}", order_id)));
        }
        info!(order_id, user_id, "Order rejected");
        Ok(())
    }

    pub async fn call_waiter(&self, user_id: &str, table_number: &str) -> Result<bool> {
        self.service_call(user_id, table_number, ServiceCallKind::Waiter)
            .await
    }

    pub async fn request_bill(&self, user_id: &str, table_number: &str) -> Result<bool> {
        self.service_call(user_id, table_number, ServiceCallKind::Bill)
            .await
    }

    async fn service_call(
        &self,
        user_id: &str,
        table_number: &str,
        kind: ServiceCallKind,
    ) -> Result<bool> {
        validate_tenant(user_id)?;
        validate_table_number(table_number)?;

        if let Err(e) = self.store.record_service_call(user_id, table_number, kind) {
            warn!(table_number, %kind, "Failed to record service call: {e}");
        }

        let now = Local::now();
        let message = match kind {
            ServiceCallKind::Waiter => notify::waiter_call_message(table_number, &now),
            ServiceCallKind::Bill => notify::bill_request_message(table_number, &now),
        };

        let notified = self.notifier.send_message(&message).await;
        if !notified {
            warn!(table_number, %kind, "Service call was not delivered");
        }
        Ok(notified)
    }
}
