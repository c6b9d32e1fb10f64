use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cart::Cart;
use crate::error::{AppError, Result};
use crate::models::{validate_table_number, validate_tenant, PaymentMethod};
use crate::notify::{self, Notifier};
use crate::store::OrderStore;
use crate::workflow::{OrderWorkflow, Submission};

/// Upload limit for payment screenshots.
pub const MAX_SCREENSHOT_BYTES: usize = 10 * 1024 * 1024;

/// A payment screenshot picked by the diner.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Screenshot {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl Screenshot {
    pub fn validate(&self) -> Result<()> {
        if !self.mime_type.starts_with("image/") {
            return Err(AppError::validation(format!(
                "Screenshot must be an image, got {}",
                self.mime_type
            )));
        }
        if self.bytes.is_empty() {
            return Err(AppError::validation("Screenshot file is empty"));
        }
        if self.bytes.len() > MAX_SCREENSHOT_BYTES {
            return Err(AppError::validation(format!(
                "Screenshot is {} bytes, the limit is {}",
                self.bytes.len(),
                MAX_SCREENSHOT_BYTES
            )));
        }
        Ok(())
    }
}

/// Result of sending a payment confirmation for a table's open bill.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSettlement {
    pub table_number: String,
    pub total: f64,
    pub notified: bool,
}

impl<'a, S: OrderStore, N: Notifier> OrderWorkflow<'a, S, N> {
    /// Submit the cart as a pending order that already carries a payment
    /// screenshot. Staff get the screenshot instead of the plain order text.
    /// An empty cart is a no-op whatever the screenshot.
    pub async fn checkout_with_payment(
        &self,
        user_id: &str,
        table_number: &str,
        cart: &mut Cart,
        method: PaymentMethod,
        screenshot: &Screenshot,
    ) -> Result<Option<Submission>> {
        if cart.is_empty() {
            return Ok(None);
        }
        screenshot.validate()?;

        let Some(order) = self.place_order(user_id, table_number, cart, Some(method.into()))? else {
            return Ok(None);
        };

        let caption =
            notify::payment_caption(&order.table_number, &order.items, order.total_amount, method, &Local::now());
        let notified = self.notifier().send_photo(screenshot, &caption).await;
        if !notified {
            warn!(order_id = order.id, "Payment confirmation was not delivered to staff");
        }

        cart.clear();
        Ok(Some(Submission { order, notified }))
    }

    /// Send a payment screenshot for the table's existing bill. No new order
    /// is created and the bill stays open until staff mark it paid.
    pub async fn settle_bill(
        &self,
        user_id: &str,
        table_number: &str,
        method: PaymentMethod,
        screenshot: &Screenshot,
    ) -> Result<BillSettlement> {
        validate_tenant(user_id)?;
        validate_table_number(table_number)?;
        screenshot.validate()?;

        let bill = self
            .store()
            .get_table_bill(user_id, table_number)?
            .ok_or_else(|| AppError::not_found(format!("Open bill for table {}", table_number)))?;

        let caption = notify::bill_payment_caption(&bill, method, &Local::now());
        let notified = self.notifier().send_photo(screenshot, &caption).await;
        if notified {
            info!(user_id, table_number, "Bill payment confirmation sent");
        } else {
            warn!(user_id, table_number, "Bill payment confirmation was not delivered");
        }

        Ok(BillSettlement {
            table_number: bill.table_number,
            total: bill.total,
            notified,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn screenshot(mime_type: &str, len: usize) -> Screenshot {
        Screenshot {
            file_name: "receipt.png".to_string(),
            mime_type: mime_type.to_string(),
            bytes: vec![0u8; len],
        }
    }

    #[test]
    fn test_screenshot_must_be_image() {
        assert!(screenshot("image/png", 10).validate().is_ok());
        assert!(screenshot("image/jpeg", 10).validate().is_ok());
        assert!(matches!(
            screenshot("application/pdf", 10).validate(),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_screenshot_size_bounds() {
        assert!(screenshot("image/png", 0).validate().is_err());
        assert!(screenshot("image/png", MAX_SCREENSHOT_BYTES).validate().is_ok());
        assert!(screenshot("image/png", MAX_SCREENSHOT_BYTES + 1).validate().is_err());
    }
}
