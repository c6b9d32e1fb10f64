use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Tax charged on every table bill, as a fraction of the subtotal.
pub const TAX_RATE: f64 = 0.15;

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn validate_tenant(user_id: &str) -> Result<()> {
    if user_id.trim().is_empty() {
        return Err(AppError::validation("Tenant id is required"));
    }
    Ok(())
}

pub fn validate_table_number(table_number: &str) -> Result<()> {
    if table_number.trim().is_empty() {
        return Err(AppError::validation("Table number is required"));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub available: bool,
    pub preparation_time: i32,
    pub ingredients: Option<String>,
    pub allergens: Option<String>,
    pub popularity_score: f64,
    pub views: i64,
    pub orders: i64,
    pub photo: Option<String>,
    pub last_updated: String,
}

impl MenuItem {
    pub fn validate(&self) -> Result<()> {
        validate_menu_fields(&self.name, self.price, self.preparation_time)
    }
}

fn validate_menu_fields(name: &str, price: f64, preparation_time: i32) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::validation("Menu item name is required"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::validation(format!(
            "Invalid price for {}: {}",
            name, price
        )));
    }
    if preparation_time < 0 {
        return Err(AppError::validation(format!(
            "Invalid preparation time for {}: {}",
            name, preparation_time
        )));
    }
    Ok(())
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct CreateMenuItem {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub available: Option<bool>,
    pub preparation_time: Option<i32>,
    pub ingredients: Option<String>,
    pub allergens: Option<String>,
    pub photo: Option<String>,
}

impl CreateMenuItem {
    pub fn validate(&self) -> Result<()> {
        validate_menu_fields(&self.name, self.price, self.preparation_time.unwrap_or(0))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMenuItem {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub available: bool,
    pub preparation_time: i32,
    pub ingredients: Option<String>,
    pub allergens: Option<String>,
    pub popularity_score: f64,
    pub photo: Option<String>,
}

impl UpdateMenuItem {
    pub fn validate(&self) -> Result<()> {
        validate_menu_fields(&self.name, self.price, self.preparation_time)
    }
}

/// One line of a cart, pending order or bill. `total` is always
/// `price * quantity`; construct through [`OrderItem::new`] or
/// [`OrderItem::set_quantity`] to keep it that way.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
    pub total: f64,
}

impl OrderItem {
    pub fn new(id: i64, name: impl Into<String>, price: f64, quantity: u32) -> Self {
        Self {
            id,
            name: name.into(),
            price,
            quantity,
            total: price * quantity as f64,
        }
    }

    pub fn from_menu_item(item: &MenuItem, quantity: u32) -> Self {
        Self::new(item.id, item.name.clone(), item.price, quantity)
    }

    pub fn set_quantity(&mut self, quantity: u32) {
        self.quantity = quantity;
        self.total = self.price * quantity as f64;
    }

    /// Grow the line by `quantity` units, rejecting a sum that does not fit.
    pub fn add_quantity(&mut self, quantity: u32) -> Result<()> {
        let total = self.quantity.checked_add(quantity).ok_or_else(|| {
            AppError::validation(format!("Quantity for {} is too large", self.name))
        })?;
        self.set_quantity(total);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.quantity < 1 {
            return Err(AppError::validation(format!(
                "Quantity for {} must be at least 1",
                self.name
            )));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(AppError::validation(format!(
                "Invalid price for {}: {}",
                self.name, self.price
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    PendingApproval,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::PendingApproval => "pending_approval",
        }
    }
}

impl FromStr for OrderStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending_approval" => Ok(OrderStatus::PendingApproval),
            other => Err(AppError::validation(format!("Unknown order status: {}", other))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(PaymentStatus::Pending),
            other => Err(AppError::validation(format!("Unknown payment status: {}", other))),
        }
    }
}

/// Method a diner picks in the payment sheet.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    MobileMoney,
}

impl PaymentMethod {
    pub fn label(&self) -> &'static str {
        match self {
            PaymentMethod::BankTransfer => "Bank Transfer",
            PaymentMethod::MobileMoney => "Mobile Money",
        }
    }
}

/// Method recorded on a pending order.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrderPaymentMethod {
    BankTransfer,
    Mobile,
}

impl OrderPaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderPaymentMethod::BankTransfer => "bank_transfer",
            OrderPaymentMethod::Mobile => "mobile",
        }
    }
}

impl From<PaymentMethod> for OrderPaymentMethod {
    fn from(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::BankTransfer => OrderPaymentMethod::BankTransfer,
            PaymentMethod::MobileMoney => OrderPaymentMethod::Mobile,
        }
    }
}

impl FromStr for OrderPaymentMethod {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "bank_transfer" => Ok(OrderPaymentMethod::BankTransfer),
            "mobile" => Ok(OrderPaymentMethod::Mobile),
            other => Err(AppError::validation(format!(
                "Unknown payment method: {}",
                other
            ))),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct NewPendingOrder {
    pub user_id: String,
    pub table_number: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub payment_method: Option<OrderPaymentMethod>,
}

impl NewPendingOrder {
    pub fn validate(&self) -> Result<()> {
        validate_tenant(&self.user_id)?;
        validate_table_number(&self.table_number)?;
        if self.items.is_empty() {
            return Err(AppError::validation("Order has no items"));
        }
        for item in &self.items {
            item.validate()?;
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PendingOrder {
    pub id: i64,
    pub table_number: String,
    pub user_id: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub timestamp: String,
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
    pub payment_method: Option<OrderPaymentMethod>,
}

/// A pending order after staff approval, kept for reporting.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ApprovedOrder {
    pub id: i64,
    pub table_number: String,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub timestamp: String,
    pub approved_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Open,
    Paid,
}

impl BillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Open => "open",
            BillStatus::Paid => "paid",
        }
    }
}

impl FromStr for BillStatus {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "open" => Ok(BillStatus::Open),
            "paid" => Ok(BillStatus::Paid),
            other => Err(AppError::validation(format!("Unknown bill status: {}", other))),
        }
    }
}

/// Running bill for one table. `id` is `None` until the bill is first saved.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableBill {
    pub id: Option<i64>,
    pub user_id: String,
    pub table_number: String,
    pub items: Vec<OrderItem>,
    pub subtotal: f64,
    pub tax: f64,
    pub total: f64,
    pub status: BillStatus,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl TableBill {
    pub fn new(user_id: impl Into<String>, table_number: impl Into<String>) -> Self {
        Self {
            id: None,
            user_id: user_id.into(),
            table_number: table_number.into(),
            items: Vec::new(),
            subtotal: 0.0,
            tax: 0.0,
            total: 0.0,
            status: BillStatus::Open,
            created_at: None,
            updated_at: None,
        }
    }

    /// Append items, combining quantities for lines with the same id, then
    /// recompute totals from the resulting lines. On overflow the bill is
    /// left as it was.
    pub fn merge_items(&mut self, items: &[OrderItem]) -> Result<()> {
        let mut merged = self.items.clone();
        for item in items {
            match merged.iter_mut().find(|line| line.id == item.id) {
                Some(line) => line.add_quantity(item.quantity)?,
                None => merged.push(OrderItem::new(
                    item.id,
                    item.name.clone(),
                    item.price,
                    item.quantity,
                )),
            }
        }
        self.items = merged;
        self.recompute();
        Ok(())
    }

    /// Drop the whole line for `item_id`. Returns false if there was none.
    pub fn remove_line(&mut self, item_id: i64) -> bool {
        let before = self.items.len();
        self.items.retain(|line| line.id != item_id);
        let removed = self.items.len() != before;
        if removed {
            self.recompute();
        }
        removed
    }

    /// Tax is always taken from the current subtotal, never accumulated.
    pub fn recompute(&mut self) {
        let subtotal: f64 = self.items.iter().map(|item| item.total).sum();
        self.subtotal = round_cents(subtotal);
        self.tax = round_cents(self.subtotal * TAX_RATE);
        self.total = round_cents(self.subtotal + self.tax);
    }

    pub fn is_open(&self) -> bool {
        self.status == BillStatus::Open
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PopularItem {
    pub id: i64,
    pub name: String,
    pub orders: i64,
    pub views: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyRevenue {
    pub month: String,
    pub revenue: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuStats {
    pub total_revenue: f64,
    pub total_orders: i64,
    pub total_views: i64,
    pub popular_items: Vec<PopularItem>,
    pub recent_orders: Vec<ApprovedOrder>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ServiceCallKind {
    Waiter,
    Bill,
}

impl ServiceCallKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceCallKind::Waiter => "waiter",
            ServiceCallKind::Bill => "bill",
        }
    }
}

impl FromStr for ServiceCallKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "waiter" => Ok(ServiceCallKind::Waiter),
            "bill" => Ok(ServiceCallKind::Bill),
            other => Err(AppError::validation(format!("Unknown service call: {}", other))),
        }
    }
}

impl fmt::Display for ServiceCallKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ItemCount {
    pub name: String,
    pub count: i64,
}

/// Counts for one day of service, reported to the staff channel.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailySummary {
    pub date: String,
    pub total_orders: i64,
    pub total_revenue: f64,
    pub most_ordered_items: Vec<ItemCount>,
    pub most_active_table: Option<String>,
    pub waiter_calls: i64,
    pub bill_requests: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub order_id: i64,
    pub table_number: String,
    pub rating: u8,
    pub comment: Option<String>,
    #[serde(default)]
    pub submitted_at: String,
}

impl Feedback {
    pub fn validate(&self) -> Result<()> {
        validate_table_number(&self.table_number)?;
        if !(1..=5).contains(&self.rating) {
            return Err(AppError::validation(format!(
                "Rating must be between 1 and 5, got {}",
                self.rating
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bill_tax_from_subtotal() {
        let mut bill = TableBill::new("tenant", "1");
        bill.merge_items(&[OrderItem::new(1, "Burger", 10.0, 2)]).unwrap();

        assert!((bill.subtotal - 20.0).abs() < 0.001);
        assert!((bill.tax - 3.0).abs() < 0.001);
        assert!((bill.total - 23.0).abs() < 0.001);
    }

    #[test]
    fn test_merge_combines_matching_ids() {
        let mut bill = TableBill::new("tenant", "1");
        bill.merge_items(&[OrderItem::new(1, "Burger", 10.0, 1)]).unwrap();
        bill.merge_items(&[
            OrderItem::new(1, "Burger", 10.0, 2),
            OrderItem::new(2, "Soda", 2.5, 2),
        ])
        .unwrap();

        assert_eq!(bill.items.len(), 2);
        assert_eq!(bill.items[0].quantity, 3);
        assert!((bill.items[0].total - 30.0).abs() < 0.001);
        assert!((bill.subtotal - 35.0).abs() < 0.001);
        assert!((bill.tax - 5.25).abs() < 0.001);
        assert!((bill.total - 40.25).abs() < 0.001);
    }

    #[test]
    fn test_remove_line_drops_whole_line() {
        let mut bill = TableBill::new("tenant", "4");
        bill.merge_items(&[
            OrderItem::new(1, "Burger", 10.0, 3),
            OrderItem::new(2, "Soda", 2.0, 1),
        ])
        .unwrap();

        assert!(bill.remove_line(1));
        assert_eq!(bill.items.len(), 1);
        assert!((bill.subtotal - 2.0).abs() < 0.001);
        assert!(!bill.remove_line(1));
    }

    #[test]
    fn test_merge_overflow_leaves_bill_unchanged() {
        let mut bill = TableBill::new("tenant", "1");
        bill.merge_items(&[OrderItem::new(1, "Burger", 10.0, u32::MAX)])
            .unwrap();
        let before = bill.clone();

        let result = bill.merge_items(&[
            OrderItem::new(2, "Soda", 2.0, 1),
            OrderItem::new(1, "Burger", 10.0, 1),
        ]);

        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(bill, before);
    }

    #[test]
    fn test_order_item_validation() {
        assert!(OrderItem::new(1, "Tea", 1.5, 0).validate().is_err());
        assert!(OrderItem::new(1, "Tea", -1.0, 1).validate().is_err());
        assert!(OrderItem::new(1, "Tea", 1.5, 1).validate().is_ok());
    }

    #[test]
    fn test_payment_method_wire_names() {
        let json = serde_json::to_string(&PaymentMethod::MobileMoney).unwrap();
        assert_eq!(json, "\"mobile_money\"");
        assert_eq!(
            OrderPaymentMethod::from(PaymentMethod::MobileMoney).as_str(),
            "mobile"
        );
        assert!("cash".parse::<OrderPaymentMethod>().is_err());
    }
}
