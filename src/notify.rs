use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Local};
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::config::TelegramConfig;
use crate::error::{AppError, Result};
use crate::models::{DailySummary, OrderItem, PaymentMethod, PendingOrder, TableBill};
use crate::payment::Screenshot;

/// Outbound channel to restaurant staff. Delivery is best-effort: both calls
/// report success as a flag and never fail the caller.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> bool;
    async fn send_photo(&self, photo: &Screenshot, caption: &str) -> bool;
}

pub struct TelegramNotifier {
    client: Client,
    config: TelegramConfig,
}

#[derive(Debug, Deserialize)]
struct TelegramResponse {
    ok: bool,
    description: Option<String>,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .connect_timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to create HTTP client: {}", e)))?;

        if config.bot_token.is_none() {
            warn!("TELEGRAM_BOT_TOKEN not set; staff notifications are disabled");
        }

        Ok(Self { client, config })
    }

    fn endpoint(&self, method: &str) -> Option<String> {
        self.config.bot_token.as_ref().map(|token| {
            format!(
                "{}/bot{}/{}",
                self.config.api_base.trim_end_matches('/'),
                token,
                method
            )
        })
    }

    async fn read_ok(response: reqwest::Response, method: &str) -> bool {
        match response.json::<TelegramResponse>().await {
            Ok(body) if body.ok => true,
            Ok(body) => {
                warn!(
                    method,
                    "Telegram rejected request: {}",
                    body.description.unwrap_or_default()
                );
                false
            }
            Err(e) => {
                warn!(method, "Unreadable Telegram response: {e}");
                false
            }
        }
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send_message(&self, text: &str) -> bool {
        let Some(url) = self.endpoint("sendMessage") else {
            debug!("Dropping message, no bot token");
            return false;
        };

        let body = serde_json::json!({
            "chat_id": self.config.chat_id,
            "text": text,
            "parse_mode": "HTML",
        });

        match self.client.post(url).json(&body).send().await {
            Ok(response) => Self::read_ok(response, "sendMessage").await,
            Err(e) => {
                warn!("Error sending Telegram message: {e}");
                false
            }
        }
    }

    async fn send_photo(&self, photo: &Screenshot, caption: &str) -> bool {
        let Some(url) = self.endpoint("sendPhoto") else {
            debug!("Dropping photo, no bot token");
            return false;
        };

        let part = match Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.mime_type)
        {
            Ok(part) => part,
            Err(e) => {
                warn!("Invalid screenshot content type {}: {e}", photo.mime_type);
                return false;
            }
        };

        let form = Form::new()
            .text("chat_id", self.config.chat_id.clone())
            .text("caption", caption.to_string())
            .text("parse_mode", "HTML")
            .part("photo", part);

        match self.client.post(url).multipart(form).send().await {
            Ok(response) => Self::read_ok(response, "sendPhoto").await,
            Err(e) => {
                warn!("Error sending Telegram photo: {e}");
                false
            }
        }
    }
}

/// Escape text for Telegram's HTML parse mode.
pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_time(at: &DateTime<Local>) -> String {
    at.format("%Y-%m-%d %H:%M").to_string()
}

fn item_lines(items: &[OrderItem]) -> String {
    items
        .iter()
        .map(|item| {
            format!(
                "• {} x{} - ${:.2}",
                escape_html(&item.name),
                item.quantity,
                item.total
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn order_message(order: &PendingOrder, at: &DateTime<Local>) -> String {
    format!(
        "🍽️ <b>New Order - Table {}</b>\n\n{}\n\n💰 <b>Total: ${:.2}</b>\n🕐 <b>Time:</b> {}",
        escape_html(&order.table_number),
        item_lines(&order.items),
        order.total_amount,
        format_time(at)
    )
}

pub fn payment_caption(
    table_number: &str,
    items: &[OrderItem],
    total: f64,
    method: PaymentMethod,
    at: &DateTime<Local>,
) -> String {
    format!(
        "💳 <b>Payment Confirmation - Table {}</b>\n\n{}\n\n💰 <b>Total: ${:.2}</b>\n💳 <b>Method:</b> {}\n🕐 <b>Time:</b> {}\n\n📸 <b>Payment Screenshot Attached</b>",
        escape_html(table_number),
        item_lines(items),
        total,
        method.label(),
        format_time(at)
    )
}

pub fn bill_payment_caption(bill: &TableBill, method: PaymentMethod, at: &DateTime<Local>) -> String {
    payment_caption(&bill.table_number, &bill.items, bill.total, method, at)
}

pub fn waiter_call_message(table_number: &str, at: &DateTime<Local>) -> String {
    format!(
        "📞 <b>Table {} is calling the waiter</b>\n🕐 {}",
        escape_html(table_number),
        format_time(at)
    )
}

pub fn bill_request_message(table_number: &str, at: &DateTime<Local>) -> String {
    format!(
        "💸 <b>Table {} is requesting the bill</b>\n🕐 {}",
        escape_html(table_number),
        format_time(at)
    )
}

pub fn daily_summary_message(summary: &DailySummary) -> String {
    let top_items = summary
        .most_ordered_items
        .iter()
        .take(5)
        .enumerate()
        .map(|(index, item)| {
            format!(
                "{}. {} ({} orders)",
                index + 1,
                escape_html(&item.name),
                item.count
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    let most_active = summary
        .most_active_table
        .as_deref()
        .map(escape_html)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "📊 <b>Daily Summary Report</b>\n📅 {}\n\n📈 <b>Orders:</b> {}\n💰 <b>Revenue:</b> ${:.2}\n🏆 <b>Most Active Table:</b> {}\n\n🍽️ <b>Top Ordered Items:</b>\n{}\n\n📞 <b>Waiter Calls:</b> {}\n💸 <b>Bill Requests:</b> {}",
        summary.date,
        summary.total_orders,
        summary.total_revenue,
        most_active,
        top_items,
        summary.waiter_calls,
        summary.bill_requests
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ItemCount, OrderStatus, PaymentStatus};
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local.with_ymd_and_hms(2026, 3, 14, 19, 30, 0).unwrap()
    }

    #[test]
    fn test_order_message_lists_items_and_total() {
        let order = PendingOrder {
            id: 1,
            table_number: "5".to_string(),
            user_id: "tenant".to_string(),
            items: vec![
                OrderItem::new(1, "Fish & Chips", 12.5, 2),
                OrderItem::new(2, "Tea", 1.5, 1),
            ],
            total_amount: 26.5,
            timestamp: String::new(),
            status: OrderStatus::PendingApproval,
            payment_status: PaymentStatus::Pending,
            payment_method: None,
        };

        let message = order_message(&order, &at());
        assert!(message.contains("<b>New Order - Table 5</b>"));
        assert!(message.contains("• Fish &amp; Chips x2 - $25.00"));
        assert!(message.contains("<b>Total: $26.50</b>"));
        assert!(message.contains("2026-03-14 19:30"));
    }

    #[test]
    fn test_payment_caption_names_method() {
        let caption = payment_caption(
            "3",
            &[OrderItem::new(1, "Soup", 4.0, 1)],
            4.0,
            PaymentMethod::MobileMoney,
            &at(),
        );
        assert!(caption.contains("Payment Confirmation - Table 3"));
        assert!(caption.contains("<b>Method:</b> Mobile Money"));
        assert!(caption.contains("Payment Screenshot Attached"));
    }

    #[test]
    fn test_daily_summary_caps_top_items_at_five() {
        let summary = DailySummary {
            date: "2026-03-14".to_string(),
            total_orders: 12,
            total_revenue: 245.5,
            most_ordered_items: (1..=7)
                .map(|i| ItemCount {
                    name: format!("Dish {}", i),
                    count: 10 - i,
                })
                .collect(),
            most_active_table: Some("4".to_string()),
            waiter_calls: 3,
            bill_requests: 2,
        };

        let message = daily_summary_message(&summary);
        assert!(message.contains("5. Dish 5 (5 orders)"));
        assert!(!message.contains("Dish 6"));
        assert!(message.contains("<b>Revenue:</b> $245.50"));
        assert!(message.contains("<b>Most Active Table:</b> 4"));
        assert!(message.contains("<b>Bill Requests:</b> 2"));
    }

    #[tokio::test]
    async fn test_unconfigured_notifier_reports_failure() {
        let notifier = TelegramNotifier::new(TelegramConfig {
            bot_token: None,
            chat_id: "0".to_string(),
            api_base: "http://127.0.0.1:9".to_string(),
        })
        .unwrap();

        assert!(!notifier.send_message("hello").await);
    }
}
