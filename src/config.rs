use std::{env, fmt::Display, str::FromStr, time::Duration};

use tracing::{info, warn};

use crate::models::PaymentMethod;

pub const DEFAULT_TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    pub chat_id: String,
    pub api_base: String,
}

/// Where diners send money for each payment method. Shown next to the
/// screenshot upload with the table number as the reference.
#[derive(Debug, Clone)]
pub struct PaymentInstructionsConfig {
    pub bank_account: String,
    pub bank_name: String,
    pub mobile_number: String,
    pub mobile_service: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub telegram: TelegramConfig,
    pub payment: PaymentInstructionsConfig,
    pub default_table_count: u32,
    pub bill_poll_interval: Duration,
    pub database_file: String,
}

impl AppConfig {
    pub fn load() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: var("TELEGRAM_BOT_TOKEN").ok().filter(|t| !t.trim().is_empty()),
                chat_id: try_load("TELEGRAM_CHAT_ID", "0".to_string()),
                api_base: try_load("TELEGRAM_API_BASE", DEFAULT_TELEGRAM_API_BASE.to_string()),
            },
            payment: PaymentInstructionsConfig {
                bank_account: try_load("BANK_ACCOUNT", "123-456-789".to_string()),
                bank_name: try_load("BANK_NAME", "Example Bank".to_string()),
                mobile_number: try_load("MOBILE_MONEY_NUMBER", "+251-912-345-678".to_string()),
                mobile_service: try_load("MOBILE_MONEY_SERVICE", "Telebirr / M-Birr".to_string()),
            },
            default_table_count: try_load("DEFAULT_TABLE_COUNT", 10u32),
            bill_poll_interval: Duration::from_secs(try_load("BILL_POLL_SECS", 30u64)),
            database_file: try_load("DATABASE_FILE", "table_order.db".to_string()),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            telegram: TelegramConfig {
                bot_token: None,
                chat_id: "0".to_string(),
                api_base: DEFAULT_TELEGRAM_API_BASE.to_string(),
            },
            payment: PaymentInstructionsConfig {
                bank_account: "123-456-789".to_string(),
                bank_name: "Example Bank".to_string(),
                mobile_number: "+251-912-345-678".to_string(),
                mobile_service: "Telebirr / M-Birr".to_string(),
            },
            default_table_count: 10,
            bill_poll_interval: Duration::from_secs(30),
            database_file: "table_order.db".to_string(),
        }
    }
}

impl PaymentInstructionsConfig {
    pub fn instructions(&self, method: PaymentMethod, table_number: &str) -> Vec<String> {
        let mut lines = match method {
            PaymentMethod::BankTransfer => vec![
                format!("Account: {}", self.bank_account),
                format!("Bank: {}", self.bank_name),
            ],
            PaymentMethod::MobileMoney => vec![
                format!("Send to: {}", self.mobile_number),
                format!("Service: {}", self.mobile_service),
            ],
        };
        lines.push(format!("Ref: Table {table_number}"));
        lines.push("Upload screenshot after payment".to_string());
        lines
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not set");
    })
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    let Ok(raw) = var(key) else {
        return default;
    };
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            warn!("Invalid {key} value '{raw}': {e}, using default: {default}");
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_instructions_reference_table() {
        let config = AppConfig::default();
        let lines = config.payment.instructions(PaymentMethod::MobileMoney, "7");
        assert_eq!(lines[0], "Send to: +251-912-345-678");
        assert!(lines.contains(&"Ref: Table 7".to_string()));

        let bank = config.payment.instructions(PaymentMethod::BankTransfer, "2");
        assert_eq!(bank[1], "Bank: Example Bank");
    }

    #[test]
    fn test_invalid_value_falls_back_to_default() {
        env::set_var("TABLE_ORDER_TEST_COUNT", "not-a-number");
        let count: u32 = try_load("TABLE_ORDER_TEST_COUNT", 10u32);
        assert_eq!(count, 10);
        env::remove_var("TABLE_ORDER_TEST_COUNT");
    }
}
