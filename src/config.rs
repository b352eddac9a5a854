use crate::core::models::money::Currency;
use dotenv::dotenv;
use once_cell::sync::Lazy;
use std::env;
use std::time::Duration;

#[derive(Debug)]
pub struct Config {
    pub port: u16,
    pub log_level: String,
    pub default_currency: Currency,
    pub notification_timeout: Duration,
    /// Largest accepted expense, in major units of the group currency.
    pub max_expense_amount: i64,
}

impl Config {
    fn from_env() -> Self {
        dotenv().ok();

        Self {
            port: env::var("PORT").ok().and_then(|v| v.parse().ok()).unwrap_or(3000),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            default_currency: env::var("DEFAULT_CURRENCY")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or_default(),
            notification_timeout: Duration::from_secs(
                env::var("NOTIFICATION_TIMEOUT_SECS")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(10),
            ),
            max_expense_amount: env::var("MAX_EXPENSE_AMOUNT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(1_000_000),
        }
    }
}

pub static CONFIG: Lazy<Config> = Lazy::new(Config::from_env);
