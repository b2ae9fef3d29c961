use crate::error::{config_error, env_error, RelayResult};
use chrono_tz::Tz;
use dotenvy::dotenv;
use std::env;

/// Default calendar poll interval in seconds
pub const DEFAULT_CHECK_INTERVAL: u64 = 300;

/// Default notification lead time in minutes
pub const DEFAULT_NOTIFICATION_TIME: i64 = 15;

/// Main configuration structure for the relay
#[derive(Debug, Clone)]
pub struct Config {
    /// Initial iCal feed URL, may be absent until an administrator sets one
    pub calendar_url: Option<String>,
    /// Endpoint the delivery sink posts reminder messages to
    pub webhook_url: String,
    /// Seconds between calendar checks
    pub check_interval: u64,
    /// Minutes before an event start during which a reminder is sent
    pub notification_time: i64,
    /// Display timezone for occurrence times
    pub timezone: String,
    /// Path to the subscriber list file
    pub subscribers_file: String,
}

impl Config {
    /// Load configuration from environment and .env file
    pub fn load() -> RelayResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        // Required environment variables
        let webhook_url = env::var("WEBHOOK_URL").map_err(|_| env_error("WEBHOOK_URL"))?;

        // The calendar may be configured later at runtime
        let calendar_url = env::var("CALENDAR_URL").ok();

        // Parse numeric values
        let check_interval = match env::var("CHECK_INTERVAL") {
            Ok(value) => value
                .parse::<u64>()
                .map_err(|_| env_error("Invalid CHECK_INTERVAL format"))?,
            Err(_) => DEFAULT_CHECK_INTERVAL,
        };

        let notification_time = match env::var("NOTIFICATION_TIME") {
            Ok(value) => value
                .parse::<i64>()
                .map_err(|_| env_error("Invalid NOTIFICATION_TIME format"))?,
            Err(_) => DEFAULT_NOTIFICATION_TIME,
        };

        // Default timezone
        let timezone = env::var("TIMEZONE").unwrap_or_else(|_| String::from("UTC"));

        let subscribers_file = env::var("SUBSCRIBERS_FILE")
            .unwrap_or_else(|_| String::from("config/subscribers.toml"));

        Ok(Config {
            calendar_url,
            webhook_url,
            check_interval,
            notification_time,
            timezone,
            subscribers_file,
        })
    }

    /// Resolve the configured timezone name to a chrono-tz timezone
    pub fn display_timezone(&self) -> RelayResult<Tz> {
        self.timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))
    }
}
