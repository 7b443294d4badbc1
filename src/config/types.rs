//! Configuration types

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// General application settings
    #[serde(default)]
    pub settings: AppSettings,
    /// Instrument metadata known ahead of time (lot steps, price scales)
    #[serde(default)]
    pub instruments: Vec<InstrumentConfig>,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Buffer size for feed-facing channels
    #[serde(default = "default_channel_size")]
    pub channel_size: usize,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            channel_size: default_channel_size(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_channel_size() -> usize {
    1000
}

/// Exchange-imposed trading constraints for one instrument
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentConfig {
    /// Venue identifier
    pub exchange: String,
    /// Base currency
    pub base: String,
    /// Counter currency
    pub counter: String,
    /// Minimum increment an order amount must be a multiple of;
    /// absent means the venue imposes no stepping
    #[serde(default)]
    pub amount_step_size: Option<Decimal>,
    /// Number of decimal places prices/amounts may be expressed at
    #[serde(default)]
    pub price_scale: Option<u32>,
}
