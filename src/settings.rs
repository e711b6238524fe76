use anyhow::{Context, Result};
use serde::Deserialize;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Base URL of the trading backend REST API
    pub api_base_url: String,

    /// Path of the persisted auth token blob
    pub auth_store_path: String,

    /// Minutes after `paidAt` before a dispute may be opened
    pub dispute_grace_minutes: i64,

    /// Minutes the buyer has to pay when the trade carries no `expiresAt`
    pub payment_window_minutes: i64,

    /// Minutes support has to respond after a dispute is opened
    pub support_window_minutes: i64,

    pub request_timeout_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:5000/api".to_string(),
            auth_store_path: "auth.json".to_string(),
            dispute_grace_minutes: 10,
            payment_window_minutes: 30,
            support_window_minutes: 60,
            request_timeout_secs: 30,
        }
    }
}

impl Settings {
    /// Defaults overridden by `P2P_*` environment variables
    pub fn from_env() -> Result<Self> {
        let defaults = Settings::default();

        ::config::Config::builder()
            .set_default("api_base_url", defaults.api_base_url)?
            .set_default("auth_store_path", defaults.auth_store_path)?
            .set_default("dispute_grace_minutes", defaults.dispute_grace_minutes)?
            .set_default("payment_window_minutes", defaults.payment_window_minutes)?
            .set_default("support_window_minutes", defaults.support_window_minutes)?
            .set_default("request_timeout_secs", defaults.request_timeout_secs)?
            .add_source(::config::Environment::with_prefix("P2P").try_parsing(true))
            .build()
            .context("Failed to build configuration")?
            .try_deserialize()
            .context("Invalid configuration")
    }

    pub fn dispute_grace(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.dispute_grace_minutes)
    }

    pub fn payment_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.payment_window_minutes)
    }

    pub fn support_window(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.support_window_minutes)
    }
}
