//! Desk configuration.

use std::str::FromStr;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

/// Prefix for every environment override, e.g. `TRADING_EXPOSURE_LIMIT`.
const ENV_PREFIX: &str = "TRADING_";

/// Configuration for the decision gate, sizing and mock execution.
///
/// The core reads these values as-is; sensible ranges are the caller's concern.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Service name shown by the CLI
    pub app_name: String,

    /// Currency label for wallet views
    pub currency: String,

    /// Fraction of Wallet A allowed to be risked per trade
    pub max_risk_per_trade: Decimal,

    /// Maximum net exposure as a fraction of Wallet A
    pub exposure_limit: f64,

    /// Minimum win coverage ratio once trades have closed
    pub min_wcr: f64,

    /// Assumed favorable move used for EV
    pub expected_gain_pct: Decimal,

    /// Assumed adverse move used for EV and sizing
    pub expected_loss_pct: Decimal,

    /// Typical move magnitude used by mock execution
    pub expected_move_pct: Decimal,

    /// Opening balance for the trading wallet
    pub start_balance_a: Decimal,

    /// Opening balance for the profit vault
    pub start_balance_b: Decimal,

    /// Number of trades shown by status
    pub recent_trades_limit: usize,

    /// SQLite URL for the trade journal; no journal when unset
    pub database_url: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            app_name: "Quant Backend".to_string(),
            currency: "USDT".to_string(),
            max_risk_per_trade: dec!(0.0025), // 0.25% of Wallet A
            exposure_limit: 0.40,             // 40% of Wallet A
            min_wcr: 1.1,
            expected_gain_pct: dec!(0.01),
            expected_loss_pct: dec!(0.01),
            expected_move_pct: dec!(0.005),
            start_balance_a: dec!(100000),
            start_balance_b: Decimal::ZERO,
            recent_trades_limit: 25,
            database_url: None,
        }
    }
}

impl Settings {
    /// Defaults overridden by `.env` and `TRADING_*` variables.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from an arbitrary key lookup (environment, tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut settings = Self::default();
        let get = |field: &str| lookup(&format!("{ENV_PREFIX}{}", field.to_uppercase()));

        if let Some(v) = get("app_name") {
            settings.app_name = v;
        }
        if let Some(v) = get("currency") {
            settings.currency = v;
        }
        override_parsed(&mut settings.max_risk_per_trade, "max_risk_per_trade", get("max_risk_per_trade"))?;
        override_parsed(&mut settings.exposure_limit, "exposure_limit", get("exposure_limit"))?;
        override_parsed(&mut settings.min_wcr, "min_wcr", get("min_wcr"))?;
        override_parsed(&mut settings.expected_gain_pct, "expected_gain_pct", get("expected_gain_pct"))?;
        override_parsed(&mut settings.expected_loss_pct, "expected_loss_pct", get("expected_loss_pct"))?;
        override_parsed(&mut settings.expected_move_pct, "expected_move_pct", get("expected_move_pct"))?;
        override_parsed(&mut settings.start_balance_a, "start_balance_a", get("start_balance_a"))?;
        override_parsed(&mut settings.start_balance_b, "start_balance_b", get("start_balance_b"))?;
        override_parsed(&mut settings.recent_trades_limit, "recent_trades_limit", get("recent_trades_limit"))?;
        if let Some(v) = get("database_url").filter(|v| !v.trim().is_empty()) {
            settings.database_url = Some(v);
        }

        Ok(settings)
    }
}

fn override_parsed<T>(slot: &mut T, field: &str, raw: Option<String>) -> Result<()>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    if let Some(raw) = raw {
        *slot = raw
            .trim()
            .parse()
            .with_context(|| format!("Invalid {ENV_PREFIX}{}: {raw:?}", field.to_uppercase()))?;
    }
    Ok(())
}
