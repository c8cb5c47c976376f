//! Report shapes returned by the desk, serializable for JSON output.

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

use crate::metrics::MetricSnapshot;
use crate::models::{Decision, Trade, Wallet};

const MOCK_ASSET: &str = "MOCK-ASSET";
const TRADE_TYPE: &str = "MOMENTUM";
const TRADE_STATUS: &str = "CLOSED";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletView {
    pub name: String,
    pub currency: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub current_balance: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub start_balance: Decimal,
}

impl WalletView {
    pub fn new(wallet: &Wallet, currency: &str) -> Self {
        Self {
            name: wallet.name().to_string(),
            currency: currency.to_string(),
            current_balance: wallet.balance(),
            start_balance: wallet.start_of_day(),
        }
    }
}

/// Metrics scaled for display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsView {
    pub wcr: f64,
    /// Daily profit sufficiency in percent, capped at 100
    pub dps: f64,
    pub drawdown_velocity: f64,
    pub net_exposure_percent: f64,
    pub deployed_capital: f64,
}

impl MetricsView {
    pub fn new(metrics: &MetricSnapshot, wallet_a: &Wallet) -> Self {
        let balance = wallet_a.balance().to_f64().unwrap_or(0.0);
        Self {
            wcr: metrics.win_coverage_ratio,
            dps: (metrics.daily_profit_sufficiency * 100.0).min(100.0),
            drawdown_velocity: metrics.drawdown_velocity,
            net_exposure_percent: metrics.net_exposure * 100.0,
            deployed_capital: balance * metrics.net_exposure,
        }
    }
}

/// Row of the recent trades table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeView {
    pub id: String,
    pub time: String,
    pub asset: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub decision: Decision,
    #[serde(with = "rust_decimal::serde::float")]
    pub size: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pnl: Decimal,
    pub status: String,
}

impl From<&Trade> for TradeView {
    fn from(trade: &Trade) -> Self {
        Self {
            id: trade.id(),
            time: trade.timestamp.format("%H:%M:%S").to_string(),
            asset: MOCK_ASSET.to_string(),
            kind: TRADE_TYPE.to_string(),
            decision: trade.decision,
            size: trade.quantity,
            price: trade.price,
            pnl: trade.pnl,
            status: TRADE_STATUS.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub timestamp: DateTime<Utc>,
    pub trading_allowed: bool,
    pub wallet_a: WalletView,
    pub wallet_b: WalletView,
    pub metrics: MetricsView,
    pub recent_trades: Vec<TradeView>,
}

impl std::fmt::Display for StatusReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Desk Status ===")?;
        writeln!(f, "As of:            {}", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC"))?;
        writeln!(f, "Trading Allowed:  {}", if self.trading_allowed { "Yes" } else { "No" })?;
        writeln!(f)?;
        write_wallet(f, &self.wallet_a)?;
        write_wallet(f, &self.wallet_b)?;
        writeln!(f)?;
        writeln!(f, "--- Metrics ---")?;
        writeln!(f, "Win Coverage:     {:.2}", self.metrics.wcr)?;
        writeln!(f, "Profit Target:    {:.1}%", self.metrics.dps)?;
        writeln!(f, "DD Velocity:      {:+.4}", self.metrics.drawdown_velocity)?;
        writeln!(f, "Net Exposure:     {:.1}%", self.metrics.net_exposure_percent)?;
        writeln!(f, "Deployed:         {:.2}", self.metrics.deployed_capital)?;

        writeln!(f, "\n--- Recent Trades ({}) ---", self.recent_trades.len())?;
        if self.recent_trades.is_empty() {
            writeln!(f, "  none")?;
        }
        for trade in &self.recent_trades {
            writeln!(
                f,
                "  {:<18} {} {:<10} {:<8} {:>12.4} @ {:<10.2} P&L {:>+10.4}",
                trade.id, trade.time, trade.asset, trade.decision.as_str(), trade.size, trade.price, trade.pnl
            )?;
        }
        Ok(())
    }
}

fn write_wallet(f: &mut std::fmt::Formatter<'_>, wallet: &WalletView) -> std::fmt::Result {
    writeln!(
        f,
        "{:<17} {:.2} {} (start {:.2})",
        format!("{}:", wallet.name),
        wallet.current_balance,
        wallet.currency,
        wallet.start_balance
    )
}

/// Result of one evaluate call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TradeOutcome {
    pub status: StatusReport,
    pub decision: Decision,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub pnl: Decimal,
    pub message: String,
    /// Guard that blocked the signal, when one did
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip_reason: Option<String>,
}

impl TradeOutcome {
    pub fn executed(&self) -> bool {
        self.decision != Decision::NoTrade
    }
}

impl std::fmt::Display for TradeOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.skip_reason {
            Some(reason) => writeln!(f, "{} ({})", self.message, reason)?,
            None => writeln!(f, "{}", self.message)?,
        }
        writeln!(f, "Decision:  {}", self.decision)?;
        writeln!(f, "Quantity:  {:.4}", self.quantity)?;
        writeln!(f, "Price:     {:.2}", self.price)?;
        writeln!(f, "P&L:       {:+.4}", self.pnl)?;
        write!(f, "{}", self.status)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetReport {
    pub message: String,
    pub wallet_a: WalletView,
    pub wallet_b: WalletView,
}

impl std::fmt::Display for ResetReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.message)?;
        write_wallet(f, &self.wallet_a)?;
        write_wallet(f, &self.wallet_b)
    }
}
