//! Trading desk service.
//!
//! Serializes writes to the portfolio and exposes the three inbound operations:
//! evaluate a signal, read status, reset the day.

mod views;

pub use views::{MetricsView, ResetReport, StatusReport, TradeOutcome, TradeView, WalletView};

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::db::{Journal, JournalEvent};
use crate::error::DeskError;
use crate::metrics::{DrawdownState, MetricsEngine};
use crate::trading::{ExecutionEngine, Settings, Strategy};

const SKIPPED_MESSAGE: &str = "Trade skipped due to guards or insufficient edge";
const EXECUTED_MESSAGE: &str = "Trade executed";
const RESET_MESSAGE: &str = "Day state reset";

/// Shared desk state.
///
/// Lock order is engine first, drawdown second.
pub struct TradingDesk {
    settings: Settings,
    engine: RwLock<ExecutionEngine>,
    drawdown: Mutex<DrawdownState>,
    strategy: Strategy,
    metrics: MetricsEngine,
    journal: Option<Journal>,
}

impl TradingDesk {
    pub fn new(settings: Settings) -> Self {
        Self {
            engine: RwLock::new(ExecutionEngine::new(settings.clone())),
            drawdown: Mutex::new(DrawdownState::default()),
            strategy: Strategy::new(settings.clone()),
            metrics: MetricsEngine::new(),
            journal: None,
            settings,
        }
    }

    /// Send fills and resets to a journal.
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Evaluate a signal and execute it if every guard passes.
    ///
    /// A guard rejection is a normal outcome. Errors are limited to bad input and
    /// a loss that would breach Wallet A's floor.
    pub async fn evaluate(&self, price: Decimal, probability: Decimal) -> Result<TradeOutcome, DeskError> {
        validate_signal(price, probability)?;

        let mut engine = self.engine.write().await;
        let mut drawdown = self.drawdown.lock().await;

        let (metrics, next) = self.metrics.snapshot_portfolio(engine.state(), *drawdown);
        *drawdown = next;

        let evaluation = self.strategy.run(&engine, price, probability, &metrics);
        let proposal = evaluation.result;

        if !proposal.is_actionable() {
            debug!(
                decision = %proposal.decision,
                ev = %proposal.expected_value,
                "Trade skipped"
            );
            let status = self.build_status(&engine, &mut drawdown);
            return Ok(TradeOutcome {
                status,
                decision: proposal.decision,
                quantity: Decimal::ZERO,
                price,
                pnl: Decimal::ZERO,
                message: SKIPPED_MESSAGE.to_string(),
                skip_reason: evaluation.rejection.map(|r| r.to_string()),
            });
        }

        let trade = engine.simulate(&proposal, price, probability)?;

        if let Some(journal) = &self.journal {
            journal.notify(JournalEvent::Fill {
                trade: trade.clone(),
                position: engine.state().position().cloned(),
            });
        }

        let status = self.build_status(&engine, &mut drawdown);
        Ok(TradeOutcome {
            status,
            decision: trade.decision,
            quantity: trade.quantity,
            price: trade.price,
            pnl: trade.pnl,
            message: EXECUTED_MESSAGE.to_string(),
            skip_reason: None,
        })
    }

    /// Wallets, metrics and recent trades. Advances the drawdown state.
    pub async fn status(&self) -> StatusReport {
        let engine = self.engine.read().await;
        let mut drawdown = self.drawdown.lock().await;
        self.build_status(&engine, &mut drawdown)
    }

    /// Start a fresh day from the configured opening balances.
    pub async fn reset_day(&self) -> ResetReport {
        let mut engine = self.engine.write().await;
        engine.reset();

        if let Some(journal) = &self.journal {
            journal.notify(JournalEvent::DayReset {
                start_balance_a: self.settings.start_balance_a,
                start_balance_b: self.settings.start_balance_b,
            });
        }

        let state = engine.state();
        ResetReport {
            message: RESET_MESSAGE.to_string(),
            wallet_a: WalletView::new(state.wallet_a(), &self.settings.currency),
            wallet_b: WalletView::new(state.wallet_b(), &self.settings.currency),
        }
    }

    fn build_status(&self, engine: &ExecutionEngine, drawdown: &mut DrawdownState) -> StatusReport {
        let state = engine.state();
        let (metrics, next) = self.metrics.snapshot_portfolio(state, *drawdown);
        *drawdown = next;

        StatusReport {
            timestamp: Utc::now(),
            trading_allowed: true,
            wallet_a: WalletView::new(state.wallet_a(), &self.settings.currency),
            wallet_b: WalletView::new(state.wallet_b(), &self.settings.currency),
            metrics: MetricsView::new(&metrics, state.wallet_a()),
            recent_trades: state
                .recent_trades(self.settings.recent_trades_limit)
                .map(TradeView::from)
                .collect(),
        }
    }
}

/// Reject a price that is not positive or a probability outside [0, 1].
pub fn validate_signal(price: Decimal, probability: Decimal) -> Result<(), DeskError> {
    if price <= Decimal::ZERO {
        return Err(DeskError::InvalidInput(format!(
            "price must be positive, got {}",
            price
        )));
    }
    if probability < Decimal::ZERO || probability > Decimal::ONE {
        return Err(DeskError::InvalidInput(format!(
            "probability must be within [0, 1], got {}",
            probability
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use crate::models::Decision;
    use rust_decimal_macros::dec;
    use std::sync::Arc;
    use tokio_test::{assert_err, assert_ok};

    fn tradable_settings() -> Settings {
        Settings {
            expected_loss_pct: dec!(0.002),
            ..Default::default()
        }
    }

    async fn cushioned_desk(settings: Settings) -> TradingDesk {
        let desk = TradingDesk::new(settings);
        desk.engine.write().await.credit_trading_wallet(dec!(300));
        desk
    }

    #[tokio::test]
    async fn test_boundary_validation() {
        let desk = TradingDesk::new(Settings::default());

        let err = assert_err!(desk.evaluate(dec!(0), dec!(0.8)).await);
        assert!(matches!(err, DeskError::InvalidInput(_)));
        assert_err!(desk.evaluate(dec!(100), dec!(1.01)).await);
        assert_err!(desk.evaluate(dec!(100), dec!(-0.1)).await);

        assert_ok!(validate_signal(dec!(100), dec!(0)));
        assert_ok!(validate_signal(dec!(100), dec!(1)));
        assert!(desk.status().await.recent_trades.is_empty());
    }

    #[tokio::test]
    async fn test_positive_edge_skipped_at_floor() {
        let desk = TradingDesk::new(Settings::default());

        let outcome = assert_ok!(desk.evaluate(dec!(100), dec!(0.8)).await);
        assert_eq!(outcome.decision, Decision::NoTrade);
        assert_eq!(outcome.quantity, Decimal::ZERO);
        assert_eq!(outcome.pnl, Decimal::ZERO);
        assert_eq!(outcome.price, dec!(100));
        assert_eq!(outcome.message, SKIPPED_MESSAGE);
        assert_eq!(
            outcome.skip_reason.as_deref(),
            Some("risk budget would breach wallet floor")
        );
        assert!(!outcome.executed());
        assert_eq!(outcome.status.wallet_a.current_balance, dec!(100000));
        assert!(outcome.status.recent_trades.is_empty());
    }

    #[tokio::test]
    async fn test_executed_trade_reaches_vault() {
        let desk = cushioned_desk(tradable_settings()).await;

        let outcome = assert_ok!(desk.evaluate(dec!(100), dec!(0.8)).await);
        assert_eq!(outcome.message, EXECUTED_MESSAGE);
        assert_eq!(outcome.decision, Decision::Buy);
        assert_eq!(outcome.quantity, dec!(1253.75));
        // 100 * 1253.75 * (0.005 * 0.6)
        assert_eq!(outcome.pnl, dec!(376.125));

        let status = &outcome.status;
        assert_eq!(status.wallet_a.current_balance, dec!(100300));
        assert_eq!(status.wallet_b.current_balance, dec!(376.125));
        assert_eq!(status.recent_trades.len(), 1);
        assert_eq!(status.recent_trades[0].pnl, dec!(376.125));
        // Notional 125375 exceeds Wallet A
        assert_eq!(status.metrics.net_exposure_percent, 100.0);
        assert_eq!(status.metrics.wcr, 1.0);
    }

    #[tokio::test]
    async fn test_open_exposure_blocks_next_signal() {
        let desk = cushioned_desk(tradable_settings()).await;
        assert_ok!(desk.evaluate(dec!(100), dec!(0.8)).await);

        let outcome = assert_ok!(desk.evaluate(dec!(100), dec!(0.8)).await);
        assert_eq!(outcome.decision, Decision::NoTrade);
        assert_eq!(outcome.skip_reason.as_deref(), Some("exposure limit reached"));
        assert_eq!(outcome.status.recent_trades.len(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_signals_are_serialized() {
        let desk = Arc::new(cushioned_desk(tradable_settings()).await);

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let desk = desk.clone();
                tokio::spawn(async move { desk.evaluate(dec!(100), dec!(0.8)).await })
            })
            .collect();

        let mut executed = 0;
        for handle in handles {
            let outcome = handle.await.unwrap().unwrap();
            if outcome.executed() {
                executed += 1;
            }
        }

        assert_eq!(executed, 1);
        let status = desk.status().await;
        assert_eq!(status.recent_trades.len(), 1);
        assert_eq!(status.wallet_b.current_balance, dec!(376.125));
    }

    #[tokio::test]
    async fn test_repeated_status_has_no_velocity() {
        let desk = TradingDesk::new(Settings::default());
        let first = desk.status().await;
        let second = desk.status().await;

        assert_eq!(second.metrics.drawdown_velocity, 0.0);
        assert_eq!(first.metrics.wcr, second.metrics.wcr);
        assert_eq!(first.metrics.dps, second.metrics.dps);
        assert!(second.trading_allowed);
        assert_eq!(second.wallet_a.currency, "USDT");
    }

    #[tokio::test]
    async fn test_reset_restores_opening_balances() {
        let desk = cushioned_desk(tradable_settings()).await;
        assert_ok!(desk.evaluate(dec!(100), dec!(0.8)).await);

        let report = desk.reset_day().await;
        assert_eq!(report.message, RESET_MESSAGE);
        assert_eq!(report.wallet_a.current_balance, dec!(100000));
        assert_eq!(report.wallet_a.start_balance, dec!(100000));
        assert_eq!(report.wallet_b.current_balance, Decimal::ZERO);

        let status = desk.status().await;
        assert!(status.recent_trades.is_empty());
        assert_eq!(status.metrics.net_exposure_percent, 0.0);
    }

    #[tokio::test]
    async fn test_journal_receives_fills_and_resets() {
        let db = Arc::new(Database::new("sqlite::memory:").await.unwrap());
        let (journal, writer) = Journal::spawn(db.clone());

        let desk = cushioned_desk(tradable_settings()).await.with_journal(journal);
        assert_ok!(desk.evaluate(dec!(100), dec!(0.8)).await);
        // Skipped signals are not journaled
        assert_ok!(desk.evaluate(dec!(100), dec!(0.8)).await);
        desk.reset_day().await;

        drop(desk);
        writer.await.unwrap();

        assert_eq!(db.trade_count().await.unwrap(), 1);
        assert_eq!(db.reset_count().await.unwrap(), 1);
        let trades = db.recent_trades(5).await.unwrap();
        assert_eq!(trades[0].decision, "BUY");
        assert_eq!(trades[0].pnl, 376.125);
    }
}
