//! Mock execution engine and the intraday portfolio state it owns.
//!
//! All mutation of wallets, the open position and the trade log goes through
//! [`ExecutionEngine`]; everything else only reads [`PortfolioState`].

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, info};

use crate::error::DeskError;
use crate::models::{Decision, DecisionResult, Position, Trade, Wallet};

use super::allocator::allocate_quantity;
use super::Settings;

pub const WALLET_A_NAME: &str = "Wallet A";
pub const WALLET_B_NAME: &str = "Wallet B";

/// Intraday state: two wallets, at most one position, the day's trade log.
#[derive(Debug, Clone)]
pub struct PortfolioState {
    wallet_a: Wallet,
    wallet_b: Wallet,
    position: Option<Position>,
    trades: Vec<Trade>,
    equity_peak: Option<Decimal>,
}

impl PortfolioState {
    /// Open both wallets at their configured balances with the peak at current equity.
    pub fn new(settings: &Settings) -> Self {
        let mut state = Self {
            wallet_a: Wallet::new(WALLET_A_NAME, settings.start_balance_a),
            wallet_b: Wallet::new(WALLET_B_NAME, settings.start_balance_b),
            position: None,
            trades: Vec::new(),
            equity_peak: None,
        };
        state.equity_peak = Some(state.equity());
        state
    }

    /// Trading wallet.
    pub fn wallet_a(&self) -> &Wallet {
        &self.wallet_a
    }

    /// Profit vault.
    pub fn wallet_b(&self) -> &Wallet {
        &self.wallet_b
    }

    pub fn position(&self) -> Option<&Position> {
        self.position.as_ref()
    }

    /// Every fill of the day, oldest first.
    pub fn trades(&self) -> &[Trade] {
        &self.trades
    }

    pub fn equity_peak(&self) -> Option<Decimal> {
        self.equity_peak
    }

    /// Combined balance of both wallets.
    pub fn equity(&self) -> Decimal {
        self.wallet_a.balance() + self.wallet_b.balance()
    }

    /// The latest `limit` trades, newest first.
    pub fn recent_trades(&self, limit: usize) -> impl Iterator<Item = &Trade> {
        self.trades.iter().rev().take(limit)
    }

    fn record_trade(&mut self, trade: Trade) {
        self.trades.push(trade);
        let equity = self.equity();
        if self.equity_peak.map_or(true, |peak| equity > peak) {
            self.equity_peak = Some(equity);
        }
    }

    fn reset(&mut self, settings: &Settings) {
        self.wallet_a.reset_day(settings.start_balance_a);
        self.wallet_b.reset_day(settings.start_balance_b);
        self.position = None;
        self.trades.clear();
        self.equity_peak = Some(self.equity());
    }
}

/// Sizes proposals and applies simulated fills to the portfolio it owns.
#[derive(Debug, Clone)]
pub struct ExecutionEngine {
    settings: Settings,
    state: PortfolioState,
}

impl ExecutionEngine {
    /// Create an engine over a freshly opened portfolio.
    pub fn new(settings: Settings) -> Self {
        let state = PortfolioState::new(&settings);
        Self { settings, state }
    }

    pub fn state(&self) -> &PortfolioState {
        &self.state
    }

    /// Choose a side and size for a trade that already cleared the gate.
    pub fn build_decision(&self, ev: Decimal, price: Decimal, probability: Decimal) -> DecisionResult {
        if ev <= Decimal::ZERO || price <= Decimal::ZERO {
            return DecisionResult::no_trade(ev);
        }

        let decision = if probability >= dec!(0.5) {
            Decision::Buy
        } else {
            Decision::Sell
        };
        let quantity = allocate_quantity(
            price,
            self.settings.expected_loss_pct,
            &self.state.wallet_a,
            &self.settings,
        );
        if quantity <= Decimal::ZERO {
            return DecisionResult::no_trade(ev);
        }

        DecisionResult {
            decision,
            quantity,
            expected_value: ev,
        }
    }

    /// Apply a mock fill and book its PnL.
    ///
    /// Gains go to Wallet B, losses are debited from Wallet A. A loss that would
    /// breach Wallet A's floor fails with `InsufficientFloor` and leaves the
    /// state untouched: no wallet change, no position change, no log entry.
    pub fn simulate(
        &mut self,
        decision_result: &DecisionResult,
        price: Decimal,
        probability: Decimal,
    ) -> Result<Trade, DeskError> {
        let quantity = decision_result.quantity;
        let pnl = self.simulate_pnl(decision_result.decision, quantity, price, probability);

        if pnl >= Decimal::ZERO {
            // Only realized profit can enter Wallet B
            self.state.wallet_b.credit(pnl);
        } else {
            self.state.wallet_a.debit(pnl.abs())?;
        }

        let trade = Trade {
            decision: decision_result.decision,
            quantity,
            price,
            pnl,
            timestamp: Utc::now(),
            signal_probability: Some(probability),
        };

        // Positions are replaced per trade; the desk holds at most one
        self.state.position = Position::from_trade(&trade);
        self.state.record_trade(trade.clone());

        info!(
            decision = %trade.decision,
            quantity = %trade.quantity,
            price = %trade.price,
            pnl = %trade.pnl,
            wallet_a = %self.state.wallet_a.balance(),
            wallet_b = %self.state.wallet_b.balance(),
            "Trade simulated"
        );

        Ok(trade)
    }

    /// Move Wallet A above its floor without booking a trade.
    #[cfg(test)]
    pub(crate) fn credit_trading_wallet(&mut self, amount: Decimal) {
        self.state.wallet_a.credit(amount);
    }

    /// Start a new day from the configured opening balances.
    pub fn reset(&mut self) {
        self.state.reset(&self.settings);
        info!(
            wallet_a = %self.state.wallet_a.balance(),
            wallet_b = %self.state.wallet_b.balance(),
            "Day state reset"
        );
    }

    /// Mock PnL from a probability-driven move.
    ///
    /// movement_factor = (p - 0.5) * 2 in [-1, 1], scaled by expected_move_pct
    /// and signed by the side.
    fn simulate_pnl(
        &self,
        decision: Decision,
        quantity: Decimal,
        price: Decimal,
        probability: Decimal,
    ) -> Decimal {
        if decision == Decision::NoTrade || quantity <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let movement_factor = (probability - dec!(0.5)) * dec!(2);
        let move_pct = self.settings.expected_move_pct * movement_factor * decision.direction();
        let pnl = price * quantity * move_pct;
        debug!(movement_factor = %movement_factor, move_pct = %move_pct, pnl = %pnl, "Simulated move");
        pnl
    }
}
