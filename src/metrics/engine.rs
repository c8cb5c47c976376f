//! Point-in-time health metrics for the desk.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::{Position, Trade, Wallet};
use crate::trading::{calculate_net_exposure, win_coverage_ratio, PortfolioState};

/// Daily profit target as a fraction of Wallet A's start-of-day balance.
const DAILY_PROFIT_TARGET_PCT: Decimal = dec!(0.005);

/// Metrics exposed to the decision gate and the status view.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub win_coverage_ratio: f64,
    pub daily_profit_sufficiency: f64,
    pub net_exposure: f64,
    pub drawdown_velocity: f64,
}

/// Last drawdown observed by a snapshot.
///
/// Each snapshot consumes the previous state and hands back the next one, so two
/// snapshots over unchanged wallets report a velocity of zero the second time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DrawdownState {
    pub last_drawdown: f64,
}

/// Calculator for the desk's health metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsEngine;

impl MetricsEngine {
    pub fn new() -> Self {
        Self
    }

    /// Compute all metrics from explicit inputs.
    pub fn snapshot<'a, I>(
        &self,
        wallet_a: &Wallet,
        wallet_b: &Wallet,
        positions: I,
        trades: &[Trade],
        equity_peak: Option<Decimal>,
        drawdown: DrawdownState,
    ) -> (MetricSnapshot, DrawdownState)
    where
        I: IntoIterator<Item = &'a Position>,
    {
        let net_exposure = calculate_net_exposure(positions, wallet_a);
        let win_coverage_ratio = win_coverage_ratio(trades);
        let daily_profit_sufficiency = Self::daily_profit_sufficiency(wallet_a, wallet_b);
        let (drawdown_velocity, next) =
            Self::drawdown_velocity(wallet_a, wallet_b, equity_peak, drawdown);

        let snapshot = MetricSnapshot {
            win_coverage_ratio,
            daily_profit_sufficiency,
            net_exposure,
            drawdown_velocity,
        };
        (snapshot, next)
    }

    /// Compute all metrics for a portfolio.
    pub fn snapshot_portfolio(
        &self,
        state: &PortfolioState,
        drawdown: DrawdownState,
    ) -> (MetricSnapshot, DrawdownState) {
        self.snapshot(
            state.wallet_a(),
            state.wallet_b(),
            state.position(),
            state.trades(),
            state.equity_peak(),
            drawdown,
        )
    }

    /// Realized vault profit against the daily target. Unbounded above.
    fn daily_profit_sufficiency(wallet_a: &Wallet, wallet_b: &Wallet) -> f64 {
        let target = wallet_a.start_of_day() * DAILY_PROFIT_TARGET_PCT;
        if target.is_zero() {
            return 0.0;
        }
        (wallet_b.balance() / target).to_f64().unwrap_or(0.0)
    }

    /// Change in drawdown since the previous observation.
    ///
    /// Without an established (positive) peak the velocity is zero and the
    /// running state is carried over unchanged.
    fn drawdown_velocity(
        wallet_a: &Wallet,
        wallet_b: &Wallet,
        equity_peak: Option<Decimal>,
        previous: DrawdownState,
    ) -> (f64, DrawdownState) {
        let Some(peak) = equity_peak.filter(|p| *p > Decimal::ZERO) else {
            return (0.0, previous);
        };

        let equity = wallet_a.balance() + wallet_b.balance();
        let drawdown = ((peak - equity) / peak)
            .max(Decimal::ZERO)
            .to_f64()
            .unwrap_or(0.0);
        let velocity = drawdown - previous.last_drawdown;

        (velocity, DrawdownState { last_drawdown: drawdown })
    }
}
