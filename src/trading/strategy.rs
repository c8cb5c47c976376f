//! Decision gate: expected value plus risk and performance guards.
//!
//! A signal becomes a trade only when:
//! - its expected value is positive
//! - net exposure is under the limit
//! - win coverage is acceptable (or no trade has closed yet)
//! - the trading wallet is far enough above its floor to take risk
//! - the price is positive

use std::fmt;

use rust_decimal::Decimal;
use tracing::debug;

use crate::metrics::MetricSnapshot;
use crate::models::{DecisionResult, Wallet};

use super::executor::ExecutionEngine;
use super::risk::can_risk;
use super::Settings;

/// First guard that blocked a signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardRejection {
    /// EV was zero or negative
    NonPositiveEdge,
    /// Net exposure at or above the configured limit
    ExposureLimit,
    /// Win coverage below the minimum after trades have closed
    WinCoverage,
    /// Wallet A cannot absorb the risk budget above its floor
    RiskFloor,
    /// Price was zero or negative
    InvalidPrice,
}

impl fmt::Display for GuardRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            GuardRejection::NonPositiveEdge => "insufficient edge",
            GuardRejection::ExposureLimit => "exposure limit reached",
            GuardRejection::WinCoverage => "win coverage below minimum",
            GuardRejection::RiskFloor => "risk budget would breach wallet floor",
            GuardRejection::InvalidPrice => "non-positive price",
        };
        f.write_str(reason)
    }
}

/// Result of running a signal through the gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub result: DecisionResult,
    /// Set when a guard turned the signal into `NoTrade`
    pub rejection: Option<GuardRejection>,
}

/// Demo strategy over mock probability signals.
#[derive(Debug, Clone)]
pub struct Strategy {
    settings: Settings,
}

impl Strategy {
    pub fn new(settings: Settings) -> Self {
        Self { settings }
    }

    /// EV = (p * gain_pct - (1 - p) * loss_pct) * price
    pub fn expected_value(&self, price: Decimal, probability: Decimal) -> Decimal {
        let gain = probability * self.settings.expected_gain_pct;
        let loss = (Decimal::ONE - probability) * self.settings.expected_loss_pct;
        (gain - loss) * price
    }

    /// Decide whether to trade and, if so, how much.
    ///
    /// `result` is `NoTrade` with the computed EV whenever a guard fails, and
    /// `rejection` names that guard.
    pub fn run(
        &self,
        engine: &ExecutionEngine,
        price: Decimal,
        probability: Decimal,
        metrics: &MetricSnapshot,
    ) -> Evaluation {
        let ev = self.expected_value(price, probability);

        if let Some(rejection) = self.check_guards(ev, metrics, engine.state().wallet_a(), price) {
            debug!(
                ev = %ev,
                price = %price,
                probability = %probability,
                reason = %rejection,
                "Signal rejected by guards"
            );
            return Evaluation {
                result: DecisionResult::no_trade(ev),
                rejection: Some(rejection),
            };
        }

        Evaluation {
            result: engine.build_decision(ev, price, probability),
            rejection: None,
        }
    }

    /// Apply the guards in order and return the first failure.
    pub fn check_guards(
        &self,
        ev: Decimal,
        metrics: &MetricSnapshot,
        wallet_a: &Wallet,
        price: Decimal,
    ) -> Option<GuardRejection> {
        if ev <= Decimal::ZERO {
            return Some(GuardRejection::NonPositiveEdge);
        }
        if metrics.net_exposure >= self.settings.exposure_limit {
            return Some(GuardRejection::ExposureLimit);
        }
        // A ratio of zero means nothing has closed yet
        if metrics.win_coverage_ratio < self.settings.min_wcr && metrics.win_coverage_ratio != 0.0 {
            return Some(GuardRejection::WinCoverage);
        }
        if !can_risk(
            wallet_a,
            self.settings.max_risk_per_trade,
            self.settings.expected_loss_pct,
        ) {
            return Some(GuardRejection::RiskFloor);
        }
        if price <= Decimal::ZERO {
            return Some(GuardRejection::InvalidPrice);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Decision;
    use rust_decimal_macros::dec;

    fn quiet_metrics() -> MetricSnapshot {
        MetricSnapshot {
            win_coverage_ratio: 0.0,
            daily_profit_sufficiency: 0.0,
            net_exposure: 0.0,
            drawdown_velocity: 0.0,
        }
    }

    /// Wallet A at 100300 against a 100000 floor
    fn cushioned_wallet() -> Wallet {
        let mut wallet = Wallet::new("Wallet A", dec!(100000));
        wallet.credit(dec!(300));
        wallet
    }

    /// Settings whose projected loss fits the risk budget once Wallet A has a cushion
    fn tradable_settings() -> Settings {
        Settings {
            expected_loss_pct: dec!(0.002),
            ..Default::default()
        }
    }

    #[test]
    fn test_expected_value() {
        let strategy = Strategy::new(Settings::default());
        assert_eq!(strategy.expected_value(dec!(100), dec!(0.8)), dec!(0.6));
        assert_eq!(strategy.expected_value(dec!(100), dec!(0.5)), dec!(0));
        assert_eq!(strategy.expected_value(dec!(100), dec!(0.2)), dec!(-0.6));
    }

    #[test]
    fn test_positive_ev_blocked_at_opening_balance() {
        // Wallet A sitting on its floor can never pass the risk guard
        let engine = ExecutionEngine::new(Settings::default());
        let strategy = Strategy::new(Settings::default());

        let evaluation = strategy.run(&engine, dec!(100), dec!(0.8), &quiet_metrics());
        assert_eq!(evaluation.result, DecisionResult::no_trade(dec!(0.6)));
        assert_eq!(evaluation.rejection, Some(GuardRejection::RiskFloor));
    }

    #[test]
    fn test_negative_ev_rejected_first() {
        let engine = ExecutionEngine::new(Settings::default());
        let strategy = Strategy::new(Settings::default());

        let result = strategy.run(&engine, dec!(100), dec!(0.3), &quiet_metrics()).result;
        assert_eq!(result.decision, Decision::NoTrade);
        assert_eq!(result.expected_value, dec!(-0.4));
    }

    #[test]
    fn test_guard_order() {
        let strategy = Strategy::new(tradable_settings());
        let wallet = cushioned_wallet();
        let mut metrics = quiet_metrics();

        assert_eq!(strategy.check_guards(dec!(1), &metrics, &wallet, dec!(100)), None);

        metrics.net_exposure = 0.4;
        assert_eq!(
            strategy.check_guards(dec!(1), &metrics, &wallet, dec!(100)),
            Some(GuardRejection::ExposureLimit)
        );
        assert_eq!(
            strategy.check_guards(dec!(0), &metrics, &wallet, dec!(100)),
            Some(GuardRejection::NonPositiveEdge)
        );

        metrics.net_exposure = 0.39;
        metrics.win_coverage_ratio = 0.5;
        assert_eq!(
            strategy.check_guards(dec!(1), &metrics, &wallet, dec!(100)),
            Some(GuardRejection::WinCoverage)
        );

        metrics.win_coverage_ratio = 1.1;
        assert_eq!(
            strategy.check_guards(dec!(1), &metrics, &wallet, dec!(-1)),
            Some(GuardRejection::InvalidPrice)
        );
    }

    #[test]
    fn test_zero_win_coverage_skips_guard() {
        let strategy = Strategy::new(tradable_settings());
        let metrics = quiet_metrics();
        assert_eq!(strategy.check_guards(dec!(1), &metrics, &cushioned_wallet(), dec!(100)), None);
    }

    #[test]
    fn test_cushioned_wallet_default_loss_still_blocked() {
        // Projected loss 100300 * 1% = 1003 exceeds the 250 budget
        let strategy = Strategy::new(Settings::default());
        assert_eq!(
            strategy.check_guards(dec!(0.6), &quiet_metrics(), &cushioned_wallet(), dec!(100)),
            Some(GuardRejection::RiskFloor)
        );
    }

    #[test]
    fn test_passing_signal_is_sized() {
        let settings = tradable_settings();
        let mut engine = ExecutionEngine::new(settings.clone());
        engine.credit_trading_wallet(dec!(300));
        let strategy = Strategy::new(settings);

        let evaluation = strategy.run(&engine, dec!(100), dec!(0.8), &quiet_metrics());
        assert_eq!(evaluation.rejection, None);
        // EV = (0.8 * 0.01 - 0.2 * 0.002) * 100
        assert_eq!(
            evaluation.result,
            DecisionResult {
                decision: Decision::Buy,
                // 100300 * 0.0025 / (100 * 0.002)
                quantity: dec!(1253.75),
                expected_value: dec!(0.76),
            }
        );
    }

    #[test]
    fn test_bearish_signal_sells() {
        let settings = tradable_settings();
        let mut engine = ExecutionEngine::new(Settings {
            expected_gain_pct: dec!(0.05),
            ..settings.clone()
        });
        engine.credit_trading_wallet(dec!(300));
        let strategy = Strategy::new(Settings {
            expected_gain_pct: dec!(0.05),
            ..settings
        });

        // EV = (0.4 * 0.05 - 0.6 * 0.002) * 100 = 1.88
        let result = strategy.run(&engine, dec!(100), dec!(0.4), &quiet_metrics()).result;
        assert_eq!(result.decision, Decision::Sell);
        assert_eq!(result.expected_value, dec!(1.88));
        assert!(result.quantity > Decimal::ZERO);
    }
}
