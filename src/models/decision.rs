//! Trade decisions and the sized proposals built from them.

use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Discrete trade action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Decision {
    Buy,
    Sell,
    NoTrade,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Buy => "BUY",
            Decision::Sell => "SELL",
            Decision::NoTrade => "NO_TRADE",
        }
    }

    /// Sign applied to a simulated move: +1 long, -1 short, 0 flat.
    pub fn direction(&self) -> Decimal {
        match self {
            Decision::Buy => Decimal::ONE,
            Decision::Sell => Decimal::NEGATIVE_ONE,
            Decision::NoTrade => Decimal::ZERO,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A sized proposal that has not been applied to any wallet yet.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DecisionResult {
    pub decision: Decision,
    /// Always zero for `NoTrade`
    pub quantity: Decimal,
    pub expected_value: Decimal,
}

impl DecisionResult {
    /// A flat proposal that keeps the computed EV for reporting.
    pub fn no_trade(expected_value: Decimal) -> Self {
        Self {
            decision: Decision::NoTrade,
            quantity: Decimal::ZERO,
            expected_value,
        }
    }

    /// True when the proposal would actually put on exposure.
    pub fn is_actionable(&self) -> bool {
        self.decision != Decision::NoTrade && self.quantity > Decimal::ZERO
    }
}
