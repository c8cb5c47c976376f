//! Position model: the single exposure currently held by the desk.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Decision, Trade};

/// Directional position used for exposure tracking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub decision: Decision,
    pub quantity: Decimal,
    pub entry_price: Decimal,
}

impl Position {
    pub fn new(decision: Decision, quantity: Decimal, entry_price: Decimal) -> Self {
        Self {
            decision,
            quantity,
            entry_price,
        }
    }

    /// Position left behind by a fill, or `None` when the fill was flat.
    pub fn from_trade(trade: &Trade) -> Option<Self> {
        if trade.quantity <= Decimal::ZERO || trade.decision == Decision::NoTrade {
            return None;
        }
        Some(Self::new(trade.decision, trade.quantity, trade.price))
    }

    /// Absolute committed value.
    pub fn notional(&self) -> Decimal {
        (self.quantity * self.entry_price).abs()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn fill(decision: Decision, quantity: Decimal) -> Trade {
        Trade {
            decision,
            quantity,
            price: dec!(100),
            pnl: Decimal::ZERO,
            timestamp: Utc::now(),
            signal_probability: Some(dec!(0.5)),
        }
    }

    #[test]
    fn test_notional_is_absolute() {
        let pos = Position::new(Decision::Sell, dec!(-3), dec!(20));
        assert_eq!(pos.notional(), dec!(60));
    }

    #[test]
    fn test_from_trade() {
        let pos = Position::from_trade(&fill(Decision::Buy, dec!(250.75))).unwrap();
        assert_eq!(pos.notional(), dec!(25075));
        assert_eq!(pos.decision, Decision::Buy);

        assert!(Position::from_trade(&fill(Decision::NoTrade, dec!(10))).is_none());
        assert!(Position::from_trade(&fill(Decision::Sell, Decimal::ZERO)).is_none());
    }
}
