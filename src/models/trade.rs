//! Trade model: one simulated fill in the append-only day log.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::Decision;

/// Executed trade snapshot. Never mutated once logged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trade {
    /// Side that was filled
    pub decision: Decision,

    /// Units filled
    pub quantity: Decimal,

    /// Fill price
    pub price: Decimal,

    /// Simulated profit or loss of the fill
    pub pnl: Decimal,

    /// When the fill was simulated
    pub timestamp: DateTime<Utc>,

    /// Signal probability that produced the trade
    #[serde(default)]
    pub signal_probability: Option<Decimal>,
}

impl Trade {
    /// Synthetic identifier derived from the fill time.
    pub fn id(&self) -> String {
        format!("trd_{}", self.timestamp.timestamp_millis())
    }

    pub fn is_win(&self) -> bool {
        self.pnl > Decimal::ZERO
    }

    pub fn is_loss(&self) -> bool {
        self.pnl < Decimal::ZERO
    }
}
