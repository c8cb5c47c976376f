//! Domain errors surfaced by the trading core.

use rust_decimal::Decimal;
use thiserror::Error;

/// Errors the desk reports back to its caller.
///
/// Guard rejections are not errors: they come back as a `NoTrade` decision.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeskError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{wallet} cannot drop below start-of-day balance (balance {balance}, debit {amount}, floor {floor})")]
    InsufficientFloor {
        wallet: String,
        balance: Decimal,
        amount: Decimal,
        floor: Decimal,
    },
}

impl DeskError {
    /// True for rejections caused by the wallet floor.
    pub fn is_floor_breach(&self) -> bool {
        matches!(self, DeskError::InsufficientFloor { .. })
    }
}
