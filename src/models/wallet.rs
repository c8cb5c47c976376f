//! Wallet model: a named balance guarded by a start-of-day floor.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::DeskError;

/// A segregated balance.
///
/// Debits can never take `balance` below `start_of_day`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wallet {
    name: String,
    balance: Decimal,
    start_of_day: Decimal,
}

impl Wallet {
    /// Open a wallet with its balance sitting exactly on the floor.
    pub fn new(name: impl Into<String>, opening_balance: Decimal) -> Self {
        Self {
            name: name.into(),
            balance: opening_balance,
            start_of_day: opening_balance,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Decimal {
        self.balance
    }

    pub fn start_of_day(&self) -> Decimal {
        self.start_of_day
    }

    /// Add funds. Non-positive amounts are ignored.
    pub fn credit(&mut self, amount: Decimal) {
        if amount <= Decimal::ZERO {
            return;
        }
        self.balance += amount;
    }

    /// Remove funds, refusing any debit that would breach the floor.
    ///
    /// Non-positive amounts are ignored. On error the balance is untouched.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), DeskError> {
        if amount <= Decimal::ZERO {
            return Ok(());
        }

        let proposed = self.balance - amount;
        if proposed < self.start_of_day {
            warn!(
                wallet = %self.name,
                balance = %self.balance,
                amount = %amount,
                floor = %self.start_of_day,
                "Debit rejected at start-of-day floor"
            );
            return Err(DeskError::InsufficientFloor {
                wallet: self.name.clone(),
                balance: self.balance,
                amount,
                floor: self.start_of_day,
            });
        }

        self.balance = proposed;
        Ok(())
    }

    /// Start a new day: both the floor and the balance move to `start_balance`.
    pub fn reset_day(&mut self, start_balance: Decimal) {
        self.start_of_day = start_balance;
        self.balance = start_balance;
    }
}
