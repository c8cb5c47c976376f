//! Data models for wallets, decisions, positions, and trades.

mod decision;
mod position;
mod trade;
mod wallet;

pub use decision::{Decision, DecisionResult};
pub use position::Position;
pub use trade::Trade;
pub use wallet::Wallet;
