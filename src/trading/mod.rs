//! Trading logic: decision gate, sizing, risk guards, mock execution.

mod allocator;
mod config;
mod executor;
mod risk;
mod strategy;

pub use config::Settings;
pub use executor::{ExecutionEngine, PortfolioState};
pub use risk::{calculate_net_exposure, win_coverage_ratio};
pub use strategy::Strategy;
