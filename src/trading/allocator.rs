//! Risk-budgeted position sizing.

use rust_decimal::Decimal;

use crate::models::Wallet;

use super::Settings;

/// Size a position so its worst-case simulated loss equals the risk budget.
///
/// risk_budget = balance * max_risk_per_trade
/// quantity    = risk_budget / (price * expected_loss_pct)
///
/// Returns zero when the price or the per-unit loss is not positive.
pub fn allocate_quantity(
    price: Decimal,
    expected_loss_pct: Decimal,
    wallet: &Wallet,
    settings: &Settings,
) -> Decimal {
    if price <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    let risk_budget = wallet.balance() * settings.max_risk_per_trade;
    let per_unit_loss = price * expected_loss_pct;
    if per_unit_loss <= Decimal::ZERO {
        return Decimal::ZERO;
    }

    (risk_budget / per_unit_loss).max(Decimal::ZERO)
}
