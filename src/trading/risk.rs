//! Risk and exposure helpers shared by the decision gate and the metrics engine.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::models::{Position, Trade, Wallet};

/// Whether the wallet may take on a trade under its floor constraints.
///
/// Passes only when the balance already sits at least one risk budget above the
/// start-of-day floor and the projected loss fits inside that budget. A wallet at
/// or below its opening balance can therefore never take risk.
pub fn can_risk(wallet: &Wallet, risk_fraction: Decimal, estimated_loss_pct: Decimal) -> bool {
    let risk_budget = wallet.start_of_day() * risk_fraction;
    let floor_after_loss = wallet.balance() - risk_budget;
    let projected_loss = wallet.balance() * estimated_loss_pct;
    floor_after_loss >= wallet.start_of_day() && projected_loss <= risk_budget
}

/// Open notional as a fraction of the wallet balance, clipped to [0, 1].
pub fn calculate_net_exposure<'a, I>(positions: I, wallet: &Wallet) -> f64
where
    I: IntoIterator<Item = &'a Position>,
{
    if wallet.balance() <= Decimal::ZERO {
        return 0.0;
    }
    let notional: Decimal = positions.into_iter().map(Position::notional).sum();
    let exposure = (notional / wallet.balance()).min(Decimal::ONE);
    exposure.to_f64().unwrap_or(0.0)
}

/// Wins per loss. With no losses this is the raw win count; 0 with no closed trades.
pub fn win_coverage_ratio(trades: &[Trade]) -> f64 {
    let wins = trades.iter().filter(|t| t.is_win()).count();
    let losses = trades.iter().filter(|t| t.is_loss()).count();
    if losses == 0 {
        return wins as f64;
    }
    wins as f64 / losses as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Decision;
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn trade_with_pnl(pnl: Decimal) -> Trade {
        Trade {
            decision: Decision::Buy,
            quantity: dec!(1),
            price: dec!(100),
            pnl,
            timestamp: Utc::now(),
            signal_probability: None,
        }
    }

    #[test]
    fn test_can_risk_blocks_at_opening_balance() {
        // Documented conservative behavior: no risk until the wallet is ahead of its floor
        let wallet = Wallet::new("Wallet A", dec!(100000));
        assert!(!can_risk(&wallet, dec!(0.0025), dec!(0.001)));
    }

    #[test]
    fn test_can_risk_needs_cushion_and_small_loss() {
        let mut wallet = Wallet::new("Wallet A", dec!(100000));
        wallet.credit(dec!(300));

        // Cushion 300 >= budget 250, projected loss 200.6 <= 250
        assert!(can_risk(&wallet, dec!(0.0025), dec!(0.002)));
        // Projected loss 1003 > budget 250
        assert!(!can_risk(&wallet, dec!(0.0025), dec!(0.01)));
    }

    #[test]
    fn test_can_risk_cushion_smaller_than_budget() {
        let mut wallet = Wallet::new("Wallet A", dec!(100000));
        wallet.credit(dec!(249.99));
        assert!(!can_risk(&wallet, dec!(0.0025), dec!(0.0001)));
    }

    #[test]
    fn test_net_exposure_is_clipped() {
        let wallet = Wallet::new("Wallet A", dec!(1000));
        let big = Position::new(Decision::Buy, dec!(30), dec!(50));
        let small = Position::new(Decision::Sell, dec!(2), dec!(50));

        assert_eq!(calculate_net_exposure([&big, &small], &wallet), 1.0);
        assert!((calculate_net_exposure([&small], &wallet) - 0.1).abs() < 1e-12);
        assert_eq!(calculate_net_exposure(None::<&Position>, &wallet), 0.0);
    }

    #[test]
    fn test_net_exposure_zero_balance() {
        let wallet = Wallet::new("Wallet A", Decimal::ZERO);
        let pos = Position::new(Decision::Buy, dec!(1), dec!(1));
        assert_eq!(calculate_net_exposure([&pos], &wallet), 0.0);
    }

    #[test]
    fn test_win_coverage_ratio() {
        assert_eq!(win_coverage_ratio(&[]), 0.0);

        let only_wins = vec![trade_with_pnl(dec!(5)), trade_with_pnl(dec!(1)), trade_with_pnl(dec!(0))];
        assert_eq!(win_coverage_ratio(&only_wins), 2.0);

        let mixed = vec![
            trade_with_pnl(dec!(5)),
            trade_with_pnl(dec!(-1)),
            trade_with_pnl(dec!(3)),
            trade_with_pnl(dec!(-2)),
            trade_with_pnl(dec!(4)),
        ];
        assert_eq!(win_coverage_ratio(&mixed), 1.5);

        let only_losses = vec![trade_with_pnl(dec!(-5))];
        assert_eq!(win_coverage_ratio(&only_losses), 0.0);
    }
}
