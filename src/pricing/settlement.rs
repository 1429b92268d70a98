//! Resolution economics: the house's take once a winner is known

use rust_decimal::Decimal;

use crate::domain::Side;

/// Amount owed to winning bettors at resolution: the winning pool scaled by
/// `1 - vig_rate`
pub fn payout_owed(winning_money: Decimal, vig_rate: Decimal) -> Decimal {
    winning_money * (Decimal::ONE - vig_rate)
}

/// House profit when a market resolves.
///
/// The losing pool funds the payout owed to winners. The result is signed:
/// a heavily lopsided correct prediction can cost the house money, and that
/// loss is reported as-is, never clamped.
pub fn house_profit(
    over_money: Decimal,
    under_money: Decimal,
    winning_side: Side,
    vig_rate: Decimal,
) -> Decimal {
    let (winning_money, losing_money) = match winning_side {
        Side::Over => (over_money, under_money),
        Side::Under => (under_money, over_money),
    };
    losing_money - payout_owed(winning_money, vig_rate)
}
