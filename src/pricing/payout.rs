//! Payout math for American odds

use rust_decimal::Decimal;

/// Profit won on a stake at the given American odds, excluding the returned
/// stake.
///
/// Negative odds risk `|odds|` to win 100; non-negative odds win `odds` per
/// 100 risked. Odds of exactly 0 take the non-negative branch and pay zero
/// profit, so no division by zero is possible.
pub fn profit(stake: Decimal, odds: i32) -> Decimal {
    if odds < 0 {
        stake * Decimal::ONE_HUNDRED / Decimal::from(odds.unsigned_abs())
    } else {
        stake * Decimal::from(odds) / Decimal::ONE_HUNDRED
    }
}

/// Stake plus profit: the full amount returned to a winning bettor
pub fn total_return(stake: Decimal, odds: i32) -> Decimal {
    stake + profit(stake, odds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_favorite_profit() {
        // risk 110 to win 100: 100 * 100/110 = 90.909...
        let p = profit(dec!(100), -110);
        assert_eq!(p.round_dp(2), dec!(90.91));
        assert_eq!(total_return(dec!(100), -110).round_dp(2), dec!(190.91));
    }

    #[test]
    fn test_underdog_profit() {
        // win 150 per 100 risked: 80 * 150/100 = 120
        assert_eq!(profit(dec!(80), 150), dec!(120));
        assert_eq!(total_return(dec!(80), 150), dec!(200));
    }

    #[test]
    fn test_even_money() {
        assert_eq!(profit(dec!(100), -100), dec!(100));
        assert_eq!(profit(dec!(100), 100), dec!(100));
    }

    #[test]
    fn test_zero_odds_pay_zero_profit() {
        assert_eq!(profit(dec!(100), 0), dec!(0));
        assert_eq!(total_return(dec!(100), 0), dec!(100));
    }

    #[test]
    fn test_total_return_identity_and_monotonicity() {
        for odds in [-500, -110, -100, 0, 100, 250, 500] {
            let mut prev = Decimal::ZERO;
            for cents in [1u32, 100, 2_500, 100_000] {
                let stake = Decimal::new(cents as i64, 2);
                let p = profit(stake, odds);
                assert_eq!(total_return(stake, odds), stake + p);
                assert!(p >= prev, "profit must grow with stake at odds {}", odds);
                prev = p;
            }
        }
    }
}
