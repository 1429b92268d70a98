//! Posted-line adjustment from pool imbalance

use rust_decimal::Decimal;

/// Pool share beyond which the line steps toward the heavy side
pub const IMBALANCE_THRESHOLD: Decimal = Decimal::from_parts(65, 0, 0, false, 2); // 0.65

/// Size of a single line move
pub const LINE_STEP: Decimal = Decimal::from_parts(5, 0, 0, false, 1); // 0.5

/// Line delta implied by post-bet pool balances.
///
/// Call with the pools *after* the pending stake has been applied; the
/// decision is always made on post-bet money. An over share strictly above
/// the threshold raises the line one step (making over less attractive and
/// nudging future stakes toward under); the mirror case lowers it. Shares
/// sum to 1 and the threshold exceeds 0.5, so at most one side can cross.
/// One step per bet, whatever the imbalance.
pub fn line_delta(new_over_money: Decimal, new_under_money: Decimal) -> Decimal {
    let total = new_over_money + new_under_money;
    if total.is_zero() {
        return Decimal::ZERO;
    }

    let over_share = new_over_money / total;
    let under_share = new_under_money / total;

    if over_share > IMBALANCE_THRESHOLD {
        LINE_STEP
    } else if under_share > IMBALANCE_THRESHOLD {
        -LINE_STEP
    } else {
        Decimal::ZERO
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_balanced_pools_hold_the_line() {
        assert_eq!(line_delta(dec!(500), dec!(500)), dec!(0));
        assert_eq!(line_delta(dec!(600), dec!(400)), dec!(0));
    }

    #[test]
    fn test_empty_pools_hold_the_line() {
        assert_eq!(line_delta(dec!(0), dec!(0)), dec!(0));
    }

    #[test]
    fn test_over_heavy_raises_line() {
        // 700 / 1000 = 0.70 > 0.65
        assert_eq!(line_delta(dec!(700), dec!(300)), dec!(0.5));
    }

    #[test]
    fn test_under_heavy_lowers_line() {
        assert_eq!(line_delta(dec!(300), dec!(700)), dec!(-0.5));
    }

    #[test]
    fn test_threshold_is_strict() {
        // exactly 0.65 does not move the line
        assert_eq!(line_delta(dec!(650), dec!(350)), dec!(0));
        assert_eq!(line_delta(dec!(350), dec!(650)), dec!(0));
        // a hair past it does
        assert_eq!(line_delta(dec!(650.01), dec!(349.99)), dec!(0.5));
    }

    #[test]
    fn test_single_step_regardless_of_magnitude() {
        assert_eq!(line_delta(dec!(999), dec!(1)), dec!(0.5));
        assert_eq!(line_delta(dec!(100000), dec!(1)), dec!(0.5));
    }

    #[test]
    fn test_one_sided_from_empty() {
        // first bet alone can cross the threshold
        assert_eq!(line_delta(dec!(100), dec!(0)), dec!(0.5));
        assert_eq!(line_delta(dec!(0), dec!(100)), dec!(-0.5));
    }
}
