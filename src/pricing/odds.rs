//! American odds pricing from pari-mutuel pool balances

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

// =============================================================================
// Pricing Constants
// =============================================================================

/// Opening price quoted on both sides while the pools are empty
pub const OPENING_ODDS: i32 = -110;

/// Hardest favorite price quoted (risk 500 to win 100)
pub const MAX_FAVORITE_ODDS: i32 = -500;

/// Longest underdog price quoted (win 500 per 100 risked)
pub const MAX_UNDERDOG_ODDS: i32 = 500;

/// Implied probability at which a side prices as the favorite
const FAVORITE_THRESHOLD: Decimal = Decimal::from_parts(5, 0, 0, false, 1); // 0.5

// =============================================================================
// Odds Calculation
// =============================================================================

/// Convert one side's pool balance into integer American odds.
///
/// `side_money` is the pool backing the side being priced and
/// `opposite_money` the other pool. An empty market quotes the standard
/// two-sided opening price of -110 on both sides. Otherwise the side's
/// implied probability `side/total` gets half the vig added on top and is
/// converted to American odds, clamped to [-500, 500].
///
/// The vig half-increment is applied afresh whenever either side is priced,
/// so the two quotes taken together carry more than `vig_rate` of house
/// edge. That asymmetry is the book's published pricing; keep it.
pub fn american_odds(side_money: Decimal, opposite_money: Decimal, vig_rate: Decimal) -> i32 {
    let total = side_money + opposite_money;
    if total.is_zero() {
        return OPENING_ODDS;
    }

    let implied = side_money / total;
    let priced = implied + vig_rate / Decimal::TWO;

    if priced >= FAVORITE_THRESHOLD {
        let complement = Decimal::ONE - priced;
        if complement <= Decimal::ZERO {
            // A one-sided pool plus vig pushes the implied probability to 1
            // or past it; the quote saturates at the favorite clamp.
            return MAX_FAVORITE_ODDS;
        }
        let ratio = priced / complement * Decimal::ONE_HUNDRED;
        let odds = -round_half_away(ratio);
        odds.max(Decimal::from(MAX_FAVORITE_ODDS))
            .to_i32()
            .unwrap_or(MAX_FAVORITE_ODDS)
    } else {
        if priced.is_zero() {
            // Zero-vig side with an empty pool: longest underdog on offer.
            return MAX_UNDERDOG_ODDS;
        }
        let ratio = (Decimal::ONE - priced) / priced * Decimal::ONE_HUNDRED;
        let odds = round_half_away(ratio);
        odds.min(Decimal::from(MAX_UNDERDOG_ODDS))
            .to_i32()
            .unwrap_or(MAX_UNDERDOG_ODDS)
    }
}

/// Round to the nearest integer, midpoints away from zero
fn round_half_away(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

// =============================================================================
// Tests
// =============================================================================
