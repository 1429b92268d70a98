use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Side;

/// Lifecycle status of a bet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BetStatus {
    Pending,
    Won,
    Lost,
    Refunded,
}

impl BetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BetStatus::Pending => "pending",
            BetStatus::Won => "won",
            BetStatus::Lost => "lost",
            BetStatus::Refunded => "refunded",
        }
    }
}

impl std::fmt::Display for BetStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A committed wager.
///
/// The record is immutable once created: `line`, `odds`, and
/// `potential_payout` are locked at placement and never recomputed, whatever
/// the market does afterwards. Only the resolution workflow moves `status`
/// out of `Pending`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bet {
    pub id: String,
    pub user_id: String,
    pub market_id: String,
    pub side: Side,
    pub amount: Decimal,
    /// Line in effect when the bet was placed (price lock, pre-adjustment)
    pub line: Decimal,
    /// American odds quoted at placement
    pub odds: i32,
    /// Stake plus profit, fixed at placement
    pub potential_payout: Decimal,
    pub status: BetStatus,
    pub created_at: DateTime<Utc>,
}

impl Bet {
    /// Mint a pending bet with its pricing locked in
    pub fn new(
        user_id: &str,
        market_id: &str,
        side: Side,
        amount: Decimal,
        line: Decimal,
        odds: i32,
        potential_payout: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.to_string(),
            market_id: market_id.to_string(),
            side,
            amount,
            line,
            odds,
            potential_payout,
            status: BetStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
