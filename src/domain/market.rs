use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::BetError;

/// Side of the over/under market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Over,
    Under,
}

impl Side {
    /// Get the opposite side
    pub fn opposite(&self) -> Self {
        match self {
            Side::Over => Side::Under,
            Side::Under => Side::Over,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Over => "over",
            Side::Under => "under",
        }
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Side {
    type Err = &'static str;

    fn from_str(raw: &str) -> std::result::Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "over" | "o" => Ok(Self::Over),
            "under" | "u" => Ok(Self::Under),
            _ => Err("invalid side; expected over|under"),
        }
    }
}

/// Parse a raw side argument, mapping failures to a placement rejection
pub fn parse_side(raw: &str) -> std::result::Result<Side, BetError> {
    Side::from_str(raw).map_err(|e| BetError::InvalidInput(e.to_string()))
}

/// Lifecycle status of a market
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketStatus {
    Active,
    Resolved,
    Cancelled,
}

impl MarketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketStatus::Active => "active",
            MarketStatus::Resolved => "resolved",
            MarketStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for MarketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An over/under market on a continuous outcome (a future hourly wage).
///
/// Pools accumulate stakes per side; the posted line moves in fixed steps as
/// money imbalance crosses the adjustment threshold. Only active markets
/// accept bets.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub title: String,
    pub over_money: Decimal,
    pub under_money: Decimal,
    pub current_line: Decimal,
    /// Reference line set at creation; never moves
    pub initial_line: Decimal,
    /// House edge as a probability fraction in [0, 1), fixed per market
    pub vig_rate: Decimal,
    pub status: MarketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Market {
    /// Open a market with empty pools at the given line
    pub fn new(id: &str, title: &str, line: Decimal, vig_rate: Decimal) -> Self {
        let now = Utc::now();
        Self {
            id: id.to_string(),
            title: title.to_string(),
            over_money: Decimal::ZERO,
            under_money: Decimal::ZERO,
            current_line: line,
            initial_line: line,
            vig_rate,
            status: MarketStatus::Active,
            created_at: now,
            updated_at: now,
        }
    }

    /// Pool on one side
    pub fn pool(&self, side: Side) -> Decimal {
        match side {
            Side::Over => self.over_money,
            Side::Under => self.under_money,
        }
    }

    /// Pools as (chosen side, opposite side)
    pub fn pool_split(&self, side: Side) -> (Decimal, Decimal) {
        (self.pool(side), self.pool(side.opposite()))
    }

    /// Total staked across both sides
    pub fn total_pool(&self) -> Decimal {
        self.over_money + self.under_money
    }

    /// Add a committed stake to one side's pool
    pub fn add_stake(&mut self, side: Side, amount: Decimal) {
        match side {
            Side::Over => self.over_money += amount,
            Side::Under => self.under_money += amount,
        }
        self.updated_at = Utc::now();
    }

    /// Move the posted line by a delta
    pub fn apply_line_move(&mut self, delta: Decimal) {
        self.current_line += delta;
        self.updated_at = Utc::now();
    }

    /// Check if the market accepts bets
    pub fn is_active(&self) -> bool {
        self.status == MarketStatus::Active
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_side_opposite() {
        assert_eq!(Side::Over.opposite(), Side::Under);
        assert_eq!(Side::Under.opposite(), Side::Over);
    }

    #[test]
    fn parse_side_accepts_aliases() {
        assert_eq!(parse_side("over").expect("over should parse"), Side::Over);
        assert_eq!(parse_side(" OVER ").expect("case/space tolerant"), Side::Over);
        assert_eq!(parse_side("u").expect("u alias should parse"), Side::Under);
    }

    #[test]
    fn parse_side_rejects_unknown_value() {
        let err = parse_side("middle").unwrap_err();
        assert!(matches!(err, BetError::InvalidInput(_)));
    }

    #[test]
    fn test_pool_split() {
        let mut market = Market::new("m1", "Wage over/under", dec!(25.00), dec!(0.1));
        market.add_stake(Side::Over, dec!(150));
        market.add_stake(Side::Under, dec!(50));

        assert_eq!(market.pool_split(Side::Over), (dec!(150), dec!(50)));
        assert_eq!(market.pool_split(Side::Under), (dec!(50), dec!(150)));
        assert_eq!(market.total_pool(), dec!(200));
    }

    #[test]
    fn test_line_move_keeps_initial_line() {
        let mut market = Market::new("m1", "Wage over/under", dec!(25.00), dec!(0.1));
        market.apply_line_move(dec!(0.5));
        market.apply_line_move(dec!(0.5));

        assert_eq!(market.current_line, dec!(26.00));
        assert_eq!(market.initial_line, dec!(25.00));
    }

    #[test]
    fn test_only_active_accepts_bets() {
        let mut market = Market::new("m1", "Wage over/under", dec!(25.00), dec!(0.1));
        assert!(market.is_active());

        market.status = MarketStatus::Resolved;
        assert!(!market.is_active());
    }
}
