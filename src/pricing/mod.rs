//! Pure pricing and settlement calculators
//!
//! Everything in here is deterministic arithmetic over pool balances: no
//! state, no I/O. The ledger composes these into the placement transaction.

pub mod line;
pub mod odds;
pub mod payout;
pub mod settlement;

pub use line::{line_delta, IMBALANCE_THRESHOLD, LINE_STEP};
pub use odds::{american_odds, MAX_FAVORITE_ODDS, MAX_UNDERDOG_ODDS, OPENING_ODDS};
pub use payout::{profit, total_return};
pub use settlement::{house_profit, payout_owed};
