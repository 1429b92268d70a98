//! wageline: pari-mutuel over/under market pricing and settlement engine
//!
//! Prices American odds from pool balances, locks payouts at placement,
//! moves the posted line on money imbalance, and commits each bet, its pool
//! update, the line move, and the balance debit as one atomic unit.

pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod ledger;
pub mod pricing;
pub mod store;

pub use config::AppConfig;
pub use domain::{Bet, BetStatus, Market, MarketStatus, Side, User};
pub use error::{BetError, Result, StoreError, WagelineError};
pub use ledger::{BetReceipt, BetRequest, MarketLedger, SettlementSummary};
pub use store::{MemoryStore, Store, StoreTxn};
