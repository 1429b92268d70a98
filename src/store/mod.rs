//! Storage boundary for the ledger
//!
//! The engine never talks to a concrete backend directly: it consumes
//! [`Store`] for reads and transaction handles, and [`StoreTxn`] for the
//! atomic unit of work a single placement commits. [`MemoryStore`] is the
//! in-process backend; a SQL implementation would plug in at the same seam.

pub mod memory;

pub use memory::MemoryStore;

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use rust_decimal::Decimal;

use crate::domain::{Bet, Market, User};
use crate::error::StoreError;

/// Handle to a storage backend
#[cfg_attr(test, automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Open an isolated transaction for one placement
    async fn transaction(&self) -> Result<Box<dyn StoreTxn>, StoreError>;

    /// Fetch a user row outside any transaction
    async fn user(&self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Fetch a market row outside any transaction
    async fn market(&self, market_id: &str) -> Result<Option<Market>, StoreError>;

    /// All bets recorded against a market, oldest first
    async fn market_bets(&self, market_id: &str) -> Result<Vec<Bet>, StoreError>;
}

/// One atomic unit of work across users, markets, and bets.
///
/// Reads taken through the handle join its read set; writes are buffered and
/// applied only by `commit`, which fails with [`StoreError::Conflict`] when
/// any row this transaction read has changed underneath it. Dropping the
/// handle without committing abandons the buffered writes and leaves the
/// store untouched.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait StoreTxn: Send {
    /// Read a user into the transaction's read set
    async fn user(&mut self, user_id: &str) -> Result<Option<User>, StoreError>;

    /// Read a market into the transaction's read set
    async fn market(&mut self, market_id: &str) -> Result<Option<Market>, StoreError>;

    /// Stage a new bet record
    fn create_bet(&mut self, bet: Bet);

    /// Stage replacement pool balances and line for a market
    fn update_market(&mut self, market: Market);

    /// Stage a balance debit
    fn debit_user(&mut self, user_id: &str, amount: Decimal);

    /// Validate the read set and apply every staged write, atomically
    async fn commit(&mut self) -> Result<(), StoreError>;
}
