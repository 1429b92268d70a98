//! In-process storage backend with optimistic concurrency
//!
//! Rows carry write versions. A transaction records the version of every row
//! it reads and buffers its writes; commit re-validates the whole read set
//! under the store's write lock and applies the write set all-or-nothing.
//! Two placements racing on the same market or user therefore serialize in
//! commit order: the loser sees [`StoreError::Conflict`] and can rerun
//! against fresh state. Transaction reads always see committed state, never
//! the transaction's own staged writes.

use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, trace};

use crate::domain::{Bet, Market, User};
use crate::error::StoreError;

use super::{Store, StoreTxn};

/// A stored row plus its write version
#[derive(Debug, Clone)]
struct VersionedRow<T> {
    version: u64,
    row: T,
}

impl<T> VersionedRow<T> {
    fn new(row: T) -> Self {
        Self { version: 1, row }
    }
}

#[derive(Debug, Default)]
struct MemoryInner {
    users: HashMap<String, VersionedRow<User>>,
    markets: HashMap<String, VersionedRow<Market>>,
    bets: HashMap<String, Bet>,
}

impl MemoryInner {
    /// Version currently visible for a key; 0 means the row does not exist,
    /// so a later insert is itself a conflicting change.
    fn version_of(&self, key: &RowKey) -> u64 {
        match key {
            RowKey::User(id) => self.users.get(id).map(|v| v.version).unwrap_or(0),
            RowKey::Market(id) => self.markets.get(id).map(|v| v.version).unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum RowKey {
    User(String),
    Market(String),
}

#[derive(Debug)]
enum WriteOp {
    CreateBet(Bet),
    UpdateMarket(Market),
    DebitUser { user_id: String, amount: Decimal },
}

/// In-memory store with versioned rows and conflict-checked commits
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryInner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a user row. Fixture/bootstrap path, not the
    /// ledger's: account provisioning lives outside the engine.
    pub async fn seed_user(&self, user: User) {
        let mut inner = self.inner.write().await;
        inner.users.insert(user.id.clone(), VersionedRow::new(user));
    }

    /// Insert or replace a market row. Fixture/bootstrap path, not the
    /// ledger's: market creation lives outside the engine.
    pub async fn seed_market(&self, market: Market) {
        let mut inner = self.inner.write().await;
        inner
            .markets
            .insert(market.id.clone(), VersionedRow::new(market));
    }

    /// Number of bets recorded across all markets
    pub async fn bet_count(&self) -> usize {
        self.inner.read().await.bets.len()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn transaction(&self) -> Result<Box<dyn StoreTxn>, StoreError> {
        Ok(Box::new(MemoryTxn {
            inner: Arc::clone(&self.inner),
            reads: Vec::new(),
            writes: Vec::new(),
            committed: false,
        }))
    }

    async fn user(&self, user_id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.users.get(user_id).map(|v| v.row.clone()))
    }

    async fn market(&self, market_id: &str) -> Result<Option<Market>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.markets.get(market_id).map(|v| v.row.clone()))
    }

    async fn market_bets(&self, market_id: &str) -> Result<Vec<Bet>, StoreError> {
        let inner = self.inner.read().await;
        let mut bets: Vec<Bet> = inner
            .bets
            .values()
            .filter(|b| b.market_id == market_id)
            .cloned()
            .collect();
        bets.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(bets)
    }
}

/// Transaction handle over [`MemoryStore`]
struct MemoryTxn {
    inner: Arc<RwLock<MemoryInner>>,
    reads: Vec<(RowKey, u64)>,
    writes: Vec<WriteOp>,
    committed: bool,
}

#[async_trait]
impl StoreTxn for MemoryTxn {
    async fn user(&mut self, user_id: &str) -> Result<Option<User>, StoreError> {
        let inner = self.inner.read().await;
        let key = RowKey::User(user_id.to_string());
        self.reads.push((key.clone(), inner.version_of(&key)));
        Ok(inner.users.get(user_id).map(|v| v.row.clone()))
    }

    async fn market(&mut self, market_id: &str) -> Result<Option<Market>, StoreError> {
        let inner = self.inner.read().await;
        let key = RowKey::Market(market_id.to_string());
        self.reads.push((key.clone(), inner.version_of(&key)));
        Ok(inner.markets.get(market_id).map(|v| v.row.clone()))
    }

    fn create_bet(&mut self, bet: Bet) {
        self.writes.push(WriteOp::CreateBet(bet));
    }

    fn update_market(&mut self, market: Market) {
        self.writes.push(WriteOp::UpdateMarket(market));
    }

    fn debit_user(&mut self, user_id: &str, amount: Decimal) {
        self.writes.push(WriteOp::DebitUser {
            user_id: user_id.to_string(),
            amount,
        });
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if self.committed {
            return Err(StoreError::Backend(
                "transaction already committed".to_string(),
            ));
        }

        let mut inner = self.inner.write().await;

        // Validate the read set: every row read must still be at the version
        // this transaction saw.
        for (key, seen) in &self.reads {
            let current = inner.version_of(key);
            if current != *seen {
                trace!(?key, seen, current, "read-set version mismatch");
                return Err(StoreError::Conflict);
            }
        }

        // Validate every staged write against store invariants before
        // applying any of them; a failed commit must leave no trace.
        for op in &self.writes {
            match op {
                WriteOp::CreateBet(bet) => {
                    if inner.bets.contains_key(&bet.id) {
                        return Err(StoreError::Backend(format!(
                            "duplicate bet id {}",
                            bet.id
                        )));
                    }
                }
                WriteOp::UpdateMarket(market) => {
                    if !inner.markets.contains_key(&market.id) {
                        return Err(StoreError::Backend(format!(
                            "update against unknown market {}",
                            market.id
                        )));
                    }
                    if market.over_money < Decimal::ZERO || market.under_money < Decimal::ZERO {
                        return Err(StoreError::Backend(format!(
                            "negative pool staged for market {}",
                            market.id
                        )));
                    }
                }
                WriteOp::DebitUser { user_id, amount } => {
                    let balance = match inner.users.get(user_id) {
                        Some(slot) => slot.row.balance,
                        None => {
                            return Err(StoreError::Backend(format!(
                                "debit against unknown user {}",
                                user_id
                            )))
                        }
                    };
                    // Balances never go negative: the store enforces it the
                    // way a database check constraint would.
                    if balance < *amount {
                        return Err(StoreError::Backend(format!(
                            "debit of {} would overdraw balance {} for user {}",
                            amount, balance, user_id
                        )));
                    }
                }
            }
        }

        // Apply the whole write set; nothing below can fail.
        for op in self.writes.drain(..) {
            match op {
                WriteOp::CreateBet(bet) => {
                    inner.bets.insert(bet.id.clone(), bet);
                }
                WriteOp::UpdateMarket(market) => {
                    if let Some(slot) = inner.markets.get_mut(&market.id) {
                        slot.version += 1;
                        slot.row = market;
                    }
                }
                WriteOp::DebitUser { user_id, amount } => {
                    if let Some(slot) = inner.users.get_mut(&user_id) {
                        slot.version += 1;
                        slot.row.debit(amount);
                    }
                }
            }
        }

        self.committed = true;
        debug!(reads = self.reads.len(), "transaction committed");
        Ok(())
    }
}
