//! The market ledger: atomic bet placement over the storage boundary
//!
//! One placement runs validate → price → commit inside a single storage
//! transaction. Odds and payout are locked against the pre-bet pools; the
//! line decision uses the post-bet pools; the bet row, the pool update, the
//! line move, and the balance debit land together or not at all. A commit
//! conflict reruns the whole placement against fresh state, a bounded number
//! of times.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::config::EngineConfig;
use crate::domain::{Bet, Market, Side, User};
use crate::error::{BetError, Result, StoreError};
use crate::pricing;
use crate::store::Store;

/// A bet placement request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetRequest {
    pub user_id: String,
    pub market_id: String,
    pub side: Side,
    pub amount: Decimal,
}

/// What the caller gets back from a committed placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BetReceipt {
    pub bet_id: String,
    /// Line the bet locked in (pre-adjustment)
    pub line: Decimal,
    /// Posted line after this placement
    pub new_line: Decimal,
    /// American odds locked at placement
    pub odds: i32,
    /// Stake plus profit, locked at placement
    pub potential_payout: Decimal,
    pub line_moved: bool,
}

/// Settlement math for one market, computed read-only for the resolution
/// workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettlementSummary {
    pub market_id: String,
    pub winning_side: Side,
    pub winning_money: Decimal,
    pub losing_money: Decimal,
    pub payout_owed: Decimal,
    pub house_profit: Decimal,
}

/// Outcome of a single placement attempt
enum Attempt {
    Committed(BetReceipt),
    Conflicted,
}

/// Orchestrates atomic bet placement against a storage backend
pub struct MarketLedger {
    store: Arc<dyn Store>,
    config: EngineConfig,
}

impl MarketLedger {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self::with_config(store, EngineConfig::default())
    }

    pub fn with_config(store: Arc<dyn Store>, config: EngineConfig) -> Self {
        Self { store, config }
    }

    /// Place a bet: validate, price, and commit as one atomic unit.
    ///
    /// Commit conflicts rerun the placement from validation so every attempt
    /// prices against current pools and a current balance. All other errors
    /// are terminal for the request, and no error path leaves any partial
    /// mutation behind.
    pub async fn place_bet(&self, request: &BetRequest) -> Result<BetReceipt> {
        let mut attempts = 0u32;

        loop {
            attempts += 1;

            match self.try_place(request).await? {
                Attempt::Committed(receipt) => {
                    info!(
                        "Bet {} committed: {} {} on {} @ {} (line {} -> {})",
                        receipt.bet_id,
                        request.amount,
                        request.side,
                        request.market_id,
                        receipt.odds,
                        receipt.line,
                        receipt.new_line
                    );
                    return Ok(receipt);
                }
                Attempt::Conflicted => {
                    if attempts >= self.config.max_commit_attempts {
                        error!(
                            "Placement failed after {} attempts: user {} on {}",
                            attempts, request.user_id, request.market_id
                        );
                        return Err(BetError::ConcurrencyConflict { attempts }.into());
                    }
                    warn!(
                        "Placement attempt {} conflicted: user {} on {}. Retrying...",
                        attempts, request.user_id, request.market_id
                    );
                }
            }
        }
    }

    /// One full placement attempt: validate → price → commit
    async fn try_place(&self, request: &BetRequest) -> Result<Attempt> {
        if request.amount <= Decimal::ZERO {
            return Err(BetError::InvalidInput(format!(
                "stake must be positive, got {}",
                request.amount
            ))
            .into());
        }

        let mut txn = self.store.transaction().await?;

        let user = txn.user(&request.user_id).await?.ok_or_else(|| {
            BetError::UserNotFound {
                user_id: request.user_id.clone(),
            }
        })?;
        if !user.can_cover(request.amount) {
            return Err(BetError::InsufficientBalance {
                balance: user.balance,
                required: request.amount,
            }
            .into());
        }

        let mut market = txn.market(&request.market_id).await?.ok_or_else(|| {
            BetError::MarketNotFound {
                market_id: request.market_id.clone(),
            }
        })?;
        if !market.is_active() {
            return Err(BetError::MarketNotActive {
                market_id: market.id.clone(),
                status: market.status.to_string(),
            }
            .into());
        }

        // Odds and payout price against the PRE-bet pools and are locked
        // into the bet record here, never recomputed.
        let (side_money, opposite_money) = market.pool_split(request.side);
        let odds = pricing::american_odds(side_money, opposite_money, market.vig_rate);
        let potential_payout = pricing::total_return(request.amount, odds);
        let line = market.current_line;

        debug!(
            "Priced {} {} on {}: pools ({}, {}), odds {}, locked payout {}",
            request.amount, request.side, market.id, side_money, opposite_money, odds,
            potential_payout
        );

        let bet = Bet::new(
            &request.user_id,
            &request.market_id,
            request.side,
            request.amount,
            line,
            odds,
            potential_payout,
        );
        let bet_id = bet.id.clone();

        // The line decision uses the POST-bet pools; the stake joins the
        // pool in the same commit.
        market.add_stake(request.side, request.amount);
        let delta = pricing::line_delta(market.over_money, market.under_money);
        let line_moved = !delta.is_zero();
        if line_moved {
            market.apply_line_move(delta);
        }
        let new_line = market.current_line;

        txn.create_bet(bet);
        txn.update_market(market);
        txn.debit_user(&request.user_id, request.amount);

        match txn.commit().await {
            Ok(()) => Ok(Attempt::Committed(BetReceipt {
                bet_id,
                line,
                new_line,
                odds,
                potential_payout,
                line_moved,
            })),
            Err(StoreError::Conflict) => Ok(Attempt::Conflicted),
            Err(err) => Err(err.into()),
        }
    }

    // =========================================================================
    // Read-side queries
    // =========================================================================

    /// Market row, or a not-found rejection
    pub async fn market(&self, market_id: &str) -> Result<Market> {
        self.store.market(market_id).await?.ok_or_else(|| {
            BetError::MarketNotFound {
                market_id: market_id.to_string(),
            }
            .into()
        })
    }

    /// User row, or a not-found rejection
    pub async fn user(&self, user_id: &str) -> Result<User> {
        self.store.user(user_id).await?.ok_or_else(|| {
            BetError::UserNotFound {
                user_id: user_id.to_string(),
            }
            .into()
        })
    }

    /// All bets recorded against a market, oldest first
    pub async fn market_bets(&self, market_id: &str) -> Result<Vec<Bet>> {
        Ok(self.store.market_bets(market_id).await?)
    }

    /// Settlement math for a market under the given winner. Read-only: the
    /// resolution workflow owns status transitions and payouts.
    pub async fn settlement(
        &self,
        market_id: &str,
        winning_side: Side,
    ) -> Result<SettlementSummary> {
        let market = self.market(market_id).await?;
        let winning_money = market.pool(winning_side);
        let losing_money = market.pool(winning_side.opposite());

        Ok(SettlementSummary {
            market_id: market.id,
            winning_side,
            winning_money,
            losing_money,
            payout_owed: pricing::payout_owed(winning_money, market.vig_rate),
            house_profit: pricing::house_profit(
                market.over_money,
                market.under_money,
                winning_side,
                market.vig_rate,
            ),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MarketStatus;
    use crate::error::WagelineError;
    use crate::store::{MemoryStore, MockStore, MockStoreTxn, StoreTxn};
    use async_trait::async_trait;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn request(amount: Decimal) -> BetRequest {
        BetRequest {
            user_id: "u1".to_string(),
            market_id: "m1".to_string(),
            side: Side::Over,
            amount,
        }
    }

    async fn seeded_store() -> MemoryStore {
        let store = MemoryStore::new();
        store.seed_user(User::new("u1", "alice", dec!(500))).await;
        store
            .seed_market(Market::new("m1", "Wage over/under", dec!(25.00), dec!(0.1)))
            .await;
        store
    }

    #[tokio::test]
    async fn test_first_bet_locks_opening_price() {
        let store = seeded_store().await;
        let ledger = MarketLedger::new(Arc::new(store.clone()));

        let receipt = ledger.place_bet(&request(dec!(100))).await.unwrap();

        assert_eq!(receipt.odds, -110);
        assert_eq!(receipt.potential_payout.round_dp(2), dec!(190.91));
        assert_eq!(receipt.line, dec!(25.00));
        // 100/0 split: over share is 1.0, so the line steps up
        assert_eq!(receipt.new_line, dec!(25.50));
        assert!(receipt.line_moved);

        let market = store.market("m1").await.unwrap().unwrap();
        assert_eq!(market.over_money, dec!(100));
        assert_eq!(market.current_line, dec!(25.50));
        assert_eq!(store.user("u1").await.unwrap().unwrap().balance, dec!(400));
        assert_eq!(store.market_bets("m1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejections_by_kind() {
        let store = seeded_store().await;
        let ledger = MarketLedger::new(Arc::new(store.clone()));

        let err = ledger.place_bet(&request(dec!(0))).await.unwrap_err();
        assert!(matches!(
            err,
            WagelineError::Bet(BetError::InvalidInput(_))
        ));

        let mut req = request(dec!(50));
        req.user_id = "ghost".to_string();
        let err = ledger.place_bet(&req).await.unwrap_err();
        assert!(matches!(err, WagelineError::Bet(BetError::UserNotFound { .. })));

        let mut req = request(dec!(50));
        req.market_id = "ghost".to_string();
        let err = ledger.place_bet(&req).await.unwrap_err();
        assert!(matches!(
            err,
            WagelineError::Bet(BetError::MarketNotFound { .. })
        ));

        let err = ledger.place_bet(&request(dec!(500.01))).await.unwrap_err();
        assert!(matches!(
            err,
            WagelineError::Bet(BetError::InsufficientBalance { .. })
        ));

        let mut closed = Market::new("m2", "Closed", dec!(20.00), dec!(0.1));
        closed.status = MarketStatus::Resolved;
        store.seed_market(closed).await;
        let mut req = request(dec!(50));
        req.market_id = "m2".to_string();
        let err = ledger.place_bet(&req).await.unwrap_err();
        assert!(matches!(
            err,
            WagelineError::Bet(BetError::MarketNotActive { .. })
        ));

        // none of the rejections touched the ledger
        assert_eq!(store.bet_count().await, 0);
        assert_eq!(store.user("u1").await.unwrap().unwrap().balance, dec!(500));
    }

    #[tokio::test]
    async fn test_settlement_summary() {
        let store = seeded_store().await;
        store.seed_user(User::new("u2", "bob", dec!(2000))).await;
        let ledger = MarketLedger::new(Arc::new(store));

        let mut over = request(dec!(500));
        over.user_id = "u2".to_string();
        ledger.place_bet(&over).await.unwrap();
        ledger
            .place_bet(&BetRequest {
                user_id: "u2".to_string(),
                market_id: "m1".to_string(),
                side: Side::Under,
                amount: dec!(100),
            })
            .await
            .unwrap();

        let summary = ledger.settlement("m1", Side::Under).await.unwrap();
        assert_eq!(summary.winning_money, dec!(100));
        assert_eq!(summary.losing_money, dec!(500));
        assert_eq!(summary.payout_owed, dec!(90));
        assert_eq!(summary.house_profit, dec!(410));
    }

    /// Store wrapper that fails the first `n` commits with a conflict
    struct FlakyStore {
        inner: MemoryStore,
        conflicts_left: Arc<AtomicU32>,
    }

    #[async_trait]
    impl Store for FlakyStore {
        async fn transaction(&self) -> std::result::Result<Box<dyn StoreTxn>, StoreError> {
            Ok(Box::new(FlakyTxn {
                inner: self.inner.transaction().await?,
                conflicts_left: Arc::clone(&self.conflicts_left),
            }))
        }

        async fn user(&self, user_id: &str) -> std::result::Result<Option<User>, StoreError> {
            self.inner.user(user_id).await
        }

        async fn market(&self, market_id: &str) -> std::result::Result<Option<Market>, StoreError> {
            self.inner.market(market_id).await
        }

        async fn market_bets(&self, market_id: &str) -> std::result::Result<Vec<Bet>, StoreError> {
            self.inner.market_bets(market_id).await
        }
    }

    struct FlakyTxn {
        inner: Box<dyn StoreTxn>,
        conflicts_left: Arc<AtomicU32>,
    }

    #[async_trait]
    impl StoreTxn for FlakyTxn {
        async fn user(&mut self, user_id: &str) -> std::result::Result<Option<User>, StoreError> {
            self.inner.user(user_id).await
        }

        async fn market(&mut self, market_id: &str) -> std::result::Result<Option<Market>, StoreError> {
            self.inner.market(market_id).await
        }

        fn create_bet(&mut self, bet: Bet) {
            self.inner.create_bet(bet);
        }

        fn update_market(&mut self, market: Market) {
            self.inner.update_market(market);
        }

        fn debit_user(&mut self, user_id: &str, amount: Decimal) {
            self.inner.debit_user(user_id, amount);
        }

        async fn commit(&mut self) -> std::result::Result<(), StoreError> {
            let injected = self
                .conflicts_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if injected {
                return Err(StoreError::Conflict);
            }
            self.inner.commit().await
        }
    }

    #[tokio::test]
    async fn test_conflicted_commit_retries_and_lands() {
        let inner = seeded_store().await;
        let store = FlakyStore {
            inner: inner.clone(),
            conflicts_left: Arc::new(AtomicU32::new(1)),
        };
        let ledger = MarketLedger::new(Arc::new(store));

        let receipt = ledger.place_bet(&request(dec!(100))).await.unwrap();
        assert_eq!(receipt.odds, -110);
        assert_eq!(inner.bet_count().await, 1);
        assert_eq!(inner.user("u1").await.unwrap().unwrap().balance, dec!(400));
    }

    #[tokio::test]
    async fn test_conflict_exhaustion_surfaces_and_mutates_nothing() {
        let inner = seeded_store().await;
        let store = FlakyStore {
            inner: inner.clone(),
            conflicts_left: Arc::new(AtomicU32::new(u32::MAX)),
        };
        let ledger = MarketLedger::with_config(
            Arc::new(store),
            EngineConfig {
                max_commit_attempts: 3,
            },
        );

        let err = ledger.place_bet(&request(dec!(100))).await.unwrap_err();
        assert!(matches!(
            err,
            WagelineError::Bet(BetError::ConcurrencyConflict { attempts: 3 })
        ));
        assert_eq!(inner.bet_count().await, 0);
        assert_eq!(inner.user("u1").await.unwrap().unwrap().balance, dec!(500));
    }

    #[tokio::test]
    async fn test_backend_commit_failure_is_terminal() {
        let mut store = MockStore::new();
        store.expect_transaction().times(1).returning(|| {
            let mut txn = MockStoreTxn::new();
            txn.expect_user()
                .returning(|_| Ok(Some(User::new("u1", "alice", dec!(500)))));
            txn.expect_market().returning(|_| {
                Ok(Some(Market::new("m1", "Wage over/under", dec!(25.00), dec!(0.1))))
            });
            txn.expect_create_bet().return_const(());
            txn.expect_update_market().return_const(());
            txn.expect_debit_user().return_const(());
            txn.expect_commit()
                .times(1)
                .returning(|| Err(StoreError::Backend("backend unavailable".to_string())));
            Ok(Box::new(txn))
        });

        let ledger = MarketLedger::new(Arc::new(store));
        let err = ledger.place_bet(&request(dec!(100))).await.unwrap_err();
        assert!(matches!(
            err,
            WagelineError::Storage(StoreError::Backend(_))
        ));
    }
}
