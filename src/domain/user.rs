use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A bettor account. The balance is mutated only through the ledger's
/// placement commit (debit) and the external settlement workflow (credit),
/// and never goes negative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub balance: Decimal,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(id: &str, name: &str, balance: Decimal) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            balance,
            created_at: Utc::now(),
        }
    }

    /// Check the balance covers a stake
    pub fn can_cover(&self, stake: Decimal) -> bool {
        self.balance >= stake
    }

    /// Debit a committed stake
    pub fn debit(&mut self, amount: Decimal) {
        self.balance -= amount;
    }
}
