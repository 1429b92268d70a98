use thiserror::Error;

/// Main error type for the wageline engine
#[derive(Error, Debug)]
pub enum WagelineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Bet placement rejections
    #[error("Bet rejected: {0}")]
    Bet(#[from] BetError),

    // Storage boundary errors
    #[error("Storage error: {0}")]
    Storage(#[from] StoreError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Validation errors
    #[error("Validation failed: {0}")]
    Validation(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Generic errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias for WagelineError
pub type Result<T> = std::result::Result<T, WagelineError>;

/// Rejection kinds for a single bet placement.
///
/// Every variant is terminal for the request except `ConcurrencyConflict`,
/// which the ledger only surfaces once its bounded commit retries are
/// exhausted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BetError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Market not found: {market_id}")]
    MarketNotFound { market_id: String },

    #[error("Market not active: {market_id} is {status}")]
    MarketNotActive { market_id: String, status: String },

    #[error("User not found: {user_id}")]
    UserNotFound { user_id: String },

    #[error("Insufficient balance: have {balance}, need {required}")]
    InsufficientBalance {
        balance: rust_decimal::Decimal,
        required: rust_decimal::Decimal,
    },

    #[error("Concurrent update conflict: placement abandoned after {attempts} attempts")]
    ConcurrencyConflict { attempts: u32 },
}

/// Errors surfaced by the storage boundary
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("Concurrent update detected at commit")]
    Conflict,

    #[error("Storage backend error: {0}")]
    Backend(String),
}
