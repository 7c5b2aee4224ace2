use thiserror::Error;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("The chain is invalid: block {index} {reason}")]
    InvalidChain { index: u64, reason: String },

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: f64, available: f64 },

    #[error("amount must be finite, got {amount}")]
    InvalidAmount { amount: f64 },

    #[error("persistence failure: {0:#}")]
    Persistence(#[source] anyhow::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("corrupt store: {0}")]
    Corrupt(String),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
