use thiserror::Error;

/// Errors that can occur during ledger operations
///
/// Every variant is recoverable and surfaced to the caller as-is; the
/// engine performs no retries of its own.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Username already taken: {0}")]
    DuplicateUser(String),

    #[error("Insufficient funds: required {required}, available {available}")]
    InsufficientFunds { required: u64, available: u64 },

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid block: {0}")]
    InvalidBlock(String),

    #[error("Mining gave up after {attempts} attempts at difficulty {difficulty}")]
    MiningTimeout { attempts: u64, difficulty: u32 },
}
