// Ledger module
//
// This module contains the core ledger engine implementation including:
// - Address derivation
// - Transaction and block structures
// - Hash-chained block sequence
// - Pending transaction pool
// - Proof of work miner
// - Balance accounting and user registry
// - The engine orchestrating all of the above

pub mod address;
pub mod balances;
pub mod block;
pub mod chain;
pub mod engine;
pub mod error;
pub mod miner;
pub mod pool;
pub mod transaction;
pub mod user;

// Re-export main components for easier access
pub use address::Address;
pub use block::Block;
pub use engine::{ChainInfo, EngineConfig, LedgerEngine};
pub use error::LedgerError;
pub use transaction::Transaction;
pub use user::User;
