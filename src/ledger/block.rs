use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use super::transaction::Transaction;

/// Represents a block in the chain
///
/// A block is immutable once its hash has been accepted by the chain; the
/// nonce only changes while the miner is searching.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Block {
    /// Index of the block in the chain
    pub index: u64,

    /// Timestamp when the block was created
    #[schema(value_type = String, example = "2023-01-01T12:00:00Z")]
    pub timestamp: DateTime<Utc>,

    /// Transactions committed by this block, in application order
    pub transactions: Vec<Transaction>,

    /// Hash of the previous block ("0" for genesis)
    pub previous_hash: String,

    /// Nonce found by the proof-of-work search
    pub nonce: u64,

    /// Hash of the current block (computed last)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub hash: String,
}

impl Block {
    /// Creates a candidate block with nonce 0 and no hash yet
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the block in the chain
    /// * `timestamp` - The creation time of the block
    /// * `transactions` - The transactions to commit, in application order
    /// * `previous_hash` - The hash of the previous block
    ///
    /// # Returns
    ///
    /// A new Block instance awaiting mining
    pub fn candidate(
        index: u64,
        timestamp: DateTime<Utc>,
        transactions: Vec<Transaction>,
        previous_hash: String,
    ) -> Self {
        Block {
            index,
            timestamp,
            transactions,
            previous_hash,
            nonce: 0,
            hash: String::new(),
        }
    }

    /// Calculates the hash of the block
    ///
    /// The digest covers index, timestamp, transactions, previous hash and
    /// nonce. JSON object keys serialize in sorted order, so the pre-image
    /// is stable and re-verification reproduces the same digest.
    ///
    /// # Returns
    ///
    /// The SHA-256 hash of the block as a hexadecimal string
    pub fn calculate_hash(&self) -> String {
        let mut hasher = Sha256::new();

        // Convert the block fields to a JSON string
        let block_data = serde_json::json!({
            "index": self.index,
            "timestamp": self.timestamp,
            "transactions": self.transactions,
            "previous_hash": self.previous_hash,
            "nonce": self.nonce,
        });

        let block_string = serde_json::to_string(&block_data).unwrap();

        hasher.update(block_string.as_bytes());

        format!("{:x}", hasher.finalize())
    }

    /// Checks whether a hex digest carries the required leading zeros
    pub fn meets_difficulty(hash: &str, difficulty: u32) -> bool {
        hash.chars().take(difficulty as usize).all(|c| c == '0')
    }
}
