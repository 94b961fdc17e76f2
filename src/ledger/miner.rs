use chrono::{DateTime, Utc};
use log::debug;

use super::block::Block;
use super::error::LedgerError;
use super::transaction::Transaction;

/// Brute-force proof-of-work search over the block nonce
///
/// Pure with respect to ledger state: the miner only sees the candidate
/// fields and returns a sealed block. Difficulty is static for the engine's
/// lifetime. The attempt cap turns a misconfigured difficulty into a
/// `MiningTimeout` instead of an unbounded spin.
#[derive(Debug, Clone)]
pub struct Miner {
    difficulty: u32,
    max_attempts: u64,
}

impl Miner {
    /// Creates a miner for a fixed difficulty and attempt cap
    pub fn new(difficulty: u32, max_attempts: u64) -> Self {
        Miner {
            difficulty,
            max_attempts,
        }
    }

    /// Mines a block from the candidate fields
    ///
    /// # Arguments
    ///
    /// * `index` - The index of the new block
    /// * `timestamp` - The creation time of the new block
    /// * `transactions` - The transactions to commit, in application order
    /// * `previous_hash` - The hash of the chain tip
    ///
    /// # Returns
    ///
    /// The mined block carrying the winning nonce and hash
    pub fn mine(
        &self,
        index: u64,
        timestamp: DateTime<Utc>,
        transactions: Vec<Transaction>,
        previous_hash: String,
    ) -> Result<Block, LedgerError> {
        let mut block = Block::candidate(index, timestamp, transactions, previous_hash);

        for attempt in 0..self.max_attempts {
            let hash = block.calculate_hash();

            if Block::meets_difficulty(&hash, self.difficulty) {
                debug!(
                    "Found nonce {} for block {} after {} attempts",
                    block.nonce,
                    block.index,
                    attempt + 1
                );
                block.hash = hash;
                return Ok(block);
            }

            block.nonce += 1;
        }

        Err(LedgerError::MiningTimeout {
            attempts: self.max_attempts,
            difficulty: self.difficulty,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::Address;

    #[test]
    fn test_mined_block_meets_difficulty() {
        let miner = Miner::new(2, 1_000_000);
        let transactions = vec![Transaction::reward(Address::from_public_key(b"miner"), 100)];

        let block = miner
            .mine(1, Utc::now(), transactions, "prev".to_string())
            .unwrap();

        assert!(block.hash.starts_with("00"));
        assert_eq!(block.index, 1);
        assert_eq!(block.previous_hash, "prev");
    }

    #[test]
    fn test_stored_hash_matches_recomputation() {
        let miner = Miner::new(2, 1_000_000);

        let block = miner
            .mine(1, Utc::now(), Vec::new(), "prev".to_string())
            .unwrap();

        assert_eq!(block.hash, block.calculate_hash());
    }

    #[test]
    fn test_attempt_cap_surfaces_timeout() {
        // 8 leading zeros within 5 attempts is effectively impossible
        let miner = Miner::new(8, 5);

        let result = miner.mine(1, Utc::now(), Vec::new(), "prev".to_string());

        assert!(matches!(
            result,
            Err(LedgerError::MiningTimeout {
                attempts: 5,
                difficulty: 8
            })
        ));
    }
}
