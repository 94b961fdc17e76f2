use chrono::Utc;
use log::warn;

use super::block::Block;
use super::error::LedgerError;

/// Append-only sequence of hash-linked blocks
///
/// Blocks arrive from the local miner only, so `append` checks linkage and
/// nothing else; `validate` is the full re-verification pass anything
/// untrusted would have to go through.
#[derive(Debug)]
pub struct Chain {
    blocks: Vec<Block>,
}

impl Chain {
    /// Creates a chain holding only the genesis block
    ///
    /// Genesis is hashed like any other block but accepted without the
    /// proof-of-work predicate; it is the trust anchor.
    pub fn new() -> Self {
        let mut genesis = Block::candidate(0, Utc::now(), Vec::new(), "0".to_string());
        genesis.hash = genesis.calculate_hash();

        Chain {
            blocks: vec![genesis],
        }
    }

    /// The most recently appended block
    pub fn latest(&self) -> &Block {
        self.blocks.last().expect("chain holds at least genesis")
    }

    /// Appends a mined block after checking linkage to the current tip
    pub fn append(&mut self, block: Block) -> Result<(), LedgerError> {
        let tip = self.latest();

        if block.previous_hash != tip.hash {
            return Err(LedgerError::InvalidBlock(format!(
                "previous hash {} does not match chain tip {}",
                block.previous_hash, tip.hash
            )));
        }

        self.blocks.push(block);
        Ok(())
    }

    /// Block at `index`, if within the chain
    pub fn at(&self, index: u64) -> Option<&Block> {
        self.blocks.get(index as usize)
    }

    /// Height of the chain (genesis is height 0)
    pub fn height(&self) -> u64 {
        self.blocks.len() as u64 - 1
    }

    /// All blocks in chain order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    /// Re-verifies the whole chain
    ///
    /// Recomputes every block's hash, checks the linkage between
    /// neighbours, and checks the proof-of-work predicate on every
    /// non-genesis block.
    ///
    /// # Returns
    ///
    /// true if the chain is valid, false otherwise
    pub fn validate(&self, difficulty: u32) -> bool {
        for i in 0..self.blocks.len() {
            let block = &self.blocks[i];

            if block.hash != block.calculate_hash() {
                warn!("Block {} stores a hash its contents do not produce", block.index);
                return false;
            }

            if i == 0 {
                if block.previous_hash != "0" {
                    warn!("Genesis block does not anchor to \"0\"");
                    return false;
                }
                continue;
            }

            if block.previous_hash != self.blocks[i - 1].hash {
                warn!("Block {} does not link to its predecessor", block.index);
                return false;
            }

            if !Block::meets_difficulty(&block.hash, difficulty) {
                warn!("Block {} does not meet difficulty {}", block.index, difficulty);
                return false;
            }
        }

        true
    }
}

impl Default for Chain {
    fn default() -> Self {
        Self::new()
    }
}
