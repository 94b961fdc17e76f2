use std::sync::{Arc, Mutex};

use chrono::Utc;
use dashmap::DashMap;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::address::Address;
use super::balances::AddressLedger;
use super::block::Block;
use super::chain::Chain;
use super::error::LedgerError;
use super::miner::Miner;
use super::pool::TransactionPool;
use super::transaction::Transaction;
use super::user::User;

/// Tunables for the ledger engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Number of leading zero hex characters a block hash must carry
    pub difficulty: u32,

    /// Amount the per-block reward transaction credits to the miner
    pub mining_reward: u64,

    /// Amount credited to every newly registered user
    pub starting_allowance: u64,

    /// Upper bound on nonces tried per mining cycle
    pub max_mining_attempts: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            difficulty: 4,
            mining_reward: 100,
            starting_allowance: 1000,
            max_mining_attempts: 10_000_000,
        }
    }
}

/// Chain, pool and balances guarded together
///
/// One lock serializes pool admission, mining cycles and balance
/// application: admission always reads the committed balances, and no
/// caller observes a partially applied block.
#[derive(Debug)]
struct ChainState {
    chain: Chain,
    pool: TransactionPool,
    balances: AddressLedger,
}

/// Summary of the current chain state
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ChainInfo {
    /// Index of the latest block
    pub block_height: u64,

    /// Number of registered users
    pub total_users: usize,

    /// Number of transactions waiting in the pool
    pub pending_transactions: usize,

    /// The latest block
    pub latest_block: Block,
}

/// The ledger engine
///
/// Composition root over the chain, the pending pool, the balances and the
/// user registry. Cloning yields another handle onto the same state.
#[derive(Debug, Clone)]
pub struct LedgerEngine {
    state: Arc<Mutex<ChainState>>,
    users: Arc<DashMap<String, User>>,
    miner: Miner,
    config: EngineConfig,
}

impl LedgerEngine {
    /// Creates an engine with a fresh genesis block
    pub fn new(config: EngineConfig) -> Self {
        LedgerEngine {
            state: Arc::new(Mutex::new(ChainState {
                chain: Chain::new(),
                pool: TransactionPool::new(),
                balances: AddressLedger::new(),
            })),
            users: Arc::new(DashMap::new()),
            miner: Miner::new(config.difficulty, config.max_mining_attempts),
            config,
        }
    }

    /// Registers a new user and grants the starting allowance
    ///
    /// This and the mining reward are the only places funds are created.
    ///
    /// # Arguments
    ///
    /// * `username` - The unique username to register
    /// * `public_key` - The user's raw public key bytes
    ///
    /// # Returns
    ///
    /// The registered user record
    pub fn create_user(&self, username: &str, public_key: &[u8]) -> Result<User, LedgerError> {
        use dashmap::mapref::entry::Entry;

        let user = User::new(username.to_string(), public_key);

        match self.users.entry(username.to_string()) {
            Entry::Occupied(_) => {
                return Err(LedgerError::DuplicateUser(username.to_string()));
            }
            Entry::Vacant(entry) => {
                entry.insert(user.clone());
            }
        }

        self.state
            .lock()
            .unwrap()
            .balances
            .credit(&user.address, self.config.starting_allowance);

        info!(
            "Registered user {} with address {}",
            user.username, user.address
        );

        Ok(user)
    }

    /// Admits a transfer into the pending pool
    ///
    /// The sender's committed balance must cover the amount at admission
    /// time; pending transactions do not reserve funds.
    pub fn create_transaction(
        &self,
        sender: &Address,
        recipient: &Address,
        amount: u64,
    ) -> Result<Transaction, LedgerError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        state
            .pool
            .submit(Some(sender.clone()), recipient.clone(), amount, &state.balances)
    }

    /// Runs one mining cycle for `reward_address`
    ///
    /// Appends the reward transaction, drains the pool, searches for a
    /// nonce, appends the mined block and applies its transactions in
    /// block order. The state lock is held for the whole cycle; on a
    /// mining timeout the drained transactions go back into the pool and
    /// every balance stays as it was.
    ///
    /// # Returns
    ///
    /// The newly mined block
    pub fn mine(&self, reward_address: &Address) -> Result<Block, LedgerError> {
        let mut guard = self.state.lock().unwrap();
        let state = &mut *guard;

        state.pool.submit(
            None,
            reward_address.clone(),
            self.config.mining_reward,
            &state.balances,
        )?;

        let drained = state.pool.drain_all();
        let tip = state.chain.latest();
        let next_index = tip.index + 1;
        let previous_hash = tip.hash.clone();

        let block = match self
            .miner
            .mine(next_index, Utc::now(), drained.clone(), previous_hash)
        {
            Ok(block) => block,
            Err(err) => {
                // the reward is recreated on the next cycle
                let originals: Vec<Transaction> =
                    drained.into_iter().filter(|tx| !tx.is_reward()).collect();
                state.pool.restore(originals);
                return Err(err);
            }
        };

        state.chain.append(block.clone())?;
        Self::apply_block(&mut state.balances, &block);

        info!(
            "Mined block {} with nonce {} committing {} transactions",
            block.index,
            block.nonce,
            block.transactions.len()
        );

        Ok(block)
    }

    /// Applies a mined block's transactions to the balances in block order
    ///
    /// A transaction whose debit can no longer be covered (admission does
    /// not reserve funds across pending transfers) is skipped outright:
    /// neither side of the transfer happens.
    fn apply_block(balances: &mut AddressLedger, block: &Block) {
        for transaction in &block.transactions {
            if let Some(sender) = &transaction.sender {
                if let Err(err) = balances.debit(sender, transaction.amount) {
                    warn!(
                        "Skipping transaction {} in block {}: {}",
                        transaction.id, block.index, err
                    );
                    continue;
                }
            }

            balances.credit(&transaction.recipient, transaction.amount);
        }
    }

    /// Balance for an address, 0 when unknown
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.state.lock().unwrap().balances.balance_of(address)
    }

    /// Looks up a registered user by username
    pub fn user(&self, username: &str) -> Result<User, LedgerError> {
        self.users
            .get(username)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| LedgerError::NotFound(format!("user {}", username)))
    }

    /// All registered users
    pub fn users(&self) -> Vec<User> {
        self.users.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Snapshot of every block in chain order
    pub fn blocks(&self) -> Vec<Block> {
        self.state.lock().unwrap().chain.blocks().to_vec()
    }

    /// Block at `index`
    pub fn block_at(&self, index: u64) -> Result<Block, LedgerError> {
        self.state
            .lock()
            .unwrap()
            .chain
            .at(index)
            .cloned()
            .ok_or_else(|| LedgerError::NotFound(format!("block {}", index)))
    }

    /// Height of the chain
    pub fn height(&self) -> u64 {
        self.state.lock().unwrap().chain.height()
    }

    /// Pending transactions in admission order
    pub fn pending_transactions(&self) -> Vec<Transaction> {
        self.state.lock().unwrap().pool.snapshot()
    }

    /// Number of pending transactions
    pub fn pending_count(&self) -> usize {
        self.state.lock().unwrap().pool.len()
    }

    /// Runs the defensive full-chain validation
    pub fn is_valid(&self) -> bool {
        self.state
            .lock()
            .unwrap()
            .chain
            .validate(self.config.difficulty)
    }

    /// Summary of the chain state
    pub fn chain_info(&self) -> ChainInfo {
        let state = self.state.lock().unwrap();

        ChainInfo {
            block_height: state.chain.height(),
            total_users: self.users.len(),
            pending_transactions: state.pool.len(),
            latest_block: state.chain.latest().clone(),
        }
    }

}

impl Default for LedgerEngine {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // unit tests mine with a low difficulty so cycles stay fast; the
    // default difficulty is exercised once in test_default_config
    fn test_engine() -> LedgerEngine {
        LedgerEngine::new(EngineConfig {
            difficulty: 2,
            ..EngineConfig::default()
        })
    }

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();

        assert_eq!(config.difficulty, 4);
        assert_eq!(config.mining_reward, 100);
        assert_eq!(config.starting_allowance, 1000);
    }

    #[test]
    fn test_fresh_engine_holds_only_genesis() {
        let engine = test_engine();

        assert_eq!(engine.height(), 0);
        assert_eq!(engine.block_at(0).unwrap().previous_hash, "0");
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_create_user_grants_allowance() {
        let engine = test_engine();

        let alice = engine.create_user("alice", b"alice key").unwrap();

        assert_eq!(engine.balance_of(&alice.address), 1000);
        assert_eq!(engine.users().len(), 1);
        assert_eq!(engine.user("alice").unwrap().address, alice.address);
    }

    #[test]
    fn test_duplicate_username_is_rejected() {
        let engine = test_engine();

        engine.create_user("alice", b"first key").unwrap();
        let result = engine.create_user("alice", b"second key");

        assert!(matches!(result, Err(LedgerError::DuplicateUser(_))));
        assert_eq!(engine.users().len(), 1);
    }

    #[test]
    fn test_unknown_user_lookup() {
        let engine = test_engine();

        assert!(matches!(
            engine.user("nobody"),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_transfer_and_mine() {
        let engine = test_engine();
        let alice = engine.create_user("alice", b"alice key").unwrap();
        let bob = engine.create_user("bob", b"bob key").unwrap();

        engine
            .create_transaction(&alice.address, &bob.address, 300)
            .unwrap();
        assert_eq!(engine.pending_count(), 1);

        let block = engine.mine(&alice.address).unwrap();

        assert_eq!(block.index, 1);
        assert_eq!(block.transactions.len(), 2); // transfer + reward
        assert_eq!(engine.height(), 1);
        assert_eq!(engine.pending_count(), 0);
        assert_eq!(engine.balance_of(&alice.address), 800); // 1000 - 300 + 100
        assert_eq!(engine.balance_of(&bob.address), 1300);
    }

    #[test]
    fn test_overdraft_is_rejected_at_admission() {
        let engine = test_engine();
        let alice = engine.create_user("alice", b"alice key").unwrap();
        let bob = engine.create_user("bob", b"bob key").unwrap();

        let result = engine.create_transaction(&alice.address, &bob.address, 10_000);

        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                required: 10_000,
                available: 1000
            })
        ));
        assert_eq!(engine.pending_count(), 0);
    }

    #[test]
    fn test_mining_an_empty_pool_yields_a_reward_only_block() {
        let engine = test_engine();
        let miner = engine.create_user("miner", b"miner key").unwrap();

        let block = engine.mine(&miner.address).unwrap();

        assert_eq!(block.transactions.len(), 1);
        assert!(block.transactions[0].is_reward());
        assert_eq!(engine.height(), 1);
        assert_eq!(engine.balance_of(&miner.address), 1100);
    }

    #[test]
    fn test_chain_linkage_and_validity_across_blocks() {
        let engine = test_engine();
        let alice = engine.create_user("alice", b"alice key").unwrap();
        let bob = engine.create_user("bob", b"bob key").unwrap();

        engine
            .create_transaction(&alice.address, &bob.address, 100)
            .unwrap();
        engine.mine(&alice.address).unwrap();
        engine.mine(&bob.address).unwrap();

        let first = engine.block_at(1).unwrap();
        let second = engine.block_at(2).unwrap();

        assert_eq!(first.previous_hash, engine.block_at(0).unwrap().hash);
        assert_eq!(second.previous_hash, first.hash);
        assert!(engine.is_valid());
    }

    #[test]
    fn test_block_lookup_past_the_tip() {
        let engine = test_engine();

        assert!(matches!(
            engine.block_at(5),
            Err(LedgerError::NotFound(_))
        ));
    }

    #[test]
    fn test_mined_block_conserves_transferred_funds() {
        let engine = test_engine();
        let alice = engine.create_user("alice", b"alice key").unwrap();
        let bob = engine.create_user("bob", b"bob key").unwrap();

        engine
            .create_transaction(&alice.address, &bob.address, 250)
            .unwrap();
        engine
            .create_transaction(&bob.address, &alice.address, 50)
            .unwrap();

        let block = engine.mine(&alice.address).unwrap();

        let debits: u64 = block
            .transactions
            .iter()
            .filter(|tx| !tx.is_reward())
            .map(|tx| tx.amount)
            .sum();
        assert_eq!(debits, 300);

        // total supply = two allowances plus one mining reward
        let total = engine.balance_of(&alice.address) + engine.balance_of(&bob.address);
        assert_eq!(total, 2100);
    }

    #[test]
    fn test_jointly_overdrawing_admissions_reconcile_at_apply_time() {
        // admission checks the committed balance only, so two transfers of
        // 600 from a 1000 balance are both admitted; the second one is
        // skipped when the mined block is applied
        let engine = test_engine();
        let alice = engine.create_user("alice", b"alice key").unwrap();
        let bob = engine.create_user("bob", b"bob key").unwrap();
        let carol = engine.create_user("carol", b"carol key").unwrap();

        engine
            .create_transaction(&alice.address, &bob.address, 600)
            .unwrap();
        engine
            .create_transaction(&alice.address, &bob.address, 600)
            .unwrap();
        assert_eq!(engine.pending_count(), 2);

        let block = engine.mine(&carol.address).unwrap();

        assert_eq!(block.transactions.len(), 3); // both transfers + reward
        assert_eq!(engine.balance_of(&alice.address), 400); // one debit went through
        assert_eq!(engine.balance_of(&bob.address), 1600);
        assert_eq!(engine.balance_of(&carol.address), 1100);
    }

    #[test]
    fn test_mining_timeout_restores_the_pool() {
        let engine = LedgerEngine::new(EngineConfig {
            difficulty: 8,
            max_mining_attempts: 5,
            ..EngineConfig::default()
        });
        let alice = engine.create_user("alice", b"alice key").unwrap();
        let bob = engine.create_user("bob", b"bob key").unwrap();

        let admitted = engine
            .create_transaction(&alice.address, &bob.address, 10)
            .unwrap();

        let result = engine.mine(&alice.address);

        assert!(matches!(result, Err(LedgerError::MiningTimeout { .. })));
        assert_eq!(engine.height(), 0);
        assert_eq!(engine.balance_of(&alice.address), 1000);

        // the transfer is back in the pool, the reward is not
        let pending = engine.pending_transactions();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, admitted.id);
    }

    #[test]
    fn test_reads_are_idempotent() {
        let engine = test_engine();
        let alice = engine.create_user("alice", b"alice key").unwrap();

        engine.mine(&alice.address).unwrap();

        assert_eq!(
            engine.balance_of(&alice.address),
            engine.balance_of(&alice.address)
        );
        assert_eq!(engine.block_at(1).unwrap().hash, engine.block_at(1).unwrap().hash);
    }

    #[test]
    fn test_chain_info_summary() {
        let engine = test_engine();
        let alice = engine.create_user("alice", b"alice key").unwrap();
        let bob = engine.create_user("bob", b"bob key").unwrap();

        engine
            .create_transaction(&alice.address, &bob.address, 10)
            .unwrap();

        let info = engine.chain_info();

        assert_eq!(info.block_height, 0);
        assert_eq!(info.total_users, 2);
        assert_eq!(info.pending_transactions, 1);
        assert_eq!(info.latest_block.index, 0);
    }
}
