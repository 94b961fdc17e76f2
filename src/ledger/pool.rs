use log::debug;

use super::address::Address;
use super::balances::AddressLedger;
use super::error::LedgerError;
use super::transaction::Transaction;

/// Ordered sequence of transactions admitted but not yet mined into a block
///
/// Admission checks the sender's committed balance as a point-in-time
/// snapshot; funds are not reserved across pending transactions, so several
/// admitted transfers from one sender can jointly exceed the balance the
/// next mining cycle reconciles against.
#[derive(Debug, Default)]
pub struct TransactionPool {
    transactions: Vec<Transaction>,
}

impl TransactionPool {
    /// Creates an empty pool
    pub fn new() -> Self {
        TransactionPool {
            transactions: Vec::new(),
        }
    }

    /// Admits a new transaction into the pool
    ///
    /// # Arguments
    ///
    /// * `sender` - The sender's address, or `None` for a mining reward
    /// * `recipient` - The recipient's address
    /// * `amount` - The amount to transfer, must be positive
    /// * `ledger` - The committed balances the admission check reads
    ///
    /// # Returns
    ///
    /// The admitted transaction
    pub fn submit(
        &mut self,
        sender: Option<Address>,
        recipient: Address,
        amount: u64,
        ledger: &AddressLedger,
    ) -> Result<Transaction, LedgerError> {
        if amount == 0 {
            return Err(LedgerError::InvalidAmount(
                "amount must be positive".to_string(),
            ));
        }

        if let Some(sender) = &sender {
            let available = ledger.balance_of(sender);
            if available < amount {
                return Err(LedgerError::InsufficientFunds {
                    required: amount,
                    available,
                });
            }
        }

        let transaction = match sender {
            Some(sender) => Transaction::new(sender, recipient, amount),
            None => Transaction::reward(recipient, amount),
        };

        debug!("Admitted transaction {} into the pool", transaction.id);
        self.transactions.push(transaction.clone());

        Ok(transaction)
    }

    /// Empties the pool and returns its prior contents in admission order
    pub fn drain_all(&mut self) -> Vec<Transaction> {
        std::mem::take(&mut self.transactions)
    }

    /// Puts transactions back at the front of the pool, keeping their order
    ///
    /// Used when a mining cycle fails after draining.
    pub fn restore(&mut self, mut transactions: Vec<Transaction>) {
        transactions.append(&mut self.transactions);
        self.transactions = transactions;
    }

    /// Number of pending transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Whether the pool is empty
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Returns a copy of the pending transactions
    pub fn snapshot(&self) -> Vec<Transaction> {
        self.transactions.clone()
    }
}
