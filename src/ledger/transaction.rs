use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use super::address::Address;

/// Represents a balance transfer committed to (or waiting for) a block
///
/// Immutable once created. A transaction without a sender is a
/// system-minted mining reward: it credits the recipient with no debit.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Transaction {
    /// Unique identifier for the transaction
    pub id: String,

    /// Sender's address; `None` marks a system-minted reward
    pub sender: Option<Address>,

    /// Recipient's address
    pub recipient: Address,

    /// Amount being transferred
    pub amount: u64,

    /// Timestamp when the transaction was created
    #[schema(value_type = String, example = "2023-01-01T12:00:00Z")]
    pub timestamp: DateTime<Utc>,
}

impl Transaction {
    /// Creates a new transfer between two addresses
    ///
    /// # Arguments
    ///
    /// * `sender` - The address of the sender
    /// * `recipient` - The address of the recipient
    /// * `amount` - The amount to transfer
    ///
    /// # Returns
    ///
    /// A new Transaction instance
    pub fn new(sender: Address, recipient: Address, amount: u64) -> Self {
        Transaction {
            id: Uuid::new_v4().to_string(),
            sender: Some(sender),
            recipient,
            amount,
            timestamp: Utc::now(),
        }
    }

    /// Creates a new mining reward transaction
    ///
    /// # Arguments
    ///
    /// * `recipient` - The address of the miner
    /// * `amount` - The reward amount
    ///
    /// # Returns
    ///
    /// A new Transaction instance with no sender
    pub fn reward(recipient: Address, amount: u64) -> Self {
        Transaction {
            id: Uuid::new_v4().to_string(),
            sender: None,
            recipient,
            amount,
            timestamp: Utc::now(),
        }
    }

    /// Checks if the transaction is a system-minted reward
    pub fn is_reward(&self) -> bool {
        self.sender.is_none()
    }
}
