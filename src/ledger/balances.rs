use std::collections::HashMap;

use super::address::Address;
use super::error::LedgerError;

/// Balance accounting for every address
///
/// The sole source of truth for funds. Entries are created lazily on first
/// credit and read as zero while absent. All mutation happens under the
/// engine's state lock, serialized with pool admission checks.
#[derive(Debug, Default)]
pub struct AddressLedger {
    balances: HashMap<Address, u64>,
}

impl AddressLedger {
    /// Creates an empty ledger
    pub fn new() -> Self {
        AddressLedger {
            balances: HashMap::new(),
        }
    }

    /// Returns the balance for an address, 0 when unknown
    pub fn balance_of(&self, address: &Address) -> u64 {
        self.balances.get(address).copied().unwrap_or(0)
    }

    /// Increases an address balance
    pub fn credit(&mut self, address: &Address, amount: u64) {
        *self.balances.entry(address.clone()).or_insert(0) += amount;
    }

    /// Decreases an address balance
    ///
    /// Fails with `InsufficientFunds` when the balance cannot cover the
    /// amount; the balance is left untouched in that case.
    pub fn debit(&mut self, address: &Address, amount: u64) -> Result<(), LedgerError> {
        let balance = self.balances.entry(address.clone()).or_insert(0);

        if *balance < amount {
            return Err(LedgerError::InsufficientFunds {
                required: amount,
                available: *balance,
            });
        }

        *balance -= amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_address_reads_zero() {
        let ledger = AddressLedger::new();
        let address = Address::from_public_key(b"nobody");

        assert_eq!(ledger.balance_of(&address), 0);
    }

    #[test]
    fn test_credit_and_debit() {
        let mut ledger = AddressLedger::new();
        let address = Address::from_public_key(b"holder");

        ledger.credit(&address, 100);
        assert_eq!(ledger.balance_of(&address), 100);

        ledger.debit(&address, 40).unwrap();
        assert_eq!(ledger.balance_of(&address), 60);
    }

    #[test]
    fn test_debit_beyond_balance_fails() {
        let mut ledger = AddressLedger::new();
        let address = Address::from_public_key(b"holder");

        ledger.credit(&address, 50);

        let result = ledger.debit(&address, 51);
        assert!(matches!(
            result,
            Err(LedgerError::InsufficientFunds {
                required: 51,
                available: 50
            })
        ));

        // the failed debit must not have touched the balance
        assert_eq!(ledger.balance_of(&address), 50);
    }

    #[test]
    fn test_repeated_reads_are_identical() {
        let mut ledger = AddressLedger::new();
        let address = Address::from_public_key(b"holder");

        ledger.credit(&address, 7);

        assert_eq!(ledger.balance_of(&address), ledger.balance_of(&address));
    }
}
