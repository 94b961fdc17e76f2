use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use utoipa::ToSchema;

use std::fmt;

/// Number of hex characters an address keeps from the hashed public key
pub const ADDRESS_LENGTH: usize = 40;

/// Represents an account address (truncated SHA-256 of a public key, hex)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct Address(pub String);

impl Address {
    /// Derives an address from raw public key bytes
    ///
    /// The derivation is a one-way hash truncated to a fixed prefix.
    /// Collisions are possible and not checked.
    pub fn from_public_key(public_key: &[u8]) -> Self {
        let digest = Sha256::digest(public_key);
        let mut encoded = hex::encode(digest);
        encoded.truncate(ADDRESS_LENGTH);

        Address(encoded)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_derivation() {
        let address = Address::from_public_key(b"some public key bytes");

        assert_eq!(address.0.len(), ADDRESS_LENGTH);
        assert!(address.0.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let first = Address::from_public_key(b"same key");
        let second = Address::from_public_key(b"same key");

        assert_eq!(first, second);
    }

    #[test]
    fn test_different_keys_yield_different_addresses() {
        let first = Address::from_public_key(b"key one");
        let second = Address::from_public_key(b"key two");

        assert_ne!(first, second);
    }
}
