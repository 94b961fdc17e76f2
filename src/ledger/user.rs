use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::address::Address;

/// A registered account holder
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    /// Unique username the user registered with
    pub username: String,

    /// Address derived from the user's public key
    pub address: Address,

    /// Hex-encoded public key bytes
    pub public_key: String,

    /// Timestamp when the user registered
    #[schema(value_type = String, example = "2023-01-01T12:00:00Z")]
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Creates a user record with the address derived from the public key
    pub fn new(username: String, public_key: &[u8]) -> Self {
        User {
            username,
            address: Address::from_public_key(public_key),
            public_key: hex::encode(public_key),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_user() {
        let user = User::new("alice".to_string(), b"alice public key");

        assert_eq!(user.username, "alice");
        assert_eq!(user.address, Address::from_public_key(b"alice public key"));
        assert_eq!(user.public_key, hex::encode(b"alice public key"));
    }
}
