use serde::{Deserialize, Serialize};

use persona_core::Address;

/// Deterministic instance factory.
///
/// Each deployment gets `BLAKE3("persona:create:" || factory || nonce)[..20]`
/// and bumps the nonce, so addresses depend only on deployment order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Factory {
    address: Address,
    nonce: u64,
}

impl Factory {
    pub fn new(address: Address) -> Self {
        Self { address, nonce: 0 }
    }

    /// Address of the factory itself.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Number of instances deployed so far.
    pub fn deployed(&self) -> u64 {
        self.nonce
    }

    /// Reserve the address of the next instance.
    pub fn next_address(&mut self) -> Address {
        let addr = Address::derive(
            "persona:create:",
            &[self.address.as_bytes(), &self.nonce.to_be_bytes()],
        );
        self.nonce += 1;
        addr
    }
}
