// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Base address types for the relay chain's built-in contracts.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Relay-chain contract addresses are 20 bytes.
pub const CONTRACT_ADDRESS_LENGTH: usize = 20;

/// A relay-chain account/contract address.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct ContractAddress([u8; CONTRACT_ADDRESS_LENGTH]);

impl ContractAddress {
    pub const fn new(bytes: [u8; CONTRACT_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for ContractAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; CONTRACT_ADDRESS_LENGTH]> for ContractAddress {
    fn from(bytes: [u8; CONTRACT_ADDRESS_LENGTH]) -> Self {
        Self(bytes)
    }
}

/// Builds a built-in contract address: 19 zero bytes plus a tag byte.
const fn builtin_addr(tag: u8) -> ContractAddress {
    let mut bytes = [0u8; CONTRACT_ADDRESS_LENGTH];
    bytes[CONTRACT_ADDRESS_LENGTH - 1] = tag;
    ContractAddress(bytes)
}

/// The interchain dispatcher contract. Only this caller may mutate
/// transaction manager state.
pub const INTERCHAIN_CONTRACT_ADDR: ContractAddress = builtin_addr(0x0a);

/// The transaction manager's own contract address.
pub const TRANSACTION_MGR_CONTRACT_ADDR: ContractAddress = builtin_addr(0x0f);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_addresses_are_distinct() {
        assert_ne!(INTERCHAIN_CONTRACT_ADDR, TRANSACTION_MGR_CONTRACT_ADDR);
    }

    #[test]
    fn display_is_prefixed_hex() {
        assert_eq!(
            TRANSACTION_MGR_CONTRACT_ADDR.to_string(),
            "0x000000000000000000000000000000000000000f"
        );
        assert_eq!(
            INTERCHAIN_CONTRACT_ADDR.to_string(),
            "0x000000000000000000000000000000000000000a"
        );
    }

    #[test]
    fn bcs_round_trip() {
        let addr = ContractAddress::new([7u8; CONTRACT_ADDRESS_LENGTH]);
        let bytes = bcs::to_bytes(&addr).unwrap();
        let back: ContractAddress = bcs::from_bytes(&bytes).unwrap();
        assert_eq!(addr, back);
    }
}
