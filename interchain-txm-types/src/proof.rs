// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Destination-relay proof attached to inter-relay begin calls.

use crate::status::TransactionStatus;
use serde::{Deserialize, Serialize};

/// Decision of the destination relay about a transaction, forwarded by
/// the dispatcher. The transaction manager only reads `tx_status`; the
/// aggregated signature is verified upstream.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RelayProof {
    pub tx_status: TransactionStatus,
    pub multi_sign: Vec<Vec<u8>>,
}

impl RelayProof {
    pub fn encode(&self) -> Result<Vec<u8>, bcs::Error> {
        bcs::to_bytes(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bcs::Error> {
        bcs::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode() {
        let proof = RelayProof {
            tx_status: TransactionStatus::BeginRollback,
            multi_sign: vec![vec![1, 2, 3], vec![4, 5]],
        };
        let bytes = proof.encode().unwrap();
        assert_eq!(RelayProof::decode(&bytes).unwrap(), proof);
    }

    #[test]
    fn garbage_fails_to_decode() {
        assert!(RelayProof::decode(&[0xff, 0xff, 0xff, 0xff, 0xff]).is_err());
    }
}
