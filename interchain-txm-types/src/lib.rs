// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Shared types for the interchain transaction manager.
//!
//! Everything that crosses the contract boundary lives here: the
//! transaction-status lattice, wire receipt codes, the persisted record
//! formats, the status-change payload returned from every mutating call,
//! and the destination-relay proof. All persisted and emitted types use
//! bcs, which is canonical and length-prefixed, so every validator replica
//! serializes byte-identical output.

pub mod base_types;
pub mod proof;
pub mod records;
pub mod status;

pub use base_types::{
    ContractAddress, CONTRACT_ADDRESS_LENGTH, INTERCHAIN_CONTRACT_ADDR,
    TRANSACTION_MGR_CONTRACT_ADDR,
};
pub use proof::RelayProof;
pub use records::{StatusChange, TxInfo, TxRecord};
pub use status::{IbtpType, TransactionEvent, TransactionStatus};
