// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! The transaction-status lattice and the events that move it.

use num_enum::TryFromPrimitive;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Status of a child transaction or of a whole global transaction.
///
/// The numeric codes are part of the wire contract: `GetStatus` renders
/// them as ASCII decimal and destination relays embed them in proofs.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    TryFromPrimitive,
)]
#[repr(i32)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    #[default]
    Begin = 0,
    BeginFailure = 1,
    BeginRollback = 2,
    Success = 3,
    Failure = 4,
    Rollback = 5,
}

impl TransactionStatus {
    /// Terminal states never transition again.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure | Self::Rollback)
    }

    pub fn code(self) -> i32 {
        self as i32
    }
}

/// Events accepted by the transaction state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "snake_case")]
pub enum TransactionEvent {
    Begin,
    BeginFailure,
    Timeout,
    Failure,
    Success,
    Rollback,
    DstFailure,
    DstRollback,
}

/// IBTP packet types as they appear on the wire. Only the three receipt
/// codes are meaningful to the transaction manager.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, TryFromPrimitive,
)]
#[repr(i32)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum IbtpType {
    Interchain = 0,
    ReceiptSuccess = 1,
    ReceiptFailure = 2,
    ReceiptRollback = 3,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_are_stable() {
        // GetStatus payloads and relay proofs depend on these exact values.
        assert_eq!(TransactionStatus::Begin.code(), 0);
        assert_eq!(TransactionStatus::BeginFailure.code(), 1);
        assert_eq!(TransactionStatus::BeginRollback.code(), 2);
        assert_eq!(TransactionStatus::Success.code(), 3);
        assert_eq!(TransactionStatus::Failure.code(), 4);
        assert_eq!(TransactionStatus::Rollback.code(), 5);
    }

    #[test]
    fn status_from_code() {
        assert_eq!(
            TransactionStatus::try_from(3).unwrap(),
            TransactionStatus::Success
        );
        assert!(TransactionStatus::try_from(6).is_err());
        assert!(TransactionStatus::try_from(-1).is_err());
    }

    #[test]
    fn terminal_set() {
        assert!(TransactionStatus::Success.is_terminal());
        assert!(TransactionStatus::Failure.is_terminal());
        assert!(TransactionStatus::Rollback.is_terminal());
        assert!(!TransactionStatus::Begin.is_terminal());
        assert!(!TransactionStatus::BeginFailure.is_terminal());
        assert!(!TransactionStatus::BeginRollback.is_terminal());
    }

    #[test]
    fn display_matches_wire_names() {
        assert_eq!(TransactionStatus::BeginFailure.to_string(), "BEGIN_FAILURE");
        assert_eq!(TransactionEvent::DstRollback.to_string(), "dst_rollback");
        assert_eq!(IbtpType::ReceiptSuccess.to_string(), "RECEIPT_SUCCESS");
    }

    #[test]
    fn receipt_codes_are_stable() {
        assert_eq!(IbtpType::ReceiptSuccess as i32, 1);
        assert_eq!(IbtpType::ReceiptFailure as i32, 2);
        assert_eq!(IbtpType::ReceiptRollback as i32, 3);
    }
}
