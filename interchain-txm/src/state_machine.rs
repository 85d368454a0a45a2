// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Static transition table over the transaction-status lattice.
//!
//! The table is exhaustive: any (status, event) pair it does not list is
//! rejected, and the caller surfaces a state error without mutating
//! anything. The `begin` / `begin_failure` creation edges are realized by
//! record construction in the entry points; a stored record always starts
//! at BEGIN or BEGIN_FAILURE.

use interchain_txm_types::{IbtpType, TransactionEvent, TransactionStatus};

/// Destination status for `event` applied to `status`, or `None` when the
/// transition is illegal.
pub fn transition(
    status: TransactionStatus,
    event: TransactionEvent,
) -> Option<TransactionStatus> {
    use interchain_txm_types::TransactionEvent as E;
    use interchain_txm_types::TransactionStatus as S;

    match (status, event) {
        (S::Begin, E::BeginFailure) => Some(S::BeginFailure),
        (S::Begin, E::Success) => Some(S::Success),
        (S::Begin, E::Failure) => Some(S::Failure),
        (S::Begin, E::Timeout) => Some(S::BeginRollback),
        // Decisions taken by the destination relay, applied locally.
        (S::Begin, E::DstFailure) => Some(S::Failure),
        (S::Begin, E::DstRollback) => Some(S::Rollback),
        (S::BeginFailure, E::Failure) => Some(S::Failure),
        (S::BeginRollback, E::Rollback) => Some(S::Rollback),
        // A failure receipt arriving after the timeout still rolls back.
        (S::BeginRollback, E::Failure) => Some(S::Rollback),
        _ => None,
    }
}

/// Event triggered by an IBTP receipt code, if any. Receipt codes outside
/// the mapping (including `INTERCHAIN`) carry no event.
pub fn receipt_event(receipt: i32) -> Option<TransactionEvent> {
    match IbtpType::try_from(receipt).ok()? {
        IbtpType::ReceiptSuccess => Some(TransactionEvent::Success),
        IbtpType::ReceiptFailure => Some(TransactionEvent::Failure),
        IbtpType::ReceiptRollback => Some(TransactionEvent::Rollback),
        IbtpType::Interchain => None,
    }
}

/// Event triggered by a destination relay's decided status, if any.
pub fn dst_status_event(status: TransactionStatus) -> Option<TransactionEvent> {
    match status {
        TransactionStatus::BeginFailure => Some(TransactionEvent::DstFailure),
        TransactionStatus::BeginRollback => Some(TransactionEvent::DstRollback),
        _ => None,
    }
}
