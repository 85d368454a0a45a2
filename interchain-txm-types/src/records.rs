// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Persisted record formats and the status-change payload.

use crate::status::TransactionStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Record of a single-child transaction.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxRecord {
    pub status: TransactionStatus,
    /// Block height at which the transaction times out. `u64::MAX` means
    /// the transaction never expires.
    pub height: u64,
}

/// Aggregate record of a multi-child global transaction.
///
/// `children` is a `BTreeMap` so every iteration is in sorted key order;
/// observable output built from it is byte-identical on every replica.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct TxInfo {
    pub global_state: TransactionStatus,
    /// Timeout height, saturating like [`TxRecord::height`].
    pub height: u64,
    pub children: BTreeMap<String, TransactionStatus>,
    /// Declared number of child IBTPs. The global transaction can only
    /// reach a terminal state once all of them have registered.
    pub child_count: u64,
}

impl TxInfo {
    /// Child IBTP ids in sorted order.
    pub fn child_ids(&self) -> Vec<String> {
        self.children.keys().cloned().collect()
    }
}

/// Delta emitted from every mutating entry point. The dispatcher turns
/// this into rollback/commit messages for the source and destination
/// chains.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StatusChange {
    /// Global (or single-record) status before the call; `None` on first
    /// insert.
    pub prev_status: Option<TransactionStatus>,
    pub cur_status: TransactionStatus,
    /// All known child IBTP ids of the global transaction, sorted.
    pub child_ibtp_ids: Vec<String>,
    /// Children whose source chain must be notified.
    pub notify_src_ibtp_ids: Vec<String>,
    /// Children whose destination chain must be instructed to roll back.
    pub notify_dst_ibtp_ids: Vec<String>,
    /// True when this very call reported the failing child.
    pub is_fail_child_ibtp: bool,
}

impl StatusChange {
    /// Numeric sentinel used on the wire for "no previous status".
    pub const STATUS_NONE: i32 = -1;

    pub fn prev_code(&self) -> i32 {
        self.prev_status.map_or(Self::STATUS_NONE, |s| s.code())
    }

    pub fn encode(&self) -> Result<Vec<u8>, bcs::Error> {
        bcs::to_bytes(self)
    }

    pub fn decode(bytes: &[u8]) -> Result<Self, bcs::Error> {
        bcs::from_bytes(bytes)
    }
}
