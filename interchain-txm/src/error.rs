// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Typed errors returned from transaction manager entry points.
//!
//! Every variant carries a stable numeric code that is part of the
//! contract's wire interface; codes never change once assigned.

use thiserror::Error;

/// Result type for transaction manager operations.
pub type TxmResult<T> = Result<T, TxmError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TxmError {
    /// The caller is not the interchain dispatcher.
    #[error("current caller {0} is not allowed")]
    NoPermission(String),

    /// A KV invariant broke or (de)serialization failed.
    #[error("{0}")]
    Internal(String),

    /// Proof decode failure or illegal state-machine transition. The
    /// message names the offending transaction and the current/attempted
    /// states so the dispatcher can log meaningfully.
    #[error("{0}")]
    State(String),

    #[error("child tx {child} of global tx {global} exists")]
    ExistentChildTx { child: String, global: String },

    #[error("transaction id {0} does not exist")]
    NonexistentTx(String),

    #[error("global tx {global} of child tx {child} does not exist")]
    NonexistentGlobalTx { global: String, child: String },

    #[error("cannot get global id of child tx id {0}")]
    NonexistentGlobalId(String),
}

impl TxmError {
    /// Stable error code exposed to callers.
    pub fn code(&self) -> u32 {
        match self {
            TxmError::NoPermission(_) => 2160001,
            TxmError::Internal(_) => 2160002,
            TxmError::State(_) => 2160003,
            TxmError::ExistentChildTx { .. } => 2160004,
            TxmError::NonexistentTx(_) => 2160005,
            TxmError::NonexistentGlobalTx { .. } => 2160006,
            TxmError::NonexistentGlobalId(_) => 2160007,
        }
    }

    /// Short label for metrics and log filtering.
    pub fn error_type(&self) -> &'static str {
        match self {
            TxmError::NoPermission(_) => "no_permission",
            TxmError::Internal(_) => "internal",
            TxmError::State(_) => "state_err",
            TxmError::ExistentChildTx { .. } => "existent_child_tx",
            TxmError::NonexistentTx(_) => "nonexistent_tx",
            TxmError::NonexistentGlobalTx { .. } => "nonexistent_global_tx",
            TxmError::NonexistentGlobalId(_) => "nonexistent_global_id",
        }
    }
}

impl From<bcs::Error> for TxmError {
    fn from(e: bcs::Error) -> Self {
        TxmError::Internal(e.to_string())
    }
}
