// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Entry points of the interchain transaction manager contract.
//!
//! Five operations mutate state (`begin`, `begin_inter_relay`,
//! `begin_multi`, `report`, `handle_timeout`) and two read it
//! (`get_status`, `timeout_list`). Every mutating call runs behind the
//! dispatcher-only access guard, stages its writes in a [`StateDelta`],
//! and commits only after all checks pass. Every list placed in an
//! emitted [`StatusChange`] comes from sorted `BTreeMap` iteration, so
//! all validator replicas emit byte-identical payloads.

use crate::error::{TxmError, TxmResult};
use crate::host::{StateDelta, VmHost};
use crate::state_machine::{dst_status_event, receipt_event, transition};
use crate::timeout_index::{self, add_to_timeout_list, remove_from_timeout_list};
use interchain_txm_types::{
    IbtpType, RelayProof, StatusChange, TransactionEvent, TransactionStatus, TxInfo, TxRecord,
    INTERCHAIN_CONTRACT_ADDR,
};
use std::collections::BTreeMap;
use tracing::{debug, info};

pub const TX_PREFIX: &str = "tx";
pub const GLOBAL_TX_PREFIX: &str = "global-tx";

/// Key of a single-child transaction record.
pub fn tx_record_key(id: &str) -> String {
    format!("{}-{}", TX_PREFIX, id)
}

/// Key of a multi-child global transaction record.
pub fn global_tx_key(id: &str) -> String {
    format!("{}-{}", GLOBAL_TX_PREFIX, id)
}

/// The transaction manager contract, borrowing the VM host for the
/// duration of one invocation.
pub struct TransactionManager<'a, H: VmHost> {
    host: &'a mut H,
}

impl<'a, H: VmHost> TransactionManager<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        Self { host }
    }

    /// Start tracking a single-child transaction.
    ///
    /// A repeated `begin` on the same id overwrites the record;
    /// idempotency is the dispatcher's responsibility. Single-child
    /// records are not registered in the timeout index; their timeout
    /// handling is driven by the dispatcher.
    pub fn begin(
        &mut self,
        tx_id: &str,
        timeout_height: u64,
        is_failed: bool,
    ) -> TxmResult<StatusChange> {
        self.check_current_caller()?;
        let mut delta = StateDelta::new(self.host);

        let record = TxRecord {
            status: if is_failed {
                TransactionStatus::BeginFailure
            } else {
                TransactionStatus::Begin
            },
            height: effective_height(delta.current_height(), timeout_height),
        };
        delta.add_object(&tx_record_key(tx_id), &record)?;
        delta.commit();

        debug!("begin {}: {}", tx_id, record.status);
        Ok(StatusChange {
            prev_status: None,
            cur_status: record.status,
            ..Default::default()
        })
    }

    /// Start or advance a transaction that spans two relay chains.
    ///
    /// Without an existing record this behaves exactly like [`begin`].
    /// With one, `proof` carries the destination relay's decision and the
    /// record advances through `dst_failure` / `dst_rollback`.
    ///
    /// [`begin`]: TransactionManager::begin
    pub fn begin_inter_relay(
        &mut self,
        tx_id: &str,
        timeout_height: u64,
        proof: &[u8],
        is_failed: bool,
    ) -> TxmResult<StatusChange> {
        self.check_current_caller()?;
        let mut delta = StateDelta::new(self.host);
        let key = tx_record_key(tx_id);

        let change = if let Some(mut record) = delta.get_object::<TxRecord>(&key)? {
            let proof = RelayProof::decode(proof).map_err(|e| {
                TxmError::State(format!(
                    "unmarshal proof from dst relay for ibtp {} failed: {}",
                    tx_id, e
                ))
            })?;
            let prev = record.status;
            let next = dst_status_event(proof.tx_status)
                .and_then(|event| transition(prev, event))
                .ok_or_else(|| {
                    TxmError::State(format!(
                        "transaction {} with state {} get unexpected receipt {}",
                        tx_id,
                        prev,
                        proof.tx_status.code()
                    ))
                })?;
            record.status = next;
            delta.add_object(&key, &record)?;
            StatusChange {
                prev_status: Some(prev),
                cur_status: next,
                ..Default::default()
            }
        } else {
            let record = TxRecord {
                status: if is_failed {
                    TransactionStatus::BeginFailure
                } else {
                    TransactionStatus::Begin
                },
                height: effective_height(delta.current_height(), timeout_height),
            };
            delta.add_object(&key, &record)?;
            StatusChange {
                prev_status: None,
                cur_status: record.status,
                ..Default::default()
            }
        };

        delta.commit();
        debug!("begin inter-relay {}: {}", tx_id, change.cur_status);
        Ok(change)
    }

    /// Register a child IBTP of a multi-child global transaction.
    pub fn begin_multi(
        &mut self,
        global_id: &str,
        child_id: &str,
        timeout_height: u64,
        is_failed: bool,
        child_count: u64,
    ) -> TxmResult<StatusChange> {
        self.check_current_caller()?;
        let mut delta = StateDelta::new(self.host);
        let key = global_tx_key(global_id);
        let mut change = StatusChange::default();

        let tx_info = match delta.get_object::<TxInfo>(&key)? {
            None => {
                let mut tx_info = TxInfo {
                    global_state: TransactionStatus::Begin,
                    height: effective_height(delta.current_height(), timeout_height),
                    children: BTreeMap::new(),
                    child_count,
                };
                if is_failed {
                    tx_info
                        .children
                        .insert(child_id.to_string(), TransactionStatus::BeginFailure);
                    tx_info.global_state = TransactionStatus::BeginFailure;
                } else {
                    tx_info
                        .children
                        .insert(child_id.to_string(), TransactionStatus::Begin);
                    add_to_timeout_list(&mut delta, tx_info.height, global_id);
                }
                delta.add_object(&key, &tx_info)?;
                tx_info
            }
            Some(mut tx_info) => {
                if tx_info.children.contains_key(child_id) {
                    return Err(TxmError::ExistentChildTx {
                        child: child_id.to_string(),
                        global: global_id.to_string(),
                    });
                }
                if tx_info.global_state != TransactionStatus::Begin {
                    // A decided global transaction stamps its state onto
                    // children registered late.
                    let state = tx_info.global_state;
                    tx_info.children.insert(child_id.to_string(), state);
                } else if is_failed {
                    // Mass-fail. Children that already succeeded must
                    // additionally roll back on their destination chain;
                    // children still in BEGIN are handled through their own
                    // receipts.
                    for (id, status) in tx_info.children.iter() {
                        if *status == TransactionStatus::Success {
                            change.notify_dst_ibtp_ids.push(id.clone());
                        }
                        change.notify_src_ibtp_ids.push(id.clone());
                    }
                    for status in tx_info.children.values_mut() {
                        *status = TransactionStatus::BeginFailure;
                    }
                    tx_info
                        .children
                        .insert(child_id.to_string(), TransactionStatus::BeginFailure);
                    tx_info.global_state = TransactionStatus::BeginFailure;
                    remove_from_timeout_list(&mut delta, tx_info.height, global_id);
                } else {
                    tx_info
                        .children
                        .insert(child_id.to_string(), TransactionStatus::Begin);
                }
                delta.set_object(&key, &tx_info)?;
                tx_info
            }
        };

        // Reverse index so receipts can find the global transaction.
        delta.set(child_id, global_id.as_bytes().to_vec());

        change.cur_status = tx_info
            .children
            .get(child_id)
            .copied()
            .ok_or_else(|| TxmError::Internal(format!("lost child {} while registering", child_id)))?;
        change.child_ibtp_ids = tx_info.child_ids();
        delta.commit();

        info!(
            "begin multi tx {} of global tx {}: {} -> {}",
            child_id,
            global_id,
            change.prev_code(),
            change.cur_status
        );
        Ok(change)
    }

    /// Apply an IBTP receipt to a transaction.
    pub fn report(&mut self, tx_id: &str, receipt: i32) -> TxmResult<StatusChange> {
        self.check_current_caller()?;
        let mut delta = StateDelta::new(self.host);
        let record_key = tx_record_key(tx_id);
        let mut change = StatusChange::default();

        if let Some(mut record) = delta.get_object::<TxRecord>(&record_key)? {
            let prev = record.status;
            let next = receipt_event(receipt)
                .and_then(|event| transition(prev, event))
                .ok_or_else(|| {
                    TxmError::State(format!(
                        "transaction {} with state {} get unexpected receipt {}",
                        tx_id, prev, receipt
                    ))
                })?;
            record.status = next;
            delta.set_object(&record_key, &record)?;
            change.prev_status = Some(prev);
            change.cur_status = next;
        } else {
            let raw = delta
                .get(tx_id)
                .ok_or_else(|| TxmError::NonexistentTx(tx_id.to_string()))?;
            let global_id =
                String::from_utf8(raw).map_err(|e| TxmError::Internal(e.to_string()))?;
            let key = global_tx_key(&global_id);
            let mut tx_info = delta.get_object::<TxInfo>(&key)?.ok_or_else(|| {
                TxmError::NonexistentGlobalTx {
                    global: global_id.clone(),
                    child: tx_id.to_string(),
                }
            })?;
            if !tx_info.children.contains_key(tx_id) {
                return Err(TxmError::Internal(format!(
                    "{} is not in transaction {}, {:?}",
                    tx_id, global_id, tx_info
                )));
            }

            change.prev_status = Some(tx_info.global_state);
            change_multi_tx_status(
                &mut delta,
                &global_id,
                &mut tx_info,
                tx_id,
                receipt,
                &mut change,
            )?;
            change.cur_status = tx_info.global_state;

            // Source chains of all siblings learn about every receipt.
            for id in tx_info.children.keys() {
                if id != tx_id {
                    change.notify_src_ibtp_ids.push(id.clone());
                }
            }
            change.child_ibtp_ids = tx_info.child_ids();
            delta.set_object(&key, &tx_info)?;
            info!(
                "report {} of global tx {}: {} -> {}",
                tx_id,
                global_id,
                change.prev_code(),
                change.cur_status
            );
        }

        delta.commit();
        Ok(change)
    }

    /// Current status of a transaction by child id, global id, or
    /// reverse-indexed child id. Unrestricted.
    pub fn get_status(&self, tx_id: &str) -> TxmResult<TransactionStatus> {
        if let Some(bytes) = self.host.get(&tx_record_key(tx_id)) {
            let record: TxRecord = bcs::from_bytes(&bytes)?;
            return Ok(record.status);
        }
        if let Some(bytes) = self.host.get(&global_tx_key(tx_id)) {
            let tx_info: TxInfo = bcs::from_bytes(&bytes)?;
            return Ok(tx_info.global_state);
        }
        let raw = self
            .host
            .get(tx_id)
            .ok_or_else(|| TxmError::NonexistentGlobalId(tx_id.to_string()))?;
        let global_id = String::from_utf8(raw).map_err(|e| TxmError::Internal(e.to_string()))?;
        let bytes = self.host.get(&global_tx_key(&global_id)).ok_or_else(|| {
            TxmError::NonexistentGlobalTx {
                global: global_id.clone(),
                child: tx_id.to_string(),
            }
        })?;
        let tx_info: TxInfo = bcs::from_bytes(&bytes)?;
        Ok(tx_info.global_state)
    }

    /// ASCII-decimal status code, the form returned on the wire.
    pub fn get_status_payload(&self, tx_id: &str) -> TxmResult<String> {
        Ok(self.get_status(tx_id)?.code().to_string())
    }

    /// Apply the block-height timeout to a transaction whose deadline has
    /// passed. For a global transaction every child still in BEGIN moves
    /// to BEGIN_ROLLBACK with it, and the entry leaves the timeout index.
    pub fn handle_timeout(&mut self, tx_id: &str) -> TxmResult<StatusChange> {
        self.check_current_caller()?;
        let mut delta = StateDelta::new(self.host);
        let record_key = tx_record_key(tx_id);
        let mut change = StatusChange::default();

        if let Some(mut record) = delta.get_object::<TxRecord>(&record_key)? {
            let prev = record.status;
            let next = transition(prev, TransactionEvent::Timeout).ok_or_else(|| {
                TxmError::State(format!(
                    "transaction {} with state {} get unexpected event {}",
                    tx_id,
                    prev,
                    TransactionEvent::Timeout
                ))
            })?;
            record.status = next;
            delta.set_object(&record_key, &record)?;
            change.prev_status = Some(prev);
            change.cur_status = next;
        } else {
            let key = global_tx_key(tx_id);
            let mut tx_info = delta
                .get_object::<TxInfo>(&key)?
                .ok_or_else(|| TxmError::NonexistentTx(tx_id.to_string()))?;
            let prev = tx_info.global_state;
            let next = transition(prev, TransactionEvent::Timeout).ok_or_else(|| {
                TxmError::State(format!(
                    "global tx {} with state {} get unexpected event {}",
                    tx_id,
                    prev,
                    TransactionEvent::Timeout
                ))
            })?;
            tx_info.global_state = next;
            for status in tx_info.children.values_mut() {
                if *status == TransactionStatus::Begin {
                    *status = TransactionStatus::BeginRollback;
                }
            }
            remove_from_timeout_list(&mut delta, tx_info.height, tx_id);
            change.prev_status = Some(prev);
            change.cur_status = next;
            change.notify_src_ibtp_ids = tx_info.child_ids();
            change.child_ibtp_ids = tx_info.child_ids();
            delta.set_object(&key, &tx_info)?;
        }

        delta.commit();
        info!("timeout {}: {} -> {}", tx_id, change.prev_code(), change.cur_status);
        Ok(change)
    }

    /// Global transaction ids whose deadline is `height`. Unrestricted;
    /// the block scheduler reads this each block and feeds the ids back
    /// through [`handle_timeout`].
    ///
    /// [`handle_timeout`]: TransactionManager::handle_timeout
    pub fn timeout_list(&self, height: u64) -> Vec<String> {
        timeout_index::timeout_list(&*self.host, height)
    }

    fn check_current_caller(&self) -> TxmResult<()> {
        let caller = self.host.current_caller();
        if caller != INTERCHAIN_CONTRACT_ADDR {
            return Err(TxmError::NoPermission(caller.to_string()));
        }
        Ok(())
    }
}

/// Timeout height for a record created now. `timeout_height == 0` or an
/// overflowing sum both mean "never expires".
fn effective_height(current: u64, timeout_height: u64) -> u64 {
    if timeout_height == 0 || timeout_height >= u64::MAX - current {
        u64::MAX
    } else {
        current + timeout_height
    }
}

/// Apply a receipt to one child of a multi-child transaction and
/// recompute the global state.
fn change_multi_tx_status<H: VmHost>(
    delta: &mut StateDelta<'_, H>,
    global_id: &str,
    tx_info: &mut TxInfo,
    tx_id: &str,
    receipt: i32,
    change: &mut StatusChange,
) -> TxmResult<()> {
    if tx_info.global_state == TransactionStatus::Begin
        && receipt == IbtpType::ReceiptFailure as i32
    {
        // Fast-fail: the first failing child decides the aggregate.
        // Capture which siblings had already succeeded before the flip;
        // only those need a destination-chain rollback.
        change.is_fail_child_ibtp = true;
        for (id, status) in tx_info.children.iter() {
            if id != tx_id && *status == TransactionStatus::Success {
                change.notify_dst_ibtp_ids.push(id.clone());
            }
        }
        for status in tx_info.children.values_mut() {
            *status = TransactionStatus::BeginFailure;
        }
        tx_info
            .children
            .insert(tx_id.to_string(), TransactionStatus::Failure);
        tx_info.global_state = TransactionStatus::BeginFailure;
        remove_from_timeout_list(delta, tx_info.height, global_id);
        debug!("fast-fail of global tx {} triggered by {}", global_id, tx_id);
        return Ok(());
    }

    let status = tx_info
        .children
        .get(tx_id)
        .copied()
        .ok_or_else(|| TxmError::Internal(format!("{} is not in transaction {}", tx_id, global_id)))?;
    let event = receipt_event(receipt).ok_or_else(|| {
        TxmError::State(format!(
            "child tx {} with state {} get unexpected receipt {}",
            tx_id, status, receipt
        ))
    })?;
    let next = transition(status, event).ok_or_else(|| {
        TxmError::State(format!(
            "child tx {} with state {} get unexpected receipt {}",
            tx_id, status, receipt
        ))
    })?;
    tx_info.children.insert(tx_id.to_string(), next);

    if is_multi_tx_finished(next, tx_info) {
        let next_global = transition(tx_info.global_state, event).ok_or_else(|| {
            TxmError::State(format!(
                "global tx of child tx {} with state {} get unexpected receipt {}",
                tx_id, tx_info.global_state, receipt
            ))
        })?;
        tx_info.global_state = next_global;
        remove_from_timeout_list(delta, tx_info.height, global_id);
    }
    Ok(())
}

/// True once every declared child has registered and all of them share
/// `child_status`.
fn is_multi_tx_finished(child_status: TransactionStatus, tx_info: &TxInfo) -> bool {
    tx_info.children.len() as u64 == tx_info.child_count
        && tx_info.children.values().all(|s| *s == child_status)
}
