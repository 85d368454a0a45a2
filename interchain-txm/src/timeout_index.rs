// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Height-keyed index of pending global transactions.
//!
//! For every height `h` the key `timeout-<h>` holds a comma-joined list
//! of global transaction ids whose deadline is `h`. The block scheduler
//! reads the list each block and feeds the expired ids back through
//! timeout handling. Entries keep insertion order, which is consensus
//! order and therefore identical on every replica.

use crate::host::{StateDelta, VmHost};

pub const TIMEOUT_PREFIX: &str = "timeout";

pub fn timeout_key(height: u64) -> String {
    format!("{}-{}", TIMEOUT_PREFIX, height)
}

fn parse(raw: &[u8]) -> Vec<String> {
    String::from_utf8_lossy(raw)
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Register `tx_id` as expiring at `height`. A height of `u64::MAX`
/// means the transaction never expires and is not indexed.
pub fn add_to_timeout_list<H: VmHost>(delta: &mut StateDelta<'_, H>, height: u64, tx_id: &str) {
    if height == u64::MAX {
        return;
    }
    let key = timeout_key(height);
    let mut list = delta.get(&key).map(|raw| parse(&raw)).unwrap_or_default();
    list.push(tx_id.to_string());
    delta.set(&key, list.join(",").into_bytes());
}

/// Drop the first occurrence of `tx_id` from the list at `height`.
/// Absent keys and missing ids are left alone; an emptied list is stored
/// as an empty string.
pub fn remove_from_timeout_list<H: VmHost>(
    delta: &mut StateDelta<'_, H>,
    height: u64,
    tx_id: &str,
) {
    let key = timeout_key(height);
    if let Some(raw) = delta.get(&key) {
        let mut list = parse(&raw);
        if let Some(index) = list.iter().position(|id| id == tx_id) {
            list.remove(index);
        }
        delta.set(&key, list.join(",").into_bytes());
    }
}

/// Global transaction ids whose deadline is `height`.
pub fn timeout_list<H: VmHost>(host: &H, height: u64) -> Vec<String> {
    host.get(&timeout_key(height))
        .map(|raw| parse(&raw))
        .unwrap_or_default()
}
