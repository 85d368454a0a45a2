// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! In-memory VM host for tests.

use crate::host::VmHost;
use interchain_txm_types::{ContractAddress, INTERCHAIN_CONTRACT_ADDR};
use std::collections::BTreeMap;

/// Test double for the contract VM: a plain map plus the two oracles,
/// mirroring the invocation context the real host injects per call.
pub struct MemHost {
    kv: BTreeMap<String, Vec<u8>>,
    caller: ContractAddress,
    height: u64,
    write_count: usize,
}

impl MemHost {
    /// Host at height 100 with the dispatcher as caller.
    pub fn new() -> Self {
        Self {
            kv: BTreeMap::new(),
            caller: INTERCHAIN_CONTRACT_ADDR,
            height: 100,
            write_count: 0,
        }
    }

    pub fn set_caller(&mut self, caller: ContractAddress) {
        self.caller = caller;
    }

    pub fn set_height(&mut self, height: u64) {
        self.height = height;
    }

    /// Number of `set` calls observed, for no-partial-write assertions.
    pub fn write_count(&self) -> usize {
        self.write_count
    }

    /// Copy of the full store, for before/after comparisons.
    pub fn snapshot(&self) -> BTreeMap<String, Vec<u8>> {
        self.kv.clone()
    }
}

impl Default for MemHost {
    fn default() -> Self {
        Self::new()
    }
}

impl VmHost for MemHost {
    fn get(&self, key: &str) -> Option<Vec<u8>> {
        self.kv.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Vec<u8>) {
        self.write_count += 1;
        self.kv.insert(key.to_string(), value);
    }

    fn current_height(&self) -> u64 {
        self.height
    }

    fn current_caller(&self) -> ContractAddress {
        self.caller
    }
}

/// Install a fmt subscriber so `RUST_LOG`-style filtering works in tests.
pub fn init_for_testing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_test_writer()
        .try_init();
}
