// Copyright (c) Starcoin, Inc.
// SPDX-License-Identifier: Apache-2.0

//! VM host abstraction and staged writes.
//!
//! The contract never touches storage directly. The host hands it a
//! transactional KV snapshot plus two read-only oracles (current block
//! height, current caller), and the contract batches every mutation in a
//! [`StateDelta`] that is committed only on the success path. A call that
//! fails any check after intermediate computation therefore issues no KV
//! write at all.

use crate::error::TxmResult;
use interchain_txm_types::ContractAddress;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;

/// Interface the contract VM provides to the transaction manager.
pub trait VmHost {
    /// Read a key from the snapshot. `None` when absent.
    fn get(&self, key: &str) -> Option<Vec<u8>>;

    /// Overwrite a key.
    fn set(&mut self, key: &str, value: Vec<u8>);

    /// First-time write. Functionally identical to [`VmHost::set`];
    /// hosts may distinguish the two for auditing.
    fn add(&mut self, key: &str, value: Vec<u8>) {
        self.set(key, value);
    }

    /// Height of the block currently being executed.
    fn current_height(&self) -> u64;

    /// Address of the contract that invoked the current call.
    fn current_caller(&self) -> ContractAddress;
}

enum StagedWrite {
    Add(Vec<u8>),
    Set(Vec<u8>),
}

impl StagedWrite {
    fn value(&self) -> &[u8] {
        match self {
            StagedWrite::Add(v) | StagedWrite::Set(v) => v,
        }
    }
}

/// Write batch over a [`VmHost`] snapshot.
///
/// Reads see staged writes first and fall through to the host. `commit`
/// flushes staged entries in sorted key order, so the write sequence is
/// identical on every replica.
pub struct StateDelta<'a, H: VmHost> {
    host: &'a mut H,
    staged: BTreeMap<String, StagedWrite>,
}

impl<'a, H: VmHost> StateDelta<'a, H> {
    pub fn new(host: &'a mut H) -> Self {
        Self {
            host,
            staged: BTreeMap::new(),
        }
    }

    pub fn get(&self, key: &str) -> Option<Vec<u8>> {
        if let Some(write) = self.staged.get(key) {
            return Some(write.value().to_vec());
        }
        self.host.get(key)
    }

    pub fn set(&mut self, key: &str, value: Vec<u8>) {
        self.staged.insert(key.to_string(), StagedWrite::Set(value));
    }

    /// Stage a first-time write, preserved as `add` at commit.
    pub fn add(&mut self, key: &str, value: Vec<u8>) {
        self.staged.insert(key.to_string(), StagedWrite::Add(value));
    }

    /// Typed read through bcs.
    pub fn get_object<T: DeserializeOwned>(&self, key: &str) -> TxmResult<Option<T>> {
        match self.get(key) {
            Some(bytes) => Ok(Some(bcs::from_bytes(&bytes)?)),
            None => Ok(None),
        }
    }

    /// Typed overwrite through bcs.
    pub fn set_object<T: Serialize>(&mut self, key: &str, value: &T) -> TxmResult<()> {
        let bytes = bcs::to_bytes(value)?;
        self.set(key, bytes);
        Ok(())
    }

    /// Typed first-time write through bcs.
    pub fn add_object<T: Serialize>(&mut self, key: &str, value: &T) -> TxmResult<()> {
        let bytes = bcs::to_bytes(value)?;
        self.add(key, bytes);
        Ok(())
    }

    pub fn current_height(&self) -> u64 {
        self.host.current_height()
    }

    pub fn current_caller(&self) -> ContractAddress {
        self.host.current_caller()
    }

    /// Flush all staged writes to the host.
    pub fn commit(self) {
        for (key, write) in self.staged {
            match write {
                StagedWrite::Add(value) => self.host.add(&key, value),
                StagedWrite::Set(value) => self.host.set(&key, value),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::MemHost;
    use interchain_txm_types::TxRecord;

    #[test]
    fn staged_writes_are_invisible_until_commit() {
        let mut host = MemHost::new();
        let mut delta = StateDelta::new(&mut host);
        delta.set("k", b"v".to_vec());
        assert_eq!(delta.get("k"), Some(b"v".to_vec()));
        drop(delta);
        assert_eq!(host.get("k"), None);
        assert_eq!(host.write_count(), 0);

        let mut delta = StateDelta::new(&mut host);
        delta.set("k", b"v".to_vec());
        delta.commit();
        assert_eq!(host.get("k"), Some(b"v".to_vec()));
    }

    #[test]
    fn reads_see_staged_over_host() {
        let mut host = MemHost::new();
        host.set("k", b"old".to_vec());
        let mut delta = StateDelta::new(&mut host);
        assert_eq!(delta.get("k"), Some(b"old".to_vec()));
        delta.set("k", b"new".to_vec());
        assert_eq!(delta.get("k"), Some(b"new".to_vec()));
    }

    #[test]
    fn add_behaves_like_set_on_commit() {
        let mut host = MemHost::new();
        let mut delta = StateDelta::new(&mut host);
        delta.add("k", b"v".to_vec());
        assert_eq!(delta.get("k"), Some(b"v".to_vec()));
        delta.commit();
        assert_eq!(host.get("k"), Some(b"v".to_vec()));
    }

    #[test]
    fn typed_round_trip() {
        let mut host = MemHost::new();
        let mut delta = StateDelta::new(&mut host);
        let record = TxRecord {
            status: Default::default(),
            height: 42,
        };
        delta.add_object("rec", &record).unwrap();
        let back: Option<TxRecord> = delta.get_object("rec").unwrap();
        assert_eq!(back, Some(record));
    }

    #[test]
    fn missing_key_reads_none() {
        let mut host = MemHost::new();
        let delta = StateDelta::new(&mut host);
        let got: Option<TxRecord> = delta.get_object("absent").unwrap();
        assert_eq!(got, None);
    }
}
