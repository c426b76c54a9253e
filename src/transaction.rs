/*
 * This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/.
 */

//! A transactional view over a shared map (§4.5), backing the union-find tables.
//!
//! Resolves the source's Open Question on commit ordering as **validate-then-apply**:
//! every key a transaction observed via `get` is re-read from the backing map
//! at commit time under a single write-lock acquisition; if any of them has
//! changed since this transaction read it, the whole commit is rejected and
//! nothing is mutated (see DESIGN.md and SPEC_FULL.md §9).

use crate::error::ProverError;
use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::sync::RwLock;

/// A map shared across threads, mutated only through [`Transaction::commit`].
#[derive(Debug, Default)]
pub(crate) struct SharedMap<K, V> {
    backing: RwLock<HashMap<K, V>>,
}

impl<K: Clone + Eq + Hash, V: Clone> SharedMap<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            backing: RwLock::new(HashMap::new()),
        }
    }

    /// Open a new transaction against this map.
    pub(crate) fn transaction(&self) -> Transaction<'_, K, V> {
        Transaction {
            backing: &self.backing,
            reads: HashMap::new(),
            writes: HashMap::new(),
            erases: HashSet::new(),
        }
    }
}

/// One attempt to read and write a [`SharedMap`] as a unit.
pub(crate) struct Transaction<'a, K, V> {
    backing: &'a RwLock<HashMap<K, V>>,
    reads: HashMap<K, Option<V>>,
    writes: HashMap<K, V>,
    erases: HashSet<K>,
}

impl<'a, K: Clone + Eq + Hash, V: Clone + PartialEq> Transaction<'a, K, V> {
    /// Read a key: writes cache, then erases, then reads cache, then (under a
    /// shared lock) the backing map, memoizing the result for commit validation.
    pub(crate) fn get(&mut self, key: &K) -> Option<V> {
        if let Some(v) = self.writes.get(key) {
            return Some(v.clone());
        }
        if self.erases.contains(key) {
            return None;
        }
        if let Some(cached) = self.reads.get(key) {
            return cached.clone();
        }
        let guard = self.backing.read().unwrap_or_else(|e| e.into_inner());
        let value = guard.get(key).cloned();
        self.reads.insert(key.clone(), value.clone());
        value
    }

    /// Stage a write. Removes any pending erase of the same key.
    pub(crate) fn set(&mut self, key: K, value: V) {
        self.erases.remove(&key);
        self.writes.insert(key, value);
    }

    /// Number of entries visible under this transaction: writes, then reads
    /// that weren't superseded, then the rest of the backing map, each entry
    /// counted exactly once.
    pub(crate) fn count(&self) -> usize {
        let guard = self.backing.read().unwrap_or_else(|e| e.into_inner());
        let mut seen: HashSet<&K> = HashSet::new();
        let mut total = 0usize;
        for k in self.writes.keys() {
            if seen.insert(k) {
                total += 1;
            }
        }
        for (k, v) in &self.reads {
            if v.is_some() && !self.writes.contains_key(k) && seen.insert(k) {
                total += 1;
            }
        }
        for k in guard.keys() {
            if !self.writes.contains_key(k) && !self.erases.contains(k) && seen.insert(k) {
                total += 1;
            }
        }
        total
    }

    /// Commit this transaction's pending writes/erases.
    ///
    /// Validates first: every key this transaction observed via [`Self::get`]
    /// is re-read from the backing map under the write lock this commit takes,
    /// and the commit is rejected if any of them no longer matches what this
    /// transaction saw (someone else committed a change to that key in the
    /// meantime). Only once every observed read is confirmed fresh are the
    /// pending writes/erases applied. A rejected commit leaves the backing map
    /// completely untouched and raises [`ProverError::Transaction`] with
    /// `attempts: 1` (callers track their own retry budget, §4.3).
    ///
    /// # Errors
    /// Returns [`ProverError::Transaction`] if any observed read has gone stale.
    pub(crate) fn commit(self) -> Result<(), ProverError> {
        let mut guard = self.backing.write().unwrap_or_else(|e| e.into_inner());
        for (key, observed) in &self.reads {
            if guard.get(key) != observed.as_ref() {
                return Err(ProverError::Transaction { attempts: 1 });
            }
        }
        for key in &self.erases {
            guard.remove(key);
        }
        for (key, value) in self.writes {
            guard.insert(key, value);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_your_own_writes() {
        let map: SharedMap<u32, u32> = SharedMap::new();
        let mut txn = map.transaction();
        txn.set(1, 100);
        assert_eq!(txn.get(&1), Some(100));
    }

    #[test]
    fn commit_applies_writes() {
        let map: SharedMap<u32, u32> = SharedMap::new();
        let mut txn = map.transaction();
        txn.set(1, 100);
        txn.commit().unwrap();
        let mut txn2 = map.transaction();
        assert_eq!(txn2.get(&1), Some(100));
    }

    #[test]
    fn rejected_commit_leaves_backing_map_unchanged() {
        let map: SharedMap<u32, u32> = SharedMap::new();
        {
            let mut seed = map.transaction();
            seed.set(1, 1);
            seed.commit().unwrap();
        }
        // Read key 1, so this transaction's read-set records its current value.
        let mut stale = map.transaction();
        assert_eq!(stale.get(&1), Some(1));

        // Someone else commits a change to key 1 before `stale` commits.
        {
            let mut other = map.transaction();
            other.set(1, 999);
            other.commit().unwrap();
        }

        stale.set(2, 2);
        let err = stale.commit();
        assert!(err.is_err());

        let mut verify = map.transaction();
        assert_eq!(verify.get(&1), Some(999));
        assert_eq!(verify.get(&2), None);
    }

    #[test]
    fn concurrent_transactions_racing_on_the_same_key_reject_the_second_commit() {
        let map: SharedMap<u32, u32> = SharedMap::new();
        {
            let mut seed = map.transaction();
            seed.set(1, 1);
            seed.commit().unwrap();
        }

        let mut txn_a = map.transaction();
        let mut txn_b = map.transaction();
        // Both transactions read the same pre-image before either writes.
        assert_eq!(txn_a.get(&1), Some(1));
        assert_eq!(txn_b.get(&1), Some(1));

        txn_a.set(1, 2);
        txn_a.commit().unwrap();

        // txn_b's read of key 1 is now stale; its commit must be rejected
        // rather than silently overwriting txn_a's write (lost update).
        txn_b.set(1, 3);
        assert!(txn_b.commit().is_err());

        let mut verify = map.transaction();
        assert_eq!(verify.get(&1), Some(2));
    }

    #[test]
    fn erase_removes_entry() {
        let map: SharedMap<u32, u32> = SharedMap::new();
        {
            let mut seed = map.transaction();
            seed.set(1, 1);
            seed.commit().unwrap();
        }
        let mut txn = map.transaction();
        txn.erases.insert(1);
        assert_eq!(txn.get(&1), None);
    }

    #[test]
    fn count_visits_each_key_once() {
        let map: SharedMap<u32, u32> = SharedMap::new();
        {
            let mut seed = map.transaction();
            seed.set(1, 1);
            seed.set(2, 2);
            seed.commit().unwrap();
        }
        let mut txn = map.transaction();
        txn.set(2, 20);
        txn.set(3, 3);
        assert_eq!(txn.count(), 3);
    }
}
