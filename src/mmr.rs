// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Merkle Mountain Range: an append-only hash log committing to every
//! prefix of the sequence.
//!
//! The range itself only tracks how many elements were appended; the
//! per-height element store is pluggable, so peaks can live in RAM, on
//! disk, or anywhere else. Height 0 holds the appended hashes; height
//! `h > 0` index `k` is `H(child(2k) || child(2k+1))` over height `h - 1`.

use crate::logger::trace;
use crate::proof::{Proof, ProofEntry};
use crate::trie_hash::{hash_pair, TrieHash};

/// Element storage the MMR delegates to.
///
/// Loading an element that was never saved is a programming error, not a
/// recoverable condition; implementations are free to panic.
pub trait MmrStore {
    /// Store `hash` at `(index, height)`.
    fn save_element(&mut self, hash: &TrieHash, index: u64, height: u32);
    /// Retrieve the hash previously saved at `(index, height)`.
    fn load_element(&self, index: u64, height: u32) -> TrieHash;
}

/// RAM-backed [`MmrStore`], one dense vector per height.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    levels: Vec<Vec<TrieHash>>,
}

impl MemStore {
    /// An empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl MmrStore for MemStore {
    fn save_element(&mut self, hash: &TrieHash, index: u64, height: u32) {
        let height = height as usize;
        if self.levels.len() <= height {
            self.levels.resize_with(height + 1, Vec::new);
        }
        let level = &mut self.levels[height];
        let index = index as usize;
        if level.len() <= index {
            level.resize(index + 1, TrieHash::ZERO);
        }
        level[index] = *hash;
    }

    fn load_element(&self, index: u64, height: u32) -> TrieHash {
        // missing elements are a caller bug; index straight in
        self.levels[height as usize][index as usize]
    }
}

/// Append-only Merkle Mountain Range over a pluggable element store.
#[derive(Debug)]
pub struct Mmr<S> {
    store: S,
    count: u64,
}

impl<S: MmrStore> Mmr<S> {
    /// An empty range backed by `store`.
    pub fn new(store: S) -> Self {
        Self { store, count: 0 }
    }

    /// Resume a range of `count` elements whose peaks already live in
    /// `store` (e.g. reopened from disk).
    pub fn from_parts(store: S, count: u64) -> Self {
        Self { store, count }
    }

    /// Number of elements appended so far.
    #[must_use]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Borrow the element store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Consume the range, returning the element store.
    pub fn into_store(self) -> S {
        self.store
    }

    /// Append one element. Completed pairs merge upward: each odd position
    /// folds with its left sibling and the merged hash ascends a height.
    pub fn append(&mut self, hash: TrieHash) {
        let mut hv = hash;
        let mut n = self.count;
        let mut height = 0u32;

        loop {
            self.store.save_element(&hv, n, height);
            if n & 1 == 0 {
                break;
            }
            let sibling = self.store.load_element(n ^ 1, height);
            hv = hash_pair(&sibling, &hv);
            n >>= 1;
            height += 1;
        }

        self.count += 1;
        trace!("mmr append #{}", self.count);
    }

    /// The digest committing to all appended elements, [`TrieHash::ZERO`]
    /// when empty.
    #[must_use]
    pub fn root_hash(&self) -> TrieHash {
        self.hash_for_range(0, self.count)
            .unwrap_or(TrieHash::ZERO)
    }

    /// Fold the peaks of the `n`-element subsequence starting at `n0`,
    /// low height to high, into a single digest. `None` for an empty range.
    fn hash_for_range(&self, n0: u64, n: u64) -> Option<TrieHash> {
        let mut acc: Option<TrieHash> = None;
        let (mut n0, mut n) = (n0, n);
        let mut height = 0u32;

        while n > 0 {
            if n & 1 == 1 {
                let peak = self.store.load_element((n0 + n) ^ 1, height);
                acc = Some(match acc {
                    None => peak,
                    Some(hv) => hash_pair(&peak, &hv),
                });
            }
            n >>= 1;
            n0 >>= 1;
            height += 1;
        }

        acc
    }

    /// Inclusion proof for element `index`. Panics when `index` is past the
    /// end. At each height the left sibling is always a complete subtree;
    /// a right sibling may be complete, partially filled (synthesized via
    /// the range fold), or absent entirely (skipped).
    #[must_use]
    pub fn proof(&self, index: u64) -> Proof {
        assert!(index < self.count, "mmr proof index out of range");

        let mut proof = Proof::default();
        let mut n = self.count;
        let mut i = index;
        let mut height = 0u32;

        while n > 0 {
            let sibling_on_right = i & 1 == 0;
            let sibling = i ^ 1;

            let hash = if !sibling_on_right {
                Some(self.store.load_element(sibling, height))
            } else {
                let first = sibling << height;
                if first >= self.count {
                    None
                } else if (self.count - first) >> height != 0 {
                    Some(self.store.load_element(sibling, height))
                } else {
                    Some(
                        self.hash_for_range(first, self.count - first)
                            .expect("non-empty remainder"),
                    )
                }
            };

            if let Some(sibling) = hash {
                proof.push(ProofEntry {
                    sibling_on_right,
                    sibling,
                });
            }

            n >>= 1;
            i >>= 1;
            height += 1;
        }

        proof
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hv(fill: u8) -> TrieHash {
        TrieHash::from([fill; 32])
    }

    fn mmr_with(count: u8) -> Mmr<MemStore> {
        let mut mmr = Mmr::new(MemStore::new());
        for i in 0..count {
            mmr.append(hv(i));
        }
        mmr
    }

    #[test]
    fn empty_root_is_zero() {
        let mmr = Mmr::new(MemStore::new());
        assert_eq!(mmr.count(), 0);
        assert_eq!(mmr.root_hash(), TrieHash::ZERO);
    }

    #[test]
    fn single_element_root_is_the_element() {
        let mut mmr = Mmr::new(MemStore::new());
        mmr.append(hv(9));
        assert_eq!(mmr.root_hash(), hv(9));
    }

    #[test]
    fn five_element_root_shape() {
        // peaks: one complete 4-tree plus the dangling fifth element,
        // folded high-to-low
        let mmr = mmr_with(5);
        let h01 = hash_pair(&hv(0), &hv(1));
        let h23 = hash_pair(&hv(2), &hv(3));
        let expected = hash_pair(&hash_pair(&h01, &h23), &hv(4));
        assert_eq!(mmr.root_hash(), expected);
    }

    #[test]
    fn five_element_proof_for_index_two() {
        let mmr = mmr_with(5);
        let proof = mmr.proof(2);
        let h01 = hash_pair(&hv(0), &hv(1));

        let entries: Vec<(bool, TrieHash)> = proof
            .iter()
            .map(|entry| (entry.sibling_on_right, entry.sibling))
            .collect();
        assert_eq!(
            entries,
            vec![(true, hv(3)), (false, h01), (true, hv(4))]
        );
        assert_eq!(proof.root_from(hv(2)), mmr.root_hash());
    }

    #[test]
    fn proofs_fold_to_root_for_every_index_and_size() {
        for count in 1..=17u8 {
            let mmr = mmr_with(count);
            let root = mmr.root_hash();
            for index in 0..u64::from(count) {
                let proof = mmr.proof(index);
                assert_eq!(
                    proof.root_from(hv(index as u8)),
                    root,
                    "count={count} index={index}"
                );
            }
        }
    }

    #[test]
    fn root_depends_only_on_the_sequence() {
        let a = mmr_with(9);
        let b = mmr_with(9);
        assert_eq!(a.root_hash(), b.root_hash());

        let mut c = Mmr::new(MemStore::new());
        for i in 0..9u8 {
            c.append(hv(8 - i));
        }
        assert_ne!(a.root_hash(), c.root_hash());
    }

    #[test]
    fn resume_from_parts() {
        let mmr = mmr_with(6);
        let root = mmr.root_hash();
        let count = mmr.count();

        let resumed = Mmr::from_parts(mmr.into_store(), count);
        assert_eq!(resumed.root_hash(), root);
        resumed.proof(3);
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn proof_past_end_panics() {
        mmr_with(3).proof(3);
    }
}
