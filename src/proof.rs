// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use crate::trie_hash::{hash_pair, TrieHash};

/// One step of an inclusion proof: the digest of the sibling subtree and
/// which side of the fold it joins on.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct ProofEntry {
    /// True when the element being proven is the left input at this level,
    /// i.e. the traversal descended via child 0 (tree) or the index was even
    /// (MMR).
    pub sibling_on_right: bool,
    /// Digest of the sibling subtree.
    pub sibling: TrieHash,
}

/// An inclusion proof: sibling digests ordered leaf to root. The root itself
/// is never part of the proof; a verifier folds the element's own digest
/// through the entries and compares the result against a trusted root.
#[derive(Clone, Default, PartialEq, Eq, Debug)]
pub struct Proof(Vec<ProofEntry>);

impl Proof {
    /// Append one level to the proof. Producers emit entries bottom-up.
    pub fn push(&mut self, entry: ProofEntry) {
        self.0.push(entry);
    }

    /// Fold `leaf` through the proof, reconstructing the root the proof
    /// claims membership under.
    #[must_use]
    pub fn root_from(&self, leaf: TrieHash) -> TrieHash {
        self.0.iter().fold(leaf, |hv, entry| {
            if entry.sibling_on_right {
                hash_pair(&hv, &entry.sibling)
            } else {
                hash_pair(&entry.sibling, &hv)
            }
        })
    }
}

impl std::ops::Deref for Proof {
    type Target = [ProofEntry];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}
