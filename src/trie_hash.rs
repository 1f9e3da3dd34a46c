// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

use std::fmt::{self, Debug, Display, Formatter};

use serde::de::Visitor;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A digest committing to a subtree of the UTXO set or to a range of an MMR.
#[derive(PartialEq, Eq, Clone, Copy, Default, Hash)]
pub struct TrieHash([u8; 32]);

impl TrieHash {
    /// The all-zero digest, published as the commitment of an empty set.
    pub const ZERO: TrieHash = TrieHash([0; 32]);

    /// Return the length of a `TrieHash` in bytes.
    pub(crate) const fn len() -> usize {
        std::mem::size_of::<TrieHash>()
    }
}

impl std::ops::Deref for TrieHash {
    type Target = [u8; 32];
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl AsRef<[u8]> for TrieHash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Debug for TrieHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        let width = f.precision().unwrap_or(64);
        write!(f, "{:.*}", width, hex::encode(self.0))
    }
}

impl Display for TrieHash {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), fmt::Error> {
        let width = f.precision().unwrap_or(64);
        write!(f, "{:.*}", width, hex::encode(self.0))
    }
}

impl From<[u8; 32]> for TrieHash {
    fn from(value: [u8; 32]) -> Self {
        TrieHash(value)
    }
}

impl TryFrom<&[u8]> for TrieHash {
    type Error = &'static str;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() == Self::len() {
            let mut hash = TrieHash::default();
            hash.0.copy_from_slice(value);
            Ok(hash)
        } else {
            Err("Invalid length")
        }
    }
}

impl Serialize for TrieHash {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_bytes(&self.0)
    }
}

impl<'de> Deserialize<'de> for TrieHash {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        deserializer.deserialize_bytes(TrieVisitor)
    }
}

struct TrieVisitor;

impl Visitor<'_> for TrieVisitor {
    type Value = TrieHash;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an array of u8 hash bytes")
    }

    fn visit_bytes<E>(self, v: &[u8]) -> Result<Self::Value, E>
    where
        E: serde::de::Error,
    {
        let mut hash = TrieHash::default();
        if v.len() == hash.0.len() {
            hash.0.copy_from_slice(v);
            Ok(hash)
        } else {
            Err(E::invalid_length(v.len(), &self))
        }
    }
}

/// Streaming hash accumulator, the chaining primitive shared by the UTXO
/// tree and the MMR. Feed it digests and integers, then [`Hasher::finalize`]
/// into a [`TrieHash`]. Integers enter the hash domain big-endian.
#[derive(Debug, Default, Clone)]
pub struct Hasher(Sha256);

impl Hasher {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self(Sha256::new())
    }

    /// Absorb raw bytes.
    pub fn update<T: AsRef<[u8]>>(&mut self, data: T) {
        Digest::update(&mut self.0, data);
    }

    /// Absorb an unsigned integer, big-endian.
    pub fn update_u64(&mut self, value: u64) {
        Digest::update(&mut self.0, value.to_be_bytes());
    }

    /// Consume the accumulator and produce the digest.
    #[must_use]
    pub fn finalize(self) -> TrieHash {
        TrieHash(self.0.finalize().into())
    }
}

/// `H(left || right)`, the node-combining operator.
#[must_use]
pub fn hash_pair(left: &TrieHash, right: &TrieHash) -> TrieHash {
    let mut hasher = Hasher::new();
    hasher.update(left);
    hasher.update(right);
    hasher.finalize()
}
