// Copyright (C) 2023, Ava Labs, Inc. All rights reserved.
// See the file LICENSE.md for licensing terms.

//! Packed on-wire UTXO keys.
//!
//! A key is 41 bytes: the commitment's 32-byte X coordinate, one byte of
//! flags sharing space with the block height, and the height itself packed
//! MSB-first but shifted right three bits so its bytes straddle byte
//! boundaries. Lexicographic order on the packed bytes equals
//! `(X, Y, coinbase, confidential, height)` order on the structured form by
//! construction, so the trie's ordered traversal sorts UTXOs the way the
//! consensus rules expect.

use std::fmt::{self, Debug};

/// Width of the commitment X coordinate.
pub const COMMITMENT_BYTES: usize = 32;

/// Total packed key width: X, then flags and a 64-bit height sharing the
/// tail. The final byte's low five bits are always zero padding.
pub const KEY_BYTES: usize = COMMITMENT_BYTES + std::mem::size_of::<u64>() + 1;

const FLAG_Y_PARITY: u8 = 1 << 7;
const FLAG_COINBASE: u8 = 1 << 6;
const FLAG_CONFIDENTIAL: u8 = 1 << 5;

/// A packed UTXO key, ordered lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UtxoKey([u8; KEY_BYTES]);

impl UtxoKey {
    /// Key width in bits, the fixed width of the UTXO trie.
    pub const BITS: u32 = (KEY_BYTES * 8) as u32;

    /// The packed bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; KEY_BYTES] {
        &self.0
    }
}

impl AsRef<[u8]> for UtxoKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<[u8; KEY_BYTES]> for UtxoKey {
    fn from(bytes: [u8; KEY_BYTES]) -> Self {
        UtxoKey(bytes)
    }
}

impl Debug for UtxoKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        write!(f, "{}", hex::encode(self.0))
    }
}

/// The structured form of a [`UtxoKey`].
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct UtxoKeyFields {
    /// X coordinate of the output commitment.
    pub commitment_x: [u8; COMMITMENT_BYTES],
    /// Y parity of the output commitment.
    pub y_parity: bool,
    /// True for coinbase outputs.
    pub coinbase: bool,
    /// True for confidential outputs.
    pub confidential: bool,
    /// Block height the output was created at.
    pub height: u64,
}

impl From<&UtxoKeyFields> for UtxoKey {
    fn from(fields: &UtxoKeyFields) -> Self {
        let mut bytes = [0u8; KEY_BYTES];
        bytes[..COMMITMENT_BYTES].copy_from_slice(&fields.commitment_x);

        let tail = &mut bytes[COMMITMENT_BYTES..];
        if fields.y_parity {
            tail[0] |= FLAG_Y_PARITY;
        }
        if fields.coinbase {
            tail[0] |= FLAG_COINBASE;
        }
        if fields.confidential {
            tail[0] |= FLAG_CONFIDENTIAL;
        }

        // height bytes straddle the byte grid: the high five bits of each
        // land low in one byte, the low three high in the next
        for (i, byte) in fields.height.to_be_bytes().into_iter().enumerate() {
            tail[i] |= byte >> 3;
            tail[i + 1] |= byte << 5;
        }

        UtxoKey(bytes)
    }
}

impl From<UtxoKeyFields> for UtxoKey {
    fn from(fields: UtxoKeyFields) -> Self {
        (&fields).into()
    }
}

impl From<&UtxoKey> for UtxoKeyFields {
    fn from(key: &UtxoKey) -> Self {
        let mut commitment_x = [0u8; COMMITMENT_BYTES];
        commitment_x.copy_from_slice(&key.0[..COMMITMENT_BYTES]);

        let tail = &key.0[COMMITMENT_BYTES..];
        let mut height = 0u64;
        for i in 0..std::mem::size_of::<u64>() {
            height = (height << 8) | u64::from((tail[i] << 3) | (tail[i + 1] >> 5));
        }

        UtxoKeyFields {
            commitment_x,
            y_parity: tail[0] & FLAG_Y_PARITY != 0,
            coinbase: tail[0] & FLAG_COINBASE != 0,
            confidential: tail[0] & FLAG_CONFIDENTIAL != 0,
            height,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use test_case::test_case;

    #[test]
    fn packed_layout() {
        let key: UtxoKey = UtxoKeyFields {
            commitment_x: [0x11; COMMITMENT_BYTES],
            y_parity: true,
            coinbase: false,
            confidential: true,
            height: 0x1234,
        }
        .into();

        let bytes = key.as_bytes();
        assert_eq!(&bytes[..32], &[0x11; 32]);
        // flags: Y set, coinbase clear, confidential set; height 0x1234
        // occupies the trailing bits shifted right by three
        assert_eq!(bytes[32] & 0xe0, 0xa0);
        assert_eq!(bytes[40] & 0x1f, 0);

        let back = UtxoKeyFields::from(&key);
        assert_eq!(back.commitment_x, [0x11; COMMITMENT_BYTES]);
        assert!(back.y_parity);
        assert!(!back.coinbase);
        assert!(back.confidential);
        assert_eq!(back.height, 0x1234);
    }

    #[test_case(false, false, false, 0)]
    #[test_case(true, false, false, 1)]
    #[test_case(false, true, false, 0xffff_ffff_ffff_ffff)]
    #[test_case(false, false, true, 0x0123_4567_89ab_cdef)]
    #[test_case(true, true, true, 700_000)]
    fn encode_decode_identity(y_parity: bool, coinbase: bool, confidential: bool, height: u64) {
        let fields = UtxoKeyFields {
            commitment_x: [0xc3; COMMITMENT_BYTES],
            y_parity,
            coinbase,
            confidential,
            height,
        };
        let key = UtxoKey::from(&fields);
        assert_eq!(UtxoKeyFields::from(&key), fields);
    }

    #[test]
    fn decode_encode_identity_on_padded_keys() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..200 {
            let mut bytes = [0u8; KEY_BYTES];
            rng.fill(&mut bytes[..]);
            // zero the padding bits the packing never produces
            bytes[KEY_BYTES - 1] &= !0x1f;
            let key = UtxoKey::from(bytes);
            let round: UtxoKey = UtxoKeyFields::from(&key).into();
            assert_eq!(round, key);
        }
    }

    #[test]
    fn packed_order_matches_field_order() {
        let mut rng = StdRng::seed_from_u64(11);
        let random_fields = |rng: &mut StdRng| {
            let mut commitment_x = [0u8; COMMITMENT_BYTES];
            // narrow X range so flag and height comparisons get exercised
            commitment_x[0] = rng.gen_range(0..2);
            UtxoKeyFields {
                commitment_x,
                y_parity: rng.gen(),
                coinbase: rng.gen(),
                confidential: rng.gen(),
                height: rng.gen_range(0..3),
            }
        };

        for _ in 0..500 {
            let a = random_fields(&mut rng);
            let b = random_fields(&mut rng);
            let tuple_cmp = (a.commitment_x, a.y_parity, a.coinbase, a.confidential, a.height).cmp(
                &(b.commitment_x, b.y_parity, b.coinbase, b.confidential, b.height),
            );
            assert_eq!(UtxoKey::from(&a).cmp(&UtxoKey::from(&b)), tuple_cmp);
        }
    }
}
