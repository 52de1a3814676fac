//! Database keys of the binary Merkle-Patricia map.
//!
//! Every node of the map is addressed by a [`DbKey`]: a fixed-width bit path
//! together with the number of bits that are significant and the kind of node
//! the key addresses. Leaf keys are always full length. Branch keys address
//! internal nodes by the bit prefix shared by everything below them, which is
//! how the map compresses single-child runs into one edge.
//!
//! Bit `i` of a key is bit `i % 8`, least significant first, of byte `i / 8`.
//! This matches the byte layout the storage engine uses for key material.

use crate::{KEY_SIZE, KEY_SIZE_BITS};

use bitvec::{order::Lsb0, slice::BitSlice, view::BitView};
use core::fmt;

/// The size of the canonical database encoding of a [`DbKey`], in bytes.
pub const DB_KEY_SIZE: usize = KEY_SIZE + 2;

/// The kind of node a [`DbKey`] addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(
    feature = "borsh",
    derive(borsh::BorshSerialize, borsh::BorshDeserialize)
)]
pub enum KeyKind {
    /// A leaf node holding a value. All key bits are significant.
    Leaf,
    /// An internal node. Only the prefix up to the significant length matters.
    Branch,
}

/// A key of a node in the binary Merkle-Patricia map.
///
/// A `DbKey` is canonical: every bit at or beyond the significant length is
/// zero. The constructors enforce this, so two keys addressing the same node
/// always compare equal. Deserialization re-validates the same invariants
/// and rejects non-canonical input instead of reconstructing the fields
/// directly.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "UncheckedDbKey"))]
#[cfg_attr(feature = "borsh", derive(borsh::BorshSerialize))]
pub struct DbKey {
    kind: KeyKind,
    raw: [u8; KEY_SIZE],
    num_significant_bits: u16,
}

/// Error produced when decoding a [`DbKey`] whose kind, length and bit
/// pattern do not form a canonical key.
#[cfg(any(feature = "serde", feature = "borsh"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NonCanonicalDbKey;

#[cfg(any(feature = "serde", feature = "borsh"))]
impl fmt::Display for NonCanonicalDbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("db key is not in canonical form")
    }
}

/// The wire shape of a [`DbKey`], carrying no invariants. Conversion into
/// the real type is where canonical form is enforced.
#[cfg(any(feature = "serde", feature = "borsh"))]
#[cfg_attr(feature = "serde", derive(serde::Deserialize))]
struct UncheckedDbKey {
    kind: KeyKind,
    raw: [u8; KEY_SIZE],
    num_significant_bits: u16,
}

#[cfg(any(feature = "serde", feature = "borsh"))]
impl TryFrom<UncheckedDbKey> for DbKey {
    type Error = NonCanonicalDbKey;

    fn try_from(key: UncheckedDbKey) -> Result<Self, NonCanonicalDbKey> {
        let bits = key.num_significant_bits as usize;
        match key.kind {
            KeyKind::Leaf if bits == KEY_SIZE_BITS => Ok(DbKey::leaf(key.raw)),
            KeyKind::Branch
                if bits <= KEY_SIZE_BITS && !key.raw.view_bits::<Lsb0>()[bits..].any() =>
            {
                Ok(DbKey::branch(key.raw, bits))
            }
            _ => Err(NonCanonicalDbKey),
        }
    }
}

#[cfg(feature = "borsh")]
impl borsh::BorshDeserialize for DbKey {
    fn deserialize_reader<R: borsh::io::Read>(reader: &mut R) -> borsh::io::Result<Self> {
        let unchecked = UncheckedDbKey {
            kind: borsh::BorshDeserialize::deserialize_reader(reader)?,
            raw: borsh::BorshDeserialize::deserialize_reader(reader)?,
            num_significant_bits: borsh::BorshDeserialize::deserialize_reader(reader)?,
        };
        DbKey::try_from(unchecked).map_err(|e| {
            borsh::io::Error::new(borsh::io::ErrorKind::InvalidData, alloc::format!("{}", e))
        })
    }
}

impl DbKey {
    /// Create a leaf key. All `KEY_SIZE_BITS` bits of `raw` are significant.
    pub fn leaf(raw: [u8; KEY_SIZE]) -> Self {
        DbKey {
            kind: KeyKind::Leaf,
            raw,
            num_significant_bits: KEY_SIZE_BITS as u16,
        }
    }

    /// Create a branch key with the given number of significant bits.
    ///
    /// Panics if `num_significant_bits` exceeds [`KEY_SIZE_BITS`] or if any
    /// bit of `raw` at or beyond the significant length is set.
    pub fn branch(raw: [u8; KEY_SIZE], num_significant_bits: usize) -> Self {
        assert!(
            num_significant_bits <= KEY_SIZE_BITS,
            "branch key length {} exceeds {} bits",
            num_significant_bits,
            KEY_SIZE_BITS,
        );
        assert!(
            !raw.view_bits::<Lsb0>()[num_significant_bits..].any(),
            "branch key is not in canonical form: set bits beyond length {}",
            num_significant_bits,
        );
        DbKey {
            kind: KeyKind::Branch,
            raw,
            num_significant_bits: num_significant_bits as u16,
        }
    }

    /// The kind of node this key addresses.
    pub fn kind(&self) -> KeyKind {
        self.kind
    }

    /// The raw key material, zero-padded beyond the significant prefix.
    pub fn raw_key(&self) -> &[u8; KEY_SIZE] {
        &self.raw
    }

    /// The number of leading bits of the raw key that are significant.
    pub fn num_significant_bits(&self) -> usize {
        self.num_significant_bits as usize
    }

    /// Get bit `i` of the raw key.
    ///
    /// Panics if `i` is out of the key width. Bits at or beyond the
    /// significant length are zero.
    pub fn bit(&self, i: usize) -> bool {
        assert!(i < KEY_SIZE_BITS, "bit index {} out of bounds", i);
        self.raw.view_bits::<Lsb0>()[i]
    }

    /// The significant prefix of this key as a bit slice.
    pub fn significant_bits(&self) -> &BitSlice<u8, Lsb0> {
        &self.raw.view_bits::<Lsb0>()[..self.num_significant_bits()]
    }

    /// The length of the longest common bit prefix of two keys, capped by the
    /// shorter significant length.
    pub fn common_prefix_len(&self, other: &DbKey) -> usize {
        let cap = core::cmp::min(self.num_significant_bits(), other.num_significant_bits());
        self.significant_bits()[..cap]
            .iter()
            .by_vals()
            .zip(other.significant_bits()[..cap].iter().by_vals())
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Whether the significant bits of this key are a prefix of the given
    /// full-width key.
    pub fn is_prefix_of(&self, full_key: &[u8; KEY_SIZE]) -> bool {
        full_key.view_bits::<Lsb0>()[..self.num_significant_bits()] == *self.significant_bits()
    }

    /// Encode this key the way the storage engine does when hashing nodes:
    /// the raw key, one byte holding the significant length modulo 256, and a
    /// kind marker byte (0 for branch, 1 for leaf).
    pub fn encode(&self) -> [u8; DB_KEY_SIZE] {
        let mut buf = [0u8; DB_KEY_SIZE];
        buf[..KEY_SIZE].copy_from_slice(&self.raw);
        buf[KEY_SIZE] = self.num_significant_bits as u8;
        buf[KEY_SIZE + 1] = match self.kind {
            KeyKind::Branch => 0,
            KeyKind::Leaf => 1,
        };
        buf
    }
}

impl fmt::Debug for DbKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            KeyKind::Leaf => "LEAF",
            KeyKind::Branch => "BRANCH",
        };
        write!(
            f,
            "DbKey({}, 0x{}/{})",
            kind,
            hex::encode(self.raw),
            self.num_significant_bits,
        )
    }
}
