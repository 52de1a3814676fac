//! Helpers shared by the proof validation test suites: a constant-output
//! hash function standing in for the real primitive, byte builders, and a
//! proof-tree builder for single-descent chains of arbitrary height.

#![allow(dead_code)]

use proofmap_core::hasher::{HashFunction, Hasher};
use proofmap_core::proof::MapProofNode;
use proofmap_core::serializer::StringSerializer;
use proofmap_core::{DbKey, Digest, MapProofValidator, KEY_SIZE, KEY_SIZE_BITS};

/// A hash function whose every digest is the same fixed value, regardless of
/// input. Validation logic can then be exercised without computing real
/// hashes: the recomputed root always equals the mock digest.
#[derive(Clone, Copy, Debug)]
pub struct ConstHashFunction(pub Digest);

pub struct ConstHasher(Digest);

impl HashFunction for ConstHashFunction {
    type Hasher = ConstHasher;

    fn new_hasher(&self) -> ConstHasher {
        ConstHasher(self.0)
    }
}

impl Hasher for ConstHasher {
    fn update(&mut self, _data: &[u8]) {}

    fn finish(self) -> Digest {
        self.0
    }
}

/// A 32-byte key starting with the given bytes, zero padded.
pub fn create_key(prefix: &[u8]) -> [u8; KEY_SIZE] {
    assert!(prefix.len() <= KEY_SIZE);
    let mut key = [0u8; KEY_SIZE];
    key[..prefix.len()].copy_from_slice(prefix);
    key
}

/// A digest starting with the given bytes, zero padded.
pub fn create_hash(prefix: &[u8]) -> Digest {
    let mut hash = [0u8; 32];
    hash[..prefix.len()].copy_from_slice(prefix);
    hash
}

/// The non-trivial root hash most scenarios validate against.
pub fn root_hash() -> Digest {
    create_hash(b"root hash")
}

/// A validator of string values over the constant hash function.
pub fn string_validator(
    expected_root_hash: Digest,
    key: [u8; KEY_SIZE],
) -> MapProofValidator<StringSerializer, ConstHashFunction> {
    MapProofValidator::new(
        expected_root_hash,
        key,
        StringSerializer,
        ConstHashFunction(root_hash()),
    )
}

pub fn bit_of(key: &[u8; KEY_SIZE], i: usize) -> bool {
    (key[i / 8] >> (i % 8)) & 1 == 1
}

pub fn set_bit(key: &mut [u8; KEY_SIZE], i: usize, value: bool) {
    if value {
        key[i / 8] |= 1 << (i % 8);
    } else {
        key[i / 8] &= !(1 << (i % 8));
    }
}

/// Keep the first `n` bits of `key`, zeroing the rest.
pub fn mask_bits(key: &[u8; KEY_SIZE], n: usize) -> [u8; KEY_SIZE] {
    let mut masked = [0u8; KEY_SIZE];
    masked[..n / 8].copy_from_slice(&key[..n / 8]);
    if n % 8 != 0 {
        masked[n / 8] = key[n / 8] & ((1 << (n % 8)) - 1);
    }
    masked
}

/// Build a proof tree of `height` branches descending along `key`, with the
/// value at the bottom. Every level's elided sibling is a leaf whose key
/// diverges at that level's bit.
///
/// Heights above [`KEY_SIZE_BITS`] deliberately produce over-deep trees; the
/// keys of branches past the limit are never inspected because the validator
/// rejects such a branch on depth alone.
pub fn build_chain(key: &[u8; KEY_SIZE], height: usize, value: &[u8]) -> MapProofNode {
    assert!(height > 0);
    let mut node = MapProofNode::Leaf {
        value: value.to_vec(),
    };
    for depth in (0..height).rev() {
        node = if depth >= KEY_SIZE_BITS {
            MapProofNode::LeftBranch {
                left: Box::new(node),
                right_hash: create_hash(b"h1"),
                left_key: DbKey::branch([0u8; KEY_SIZE], 0),
                right_key: DbKey::leaf(create_key(&[1])),
            }
        } else {
            let chosen_key = if depth == height - 1 {
                DbKey::leaf(*key)
            } else {
                let bits = (depth + 1).min(KEY_SIZE_BITS);
                DbKey::branch(mask_bits(key, bits), bits)
            };
            let mut sibling_raw = mask_bits(key, depth);
            set_bit(&mut sibling_raw, depth, !bit_of(key, depth));
            let sibling_key = DbKey::leaf(sibling_raw);
            if bit_of(key, depth) {
                MapProofNode::RightBranch {
                    left_hash: create_hash(b"h1"),
                    right: Box::new(node),
                    left_key: sibling_key,
                    right_key: chosen_key,
                }
            } else {
                MapProofNode::LeftBranch {
                    left: Box::new(node),
                    right_hash: create_hash(b"h1"),
                    left_key: chosen_key,
                    right_key: sibling_key,
                }
            }
        };
    }
    node
}
