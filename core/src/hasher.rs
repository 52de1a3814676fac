//! Hash facade (feature-gated backends) and the canonical node hashing used
//! to recompute a proof's root.
//!
//! The validator never names a concrete hash primitive. It is handed a
//! [`HashFunction`], and creates, feeds and finalizes one [`Hasher`] per
//! proof node. The production primitive is SHA-256-class; whatever is
//! injected must match the storage engine that produced the root hash
//! byte-for-byte, since node hashing is a compatibility contract.

use crate::db_key::DbKey;
use crate::Digest;

/// A streaming hasher over a single node's input bytes.
///
/// One instance hashes exactly one node: it is created by
/// [`HashFunction::new_hasher`], fed in order, and consumed by
/// [`finish`](Hasher::finish).
pub trait Hasher {
    /// Feed input bytes to the hasher.
    fn update(&mut self, data: &[u8]);

    /// Finalize and produce the digest.
    fn finish(self) -> Digest;
}

/// A factory of independent [`Hasher`] instances.
///
/// Instances produced by separate calls must not share state, so proofs may
/// be validated concurrently with clones of one factory.
pub trait HashFunction {
    /// The hasher type this function produces.
    type Hasher: Hasher;

    /// Create a fresh hasher.
    fn new_hasher(&self) -> Self::Hasher;

    /// Hash a byte string in one call.
    fn hash_bytes(&self, data: &[u8]) -> Digest {
        let mut hasher = self.new_hasher();
        hasher.update(data);
        hasher.finish()
    }
}

/// Hash of a leaf node entry, as the storage engine computes it: the
/// canonical encoding of the leaf's key followed by the hash of its value.
pub fn hash_leaf_node<F: HashFunction>(
    hash_function: &F,
    key: &DbKey,
    value_hash: &Digest,
) -> Digest {
    let mut hasher = hash_function.new_hasher();
    hasher.update(&key.encode());
    hasher.update(value_hash);
    hasher.finish()
}

/// Hash of a branch node entry: both child hashes followed by the canonical
/// encodings of both child keys, left before right.
pub fn hash_branch_node<F: HashFunction>(
    hash_function: &F,
    left_hash: &Digest,
    right_hash: &Digest,
    left_key: &DbKey,
    right_key: &DbKey,
) -> Digest {
    let mut hasher = hash_function.new_hasher();
    hasher.update(left_hash);
    hasher.update(right_hash);
    hasher.update(&left_key.encode());
    hasher.update(&right_key.encode());
    hasher.finish()
}

/// A [`Hasher`] backed by any RustCrypto digest with 32-byte output.
pub struct DigestHasher<D>(D);

impl<D> Hasher for DigestHasher<D>
where
    D: digest::Digest<OutputSize = digest::typenum::U32>,
{
    fn update(&mut self, data: &[u8]) {
        digest::Digest::update(&mut self.0, data);
    }

    fn finish(self) -> Digest {
        digest::Digest::finalize(self.0).into()
    }
}

/// A [`HashFunction`] backed by any RustCrypto digest with 32-byte output.
///
/// Sha2/Blake2/Keccak and the rest of the `digest` ecosystem all plug in
/// through this adapter.
pub struct DigestHashFunction<D>(core::marker::PhantomData<D>);

impl<D> DigestHashFunction<D> {
    /// Create the hash function.
    pub const fn new() -> Self {
        DigestHashFunction(core::marker::PhantomData)
    }
}

impl<D> Default for DigestHashFunction<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D> Clone for DigestHashFunction<D> {
    fn clone(&self) -> Self {
        Self::new()
    }
}

impl<D> HashFunction for DigestHashFunction<D>
where
    D: digest::Digest<OutputSize = digest::typenum::U32>,
{
    type Hasher = DigestHasher<D>;

    fn new_hasher(&self) -> DigestHasher<D> {
        DigestHasher(D::new())
    }
}

#[cfg(feature = "sha2-hasher")]
pub use self::sha2::Sha2HashFunction;

/// A hash function making use of sha2-256.
#[cfg(feature = "sha2-hasher")]
pub mod sha2 {
    use super::DigestHashFunction;

    /// The SHA-256 [`HashFunction`](super::HashFunction), matching the
    /// storage engine's production primitive.
    pub type Sha2HashFunction = DigestHashFunction<::sha2::Sha256>;
}

#[cfg(any(feature = "blake3-hasher", test))]
pub use self::blake3::Blake3HashFunction;

/// A hash function making use of blake3.
#[cfg(any(feature = "blake3-hasher", test))]
pub mod blake3 {
    use super::{Digest, Hasher};

    /// A [`HashFunction`](super::HashFunction) backed by blake3.
    #[derive(Clone, Copy, Debug, Default)]
    pub struct Blake3HashFunction;

    /// The streaming blake3 hasher.
    pub struct Blake3Hasher(::blake3::Hasher);

    impl super::HashFunction for Blake3HashFunction {
        type Hasher = Blake3Hasher;

        fn new_hasher(&self) -> Blake3Hasher {
            Blake3Hasher(::blake3::Hasher::new())
        }
    }

    impl Hasher for Blake3Hasher {
        fn update(&mut self, data: &[u8]) {
            self.0.update(data);
        }

        fn finish(self) -> Digest {
            self.0.finalize().into()
        }
    }
}
