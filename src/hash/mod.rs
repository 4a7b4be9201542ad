/*
 *
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Initial hashing of input keys to 128-bit internal [keys](Key).
//!
//! Construction and evaluation never look at input keys directly: keys are
//! first mapped by a [`KeyHasher`] to a [`Key`] made of four independent
//! 32-bit fields. Three variants are provided:
//!
//! - [`NoHash`], for keys that are already uniformly random 128-bit values;
//! - [`MurmurHash2`], which concatenates two 64-bit MurmurHash2 values
//!   computed with complementary seeds;
//! - [`XxHash`], based on the 128-bit XXH3 hash.
//!
//! Correctness of the construction relies on the fields of the resulting
//! [`Key`] behaving as independent uniform random variables. This is an
//! assumption, not something the construction checks: in particular,
//! [`NoHash`] on structured keys will make construction fail.

mod murmur;
pub use murmur::*;

use mem_dbg::*;
use xxhash_rust::xxh3;

/// The internal 128-bit representation of a key.
///
/// `partitioner` selects the partition, `bucketer` the bucket within the
/// partition, and `lower1`/`lower2` are mixed with the bucket pilot to
/// obtain the final position.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, MemDbg, MemSize)]
pub struct Key {
    pub partitioner: u32,
    pub bucketer: u32,
    pub lower1: u32,
    pub lower2: u32,
}

impl Key {
    #[inline(always)]
    pub const fn new(partitioner: u32, bucketer: u32, lower1: u32, lower2: u32) -> Self {
        Self {
            partitioner,
            bucketer,
            lower1,
            lower2,
        }
    }

    /// Splits a 128-bit hash given as two 64-bit halves: the lower half
    /// provides the partitioner (low bits) and the bucketer (high bits), the
    /// upper half the two residual fields.
    #[inline(always)]
    pub const fn from_halves(low: u64, high: u64) -> Self {
        Self {
            partitioner: low as u32,
            bucketer: (low >> 32) as u32,
            lower1: high as u32,
            lower2: (high >> 32) as u32,
        }
    }

    /// Returns the residual fields packed in a single word, `lower1` in the
    /// low bits.
    #[inline(always)]
    pub const fn lower(&self) -> u64 {
        self.lower1 as u64 | (self.lower2 as u64) << 32
    }
}

impl From<[u32; 4]> for Key {
    #[inline(always)]
    fn from(value: [u32; 4]) -> Self {
        Key::new(value[0], value[1], value[2], value[3])
    }
}

/// A view of a key as a sequence of bytes, used by the byte-oriented
/// hashers.
///
/// Integers are viewed in little-endian order, so hashes do not depend on
/// the platform.
pub trait KeyBytes {
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R;
}

impl KeyBytes for [u8] {
    #[inline(always)]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl KeyBytes for Vec<u8> {
    #[inline(always)]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self)
    }
}

impl KeyBytes for str {
    #[inline(always)]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

impl KeyBytes for String {
    #[inline(always)]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(self.as_bytes())
    }
}

macro_rules! impl_key_bytes_int {
    ($($ty:ty),*) => {$(
        impl KeyBytes for $ty {
            #[inline(always)]
            fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
                f(&self.to_le_bytes())
            }
        }
    )*};
}

impl_key_bytes_int!(u32, u64, u128, usize, i32, i64);

impl KeyBytes for (u64, u64) {
    #[inline(always)]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&((self.0 as u128) | (self.1 as u128) << 64).to_le_bytes())
    }
}

impl KeyBytes for [u32; 4] {
    #[inline(always)]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        let mut bytes = [0_u8; 16];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        f(&bytes)
    }
}

impl KeyBytes for Key {
    #[inline(always)]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        [self.partitioner, self.bucketer, self.lower1, self.lower2].with_bytes(f)
    }
}

impl<T: KeyBytes + ?Sized> KeyBytes for &T {
    #[inline(always)]
    fn with_bytes<R>(&self, f: impl FnOnce(&[u8]) -> R) -> R {
        (**self).with_bytes(f)
    }
}

/// Common properties of initial hash functions.
pub trait InitialHash: Clone + Send + Sync + std::fmt::Debug {
    /// A human-readable name for diagnostics.
    fn name() -> &'static str;
}

/// An initial hash function that can be seeded.
pub trait SeedableHasher: InitialHash {
    /// Creates a new hasher with the given seed.
    fn new_with_seed(seed: u64) -> Self;

    /// Returns the seed of this hasher.
    fn seed(&self) -> u64;
}

/// Maps input keys of type `T` to internal [keys](Key).
///
/// Implementations must be deterministic: the same hasher must map the same
/// key to the same [`Key`] at construction and at query time.
pub trait KeyHasher<T: ?Sized>: InitialHash {
    fn hash(&self, key: &T) -> Key;
}

/// The identity hash, for keys that are already uniformly random.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, MemDbg, MemSize)]
pub struct NoHash;

impl InitialHash for NoHash {
    fn name() -> &'static str {
        "none"
    }
}

impl KeyHasher<Key> for NoHash {
    #[inline(always)]
    fn hash(&self, key: &Key) -> Key {
        *key
    }
}

impl KeyHasher<[u32; 4]> for NoHash {
    #[inline(always)]
    fn hash(&self, key: &[u32; 4]) -> Key {
        Key::from(*key)
    }
}

/// Hashes keys with the 128-bit variant of
/// [XXH3](https://github.com/Cyan4973/xxHash).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, MemDbg, MemSize)]
pub struct XxHash {
    seed: u64,
}

impl InitialHash for XxHash {
    fn name() -> &'static str {
        "xxh3"
    }
}

impl SeedableHasher for XxHash {
    fn new_with_seed(seed: u64) -> Self {
        Self { seed }
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

impl<T: KeyBytes + ?Sized> KeyHasher<T> for XxHash {
    #[inline(always)]
    fn hash(&self, key: &T) -> Key {
        let hash128 = key.with_bytes(|bytes| xxh3::xxh3_128_with_seed(bytes, self.seed));
        Key::from_halves(hash128 as u64, (hash128 >> 64) as u64)
    }
}

#[cfg(test)]
mod test_hash {
    use super::*;

    #[test]
    fn test_from_halves() {
        let key = Key::from_halves(0x1111_1111_2222_2222, 0x3333_3333_4444_4444);
        assert_eq!(key.partitioner, 0x2222_2222);
        assert_eq!(key.bucketer, 0x1111_1111);
        assert_eq!(key.lower1, 0x4444_4444);
        assert_eq!(key.lower2, 0x3333_3333);
        assert_eq!(key.lower(), 0x3333_3333_4444_4444);
    }

    #[test]
    fn test_no_hash() {
        let key = Key::new(1, 2, 3, 4);
        assert_eq!(NoHash.hash(&key), key);
        assert_eq!(NoHash.hash(&[1, 2, 3, 4]), key);
    }

    #[test]
    fn test_xxhash_seeds() {
        let h0 = XxHash::new_with_seed(0);
        let h1 = XxHash::new_with_seed(1);
        assert_eq!(h0.hash("foo"), h0.hash(&String::from("foo")));
        assert_eq!(h0.hash("foo"), h0.hash(&b"foo"[..]));
        assert_ne!(h0.hash("foo"), h1.hash("foo"));
        assert_eq!(h1.seed(), 1);
        assert_ne!(h0.hash(&0_u64), h0.hash(&1_u64));
    }

    #[test]
    fn test_key_bytes_layout() {
        let key = Key::new(1, 2, 3, 4);
        let bytes = key.with_bytes(|b| b.to_vec());
        assert_eq!(bytes.len(), 16);
        assert_eq!(&bytes[0..4], &1_u32.to_le_bytes());
        assert_eq!(&bytes[12..16], &4_u32.to_le_bytes());
    }
}
