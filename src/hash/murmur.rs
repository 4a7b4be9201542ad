/*
 *
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Austin Appleby's 64-bit MurmurHash2 (`MurmurHash64A`).

use super::{InitialHash, Key, KeyBytes, KeyHasher, SeedableHasher};
use mem_dbg::*;

const M: u64 = 0xc6a4_a793_5bd1_e995;
const R: u32 = 47;

/// Computes `MurmurHash64A` of `data` with the given seed.
#[must_use]
pub fn murmur_hash_64a(data: &[u8], seed: u64) -> u64 {
    let mut h = seed ^ (data.len() as u64).wrapping_mul(M);

    let chunks = data.chunks_exact(8);
    let tail = chunks.remainder();
    for chunk in chunks {
        let mut word = [0_u8; 8];
        word.copy_from_slice(chunk);
        let mut k = u64::from_le_bytes(word);

        k = k.wrapping_mul(M);
        k ^= k >> R;
        k = k.wrapping_mul(M);

        h ^= k;
        h = h.wrapping_mul(M);
    }

    if !tail.is_empty() {
        for (i, &byte) in tail.iter().enumerate() {
            h ^= (byte as u64) << (8 * i);
        }
        h = h.wrapping_mul(M);
    }

    h ^= h >> R;
    h = h.wrapping_mul(M);
    h ^= h >> R;
    h
}

/// Hashes keys to 128 bits by concatenating two [`MurmurHash64A`](murmur_hash_64a)
/// values computed with the seed and its complement.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, MemDbg, MemSize)]
pub struct MurmurHash2 {
    seed: u64,
}

impl InitialHash for MurmurHash2 {
    fn name() -> &'static str {
        "murmur2"
    }
}

impl SeedableHasher for MurmurHash2 {
    fn new_with_seed(seed: u64) -> Self {
        Self { seed }
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

impl<T: KeyBytes + ?Sized> KeyHasher<T> for MurmurHash2 {
    #[inline(always)]
    fn hash(&self, key: &T) -> Key {
        key.with_bytes(|bytes| {
            Key::from_halves(
                murmur_hash_64a(bytes, self.seed),
                murmur_hash_64a(bytes, !self.seed),
            )
        })
    }
}

#[cfg(test)]
mod test_murmur {
    use super::*;

    #[test]
    fn test_known_values() {
        // The empty input with seed zero is a fixed point of the mixing steps
        assert_eq!(murmur_hash_64a(b"", 0), 0);
        assert_ne!(murmur_hash_64a(b"", 1), 0);
    }

    #[test]
    fn test_tail_lengths() {
        let data = b"abcdefghijklmnopq";
        let hashes = (0..data.len())
            .map(|len| murmur_hash_64a(&data[..len], 42))
            .collect::<std::collections::HashSet<_>>();
        assert_eq!(hashes.len(), data.len());
    }

    #[test]
    fn test_halves_differ() {
        let key = MurmurHash2::new_with_seed(7).hash(&12345_u64);
        assert_ne!(key.partitioner as u64 | (key.bucketer as u64) << 32, key.lower());
    }
}
