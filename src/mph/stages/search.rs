/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Pilot search.

The buckets of each partition are placed one at a time, largest first. For
the current bucket, candidate pilots 0, 1, 2, … are tried until one maps all
the keys of the bucket to distinct slots of the partition that are not yet
occupied; the slots are then marked as occupied. Partitions are independent,
and are searched in parallel.

The slot of a key for a given pilot is computed by [`hash_pos`], which is
also used at query time.

*/

use crate::bits::BitVec;
use crate::mph::{Backend, SolveError};
use crate::utils::{compute_m, fastdiv, fastmod};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

/// Mixes a 32-bit value into another one.
#[inline(always)]
fn mix(pilot: u32, key: u32) -> u32 {
    let mut k = key ^ pilot;
    k = ((k >> 16) ^ k).wrapping_mul(0x45d_9f3b);
    k = ((k >> 16) ^ k).wrapping_mul(0x45d_9f3b);
    (k >> 16) ^ k
}

/// Returns the slot in `[0..size)` of a key with residual fields `lower1`
/// and `lower2` for the given pilot; `m` must be [`compute_m(size)`](compute_m).
///
/// Consecutive pilots in the same block of `size` pilots shift the slot by
/// one, whereas different blocks lead to independent slots.
#[inline(always)]
pub fn hash_pos(pilot: u32, lower1: u32, lower2: u32, m: u64, size: u32) -> u32 {
    let hashed_pilot = fastdiv(pilot, m);
    let hash = mix(lower1, mix(lower2, hashed_pilot)) >> 1;
    fastmod(hash.wrapping_add(pilot), m, size)
}

/// The output of [`search`].
#[derive(Debug, Clone)]
pub struct Pilots {
    /// One pilot per bucket, indexed by global bucket index.
    pub pilots: Vec<u32>,
    /// The largest pilot found.
    pub max_pilot: u32,
}

/// Finds a pilot for each bucket.
///
/// `order` and `sizes` describe the buckets of each partition in placement
/// order (see [`bucket_sort`](super::bucket_sort)), `partition_offsets` the
/// range of keys of each partition in `lower` (see
/// [`redistribute`](super::redistribute)).
///
/// # Errors
///
/// [`SolveError::DuplicateKey`] if two keys have the same residual fields
/// and fall in the same bucket, and [`SolveError::PilotSearchExhausted`] if
/// no pilot smaller than `max_pilot` places a bucket.
pub fn search(
    backend: &impl Backend,
    order: &[u32],
    sizes: &[u32],
    buckets: usize,
    partition_offsets: &[u32],
    lower: &[u64],
    max_pilot: u32,
) -> Result<Pilots, SolveError> {
    let mut pilots = vec![0_u32; sizes.len()];
    let max_found = AtomicU32::new(0);
    let failed = AtomicBool::new(false);

    backend.try_run_chunks(&mut pilots, buckets, |partition, pilots| {
        if failed.load(Ordering::Relaxed) {
            return Ok(());
        }
        let start = partition_offsets[partition] as usize;
        let size = partition_offsets[partition + 1] - start as u32;
        if size == 0 {
            return Ok(());
        }
        let m = compute_m(size);
        let mut taken = BitVec::new(size as usize);
        let mut slots = Vec::<u32>::new();
        let mut sorted_keys = Vec::<u64>::new();
        let mut pos = start;
        let mut partition_max = 0;

        for &bucket in &order[partition * buckets..][..buckets] {
            let bucket = bucket as usize;
            let bucket_size = sizes[partition * buckets + bucket] as usize;
            if bucket_size == 0 {
                // Buckets are sorted by size
                break;
            }
            let keys = &lower[pos..pos + bucket_size];
            pos += bucket_size;

            sorted_keys.clear();
            sorted_keys.extend_from_slice(keys);
            sorted_keys.sort_unstable();
            if sorted_keys.windows(2).any(|w| w[0] == w[1]) {
                failed.store(true, Ordering::Relaxed);
                return Err(SolveError::DuplicateKey { partition, bucket });
            }

            let mut pilot = 0_u32;
            'search: loop {
                if pilot >= max_pilot {
                    failed.store(true, Ordering::Relaxed);
                    return Err(SolveError::PilotSearchExhausted {
                        partition,
                        bucket,
                        max_pilot,
                    });
                }
                slots.clear();
                for &key in keys {
                    let slot = hash_pos(pilot, key as u32, (key >> 32) as u32, m, size);
                    if taken.get(slot as usize) {
                        pilot += 1;
                        continue 'search;
                    }
                    slots.push(slot);
                }
                slots.sort_unstable();
                if slots.windows(2).any(|w| w[0] == w[1]) {
                    pilot += 1;
                    continue;
                }
                break;
            }

            for &slot in &slots {
                taken.set(slot as usize, true);
            }
            pilots[bucket] = pilot;
            partition_max = Ord::max(partition_max, pilot);
        }

        debug_assert_eq!(taken.count_ones(), size as usize);
        max_found.fetch_max(partition_max, Ordering::Relaxed);
        Ok(())
    })?;

    Ok(Pilots {
        pilots,
        max_pilot: max_found.into_inner(),
    })
}

#[cfg(test)]
mod test_search {
    use super::*;
    use crate::mph::Sequential;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_hash_pos_range() {
        let mut rng = SmallRng::seed_from_u64(0);
        for size in [1, 2, 3, 1000, 1 << 20, u32::MAX] {
            let m = compute_m(size);
            for _ in 0..1000 {
                let pos = hash_pos(rng.random(), rng.random(), rng.random(), m, size);
                assert!(pos < size);
            }
        }
    }

    #[test]
    fn test_single_partition() {
        let mut rng = SmallRng::seed_from_u64(0);
        // Ten buckets of sizes 10, 9, ..., 1 placed in this order
        let sizes = (1..=10).rev().collect::<Vec<u32>>();
        let order = (0..10).collect::<Vec<u32>>();
        let n = sizes.iter().sum::<u32>();
        let lower = (0..n).map(|_| rng.random()).collect::<Vec<u64>>();
        let result = search(&Sequential, &order, &sizes, 10, &[0, n], &lower, u32::MAX).unwrap();

        let m = compute_m(n);
        let mut slots = vec![];
        let mut pos = 0;
        for (bucket, &size) in sizes.iter().enumerate() {
            for &key in &lower[pos..pos + size as usize] {
                slots.push(hash_pos(result.pilots[bucket], key as u32, (key >> 32) as u32, m, n));
            }
            pos += size as usize;
        }
        slots.sort();
        assert!(slots.into_iter().eq(0..n));
        assert_eq!(result.max_pilot, *result.pilots.iter().max().unwrap());
    }

    #[test]
    fn test_duplicate_key() {
        let result = search(&Sequential, &[0], &[2], 1, &[0, 2], &[42, 42], u32::MAX);
        assert!(matches!(
            result,
            Err(SolveError::DuplicateKey {
                partition: 0,
                bucket: 0
            })
        ));
    }

    #[test]
    fn test_exhausted() {
        let mut rng = SmallRng::seed_from_u64(0);
        let lower = (0..100).map(|_| rng.random()).collect::<Vec<u64>>();
        // A single bucket of 100 keys needs a lucky pilot
        let result = search(&Sequential, &[0], &[100], 1, &[0, 100], &lower, 10);
        assert!(matches!(
            result,
            Err(SolveError::PilotSearchExhausted { max_pilot: 10, .. })
        ));
    }
}
