/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::KEYS_PER_WORKER;
use crate::hash::Key;
use crate::mph::{partition_of, Backend, Fulcrums};
use std::sync::atomic::{AtomicU32, Ordering};

/// The bucket of a key and its position inside the bucket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    /// The global index `partition * buckets + bucket` of the bucket.
    pub bucket: usize,
    /// The position of the key inside the bucket.
    pub offset: u32,
}

/// The output of [`bucket_sizes`].
#[derive(Debug, Clone)]
pub struct BucketSizes {
    /// The size of each bucket, indexed by global bucket index.
    pub sizes: Vec<u32>,
    /// The placement of each key.
    pub placements: Vec<Placement>,
    /// The number of keys in buckets of each index, summed over partitions.
    pub histogram: Vec<u32>,
}

/// Computes the partition and bucket of each key, counts the keys in each
/// bucket and assigns each key a distinct position inside its bucket.
///
/// Positions are assigned by atomic increments, so with a parallel backend
/// the order of the keys inside a bucket depends on scheduling; nothing
/// downstream depends on that order.
pub fn bucket_sizes(
    backend: &impl Backend,
    keys: &[Key],
    partitions: usize,
    buckets: usize,
    fulcrums: &Fulcrums,
) -> BucketSizes {
    let counters = (0..partitions * buckets)
        .map(|_| AtomicU32::new(0))
        .collect::<Vec<_>>();
    let histogram = (0..buckets).map(|_| AtomicU32::new(0)).collect::<Vec<_>>();
    let mut placements = vec![Placement::default(); keys.len()];

    backend.run_chunks(&mut placements, KEYS_PER_WORKER, |worker, chunk| {
        let keys = &keys[worker * KEYS_PER_WORKER..];
        for (placement, key) in chunk.iter_mut().zip(keys) {
            let bucket = fulcrums.bucket(key.bucketer);
            let global = partition_of(key.partitioner, partitions) * buckets + bucket;
            *placement = Placement {
                bucket: global,
                offset: counters[global].fetch_add(1, Ordering::Relaxed),
            };
            histogram[bucket].fetch_add(1, Ordering::Relaxed);
        }
    });

    BucketSizes {
        sizes: counters.into_iter().map(AtomicU32::into_inner).collect(),
        placements,
        histogram: histogram.into_iter().map(AtomicU32::into_inner).collect(),
    }
}
