/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::mph::{Backend, SolveError};
use std::sync::atomic::{AtomicU32, Ordering};

/// The output of [`bucket_sort`].
#[derive(Debug, Clone)]
pub struct SortedBuckets {
    /// For each partition, its bucket indices in descending-size order
    /// (ties broken by increasing index), indexed by `partition * buckets +
    /// rank`.
    pub order: Vec<u32>,
    /// The offset of each bucket from the start of its partition in the
    /// sorted layout, indexed by global bucket index.
    pub starts: Vec<u32>,
    /// The number of keys in each partition.
    pub partition_sizes: Vec<u32>,
}

/// Sorts the buckets of each partition by decreasing size with a counting
/// sort on `sorting_bins` bins; buckets whose size does not fit the last bin
/// are sorted separately.
///
/// # Errors
///
/// [`SolveError::PartitionTooLarge`] if a partition contains more than
/// `partition_max_size` keys.
pub fn bucket_sort(
    backend: &impl Backend,
    sizes: &[u32],
    buckets: usize,
    sorting_bins: usize,
    partition_max_size: usize,
) -> Result<SortedBuckets, SolveError> {
    let partitions = sizes.len() / buckets;
    let mut order = vec![0_u32; sizes.len()];
    let starts = (0..sizes.len())
        .map(|_| AtomicU32::new(0))
        .collect::<Vec<_>>();
    let partition_sizes = (0..partitions)
        .map(|_| AtomicU32::new(0))
        .collect::<Vec<_>>();

    backend.try_run_chunks(&mut order, buckets, |partition, order| {
        let sizes = &sizes[partition * buckets..][..buckets];
        let total = sizes.iter().map(|&s| s as usize).sum::<usize>();
        if total > partition_max_size {
            return Err(SolveError::PartitionTooLarge {
                partition,
                size: total,
                max: partition_max_size,
            });
        }

        // Counting sort; the last bin collects all larger buckets
        let overflow = sorting_bins - 1;
        let mut counts = vec![0_usize; sorting_bins];
        for &s in sizes {
            counts[Ord::min(s as usize, overflow)] += 1;
        }
        // Descending order: bin i starts after all larger bins
        let mut bin_starts = vec![0_usize; sorting_bins];
        let mut pos = 0;
        for bin in (0..sorting_bins).rev() {
            bin_starts[bin] = pos;
            pos += counts[bin];
        }
        for (bucket, &s) in sizes.iter().enumerate() {
            let bin = Ord::min(s as usize, overflow);
            order[bin_starts[bin]] = bucket as u32;
            bin_starts[bin] += 1;
        }
        // The overflow bin is at the start; a stable sort keeps
        // ties in increasing index order
        order[..counts[overflow]].sort_by_key(|&b| std::cmp::Reverse(sizes[b as usize]));

        let mut start = 0;
        for &bucket in order.iter() {
            starts[partition * buckets + bucket as usize].store(start, Ordering::Relaxed);
            start += sizes[bucket as usize];
        }
        partition_sizes[partition].store(start, Ordering::Relaxed);
        Ok(())
    })?;

    Ok(SortedBuckets {
        order,
        starts: starts.into_iter().map(AtomicU32::into_inner).collect(),
        partition_sizes: partition_sizes
            .into_iter()
            .map(AtomicU32::into_inner)
            .collect(),
    })
}
