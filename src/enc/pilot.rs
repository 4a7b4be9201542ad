/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Pilot encoders.

Pilot encoders route each (partition, bucket) pair to a [`SequenceEncoder`].
Pilots of buckets with the same index in different partitions follow the
same distribution (large buckets, which come first, need larger pilots), so
encoders that keep bucket indices apart ([`Ortho`] and the dual encoders)
usually compress better than a single flat encoder ([`Mono`]).

Dual encoders split the bucket range at ⌊`buckets` · `tradeoff`⌋, store the
first part with one sequence encoder and the second part with another, and
encode the two parts concurrently.

*/

use super::{PilotEncoder, SequenceEncoder};
use mem_dbg::*;
use rayon::prelude::*;
use std::ops::Range;

fn split_point(buckets: usize, tradeoff: f64) -> usize {
    Ord::min((buckets as f64 * tradeoff.clamp(0.0, 1.0)) as usize, buckets)
}

/// Collects in partition-major order the pilots of the buckets in `range`.
fn gather(pilots: &[u32], partitions: usize, buckets: usize, range: Range<usize>) -> Vec<u64> {
    let mut result = Vec::with_capacity(partitions * range.len());
    for p in 0..partitions {
        result.extend(
            pilots[p * buckets + range.start..p * buckets + range.end]
                .iter()
                .map(|&x| x as u64),
        );
    }
    result
}

/// A single sequence encoder over all pilots.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct Mono<E> {
    buckets: usize,
    enc: E,
}

impl<E: SequenceEncoder> PilotEncoder for Mono<E> {
    fn encode(pilots: &[u32], partitions: usize, buckets: usize, _tradeoff: f64) -> Self {
        debug_assert_eq!(pilots.len(), partitions * buckets);
        Self {
            buckets,
            enc: E::encode(&pilots.iter().map(|&x| x as u64).collect::<Vec<_>>()),
        }
    }

    #[inline(always)]
    fn access(&self, partition: usize, bucket: usize) -> u64 {
        self.enc.access(partition * self.buckets + bucket)
    }

    fn num_bits(&self) -> u64 {
        self.enc.num_bits()
    }

    fn name() -> String {
        format!("Mono<{}>", E::name())
    }
}

/// One sequence encoder per bucket index, storing the pilots of that bucket
/// in all partitions.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct Ortho<E> {
    columns: Vec<E>,
}

impl<E: SequenceEncoder> Ortho<E> {
    /// Encodes the columns of the bucket indices in `range`.
    fn encode_columns(
        pilots: &[u32],
        partitions: usize,
        buckets: usize,
        range: Range<usize>,
    ) -> Self {
        let columns = range
            .into_par_iter()
            .map(|b| {
                E::encode(
                    &(0..partitions)
                        .map(|p| pilots[p * buckets + b] as u64)
                        .collect::<Vec<_>>(),
                )
            })
            .collect();
        Self { columns }
    }
}

impl<E: SequenceEncoder> PilotEncoder for Ortho<E> {
    fn encode(pilots: &[u32], partitions: usize, buckets: usize, _tradeoff: f64) -> Self {
        debug_assert_eq!(pilots.len(), partitions * buckets);
        Self::encode_columns(pilots, partitions, buckets, 0..buckets)
    }

    #[inline(always)]
    fn access(&self, partition: usize, bucket: usize) -> u64 {
        self.columns[bucket].access(partition)
    }

    fn num_bits(&self) -> u64 {
        self.columns.iter().map(|c| c.num_bits()).sum()
    }

    fn name() -> String {
        format!("Ortho<{}>", E::name())
    }
}

/// Two [`Ortho`] encoders over the two parts of the bucket range.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct OrthoDual<E1, E2> {
    buckets1: usize,
    first: Ortho<E1>,
    second: Ortho<E2>,
}

impl<E1: SequenceEncoder, E2: SequenceEncoder> PilotEncoder for OrthoDual<E1, E2> {
    fn encode(pilots: &[u32], partitions: usize, buckets: usize, tradeoff: f64) -> Self {
        debug_assert_eq!(pilots.len(), partitions * buckets);
        let buckets1 = split_point(buckets, tradeoff);
        let (first, second) = rayon::join(
            || Ortho::encode_columns(pilots, partitions, buckets, 0..buckets1),
            || Ortho::encode_columns(pilots, partitions, buckets, buckets1..buckets),
        );
        Self {
            buckets1,
            first,
            second,
        }
    }

    #[inline(always)]
    fn access(&self, partition: usize, bucket: usize) -> u64 {
        if bucket < self.buckets1 {
            self.first.access(partition, bucket)
        } else {
            self.second.access(partition, bucket - self.buckets1)
        }
    }

    fn num_bits(&self) -> u64 {
        self.first.num_bits() + self.second.num_bits()
    }

    fn name() -> String {
        format!("OrthoDual<{},{}>", E1::name(), E2::name())
    }
}

/// Two flat sequence encoders over the two parts of the bucket range.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct MultiDual<E1, E2> {
    buckets1: usize,
    buckets2: usize,
    first: E1,
    second: E2,
}

impl<E1: SequenceEncoder, E2: SequenceEncoder> PilotEncoder for MultiDual<E1, E2> {
    fn encode(pilots: &[u32], partitions: usize, buckets: usize, tradeoff: f64) -> Self {
        debug_assert_eq!(pilots.len(), partitions * buckets);
        let buckets1 = split_point(buckets, tradeoff);
        let (first, second) = rayon::join(
            || E1::encode(&gather(pilots, partitions, buckets, 0..buckets1)),
            || E2::encode(&gather(pilots, partitions, buckets, buckets1..buckets)),
        );
        Self {
            buckets1,
            buckets2: buckets - buckets1,
            first,
            second,
        }
    }

    #[inline(always)]
    fn access(&self, partition: usize, bucket: usize) -> u64 {
        if bucket < self.buckets1 {
            self.first.access(partition * self.buckets1 + bucket)
        } else {
            self.second
                .access(partition * self.buckets2 + bucket - self.buckets1)
        }
    }

    fn num_bits(&self) -> u64 {
        self.first.num_bits() + self.second.num_bits()
    }

    fn name() -> String {
        format!("MultiDual<{},{}>", E1::name(), E2::name())
    }
}
