/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::stages::hash_pos;
use super::{partition_of, Fulcrums, MphfConfig, Solution};
use crate::enc::{Compact, LinearDiff, OffsetEncoder, Ortho, PilotEncoder, Rice};
use crate::hash::{KeyHasher, XxHash};
use crate::utils::compute_m;
use mem_dbg::*;

/// A minimal perfect hash function with pilots encoded by `P`, partition
/// offsets encoded by `O`, and initial hash `H`.
///
/// Instances are built by a [`MphfBuilder`](super::MphfBuilder) and are
/// immutable. The function maps the `n` keys it was built on bijectively to
/// `[0..n)`; on any other key it returns an arbitrary value in `[0..n)`.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct Mphf<P, O, H> {
    /// The number of keys.
    n: usize,
    /// The number of partitions.
    partitions: usize,
    /// The number of buckets of each partition.
    buckets: usize,
    fulcrums: Fulcrums,
    hasher: H,
    pilots: P,
    offsets: O,
}

/// A function optimized for query speed.
pub type FastMphf = Mphf<Ortho<Compact>, LinearDiff<Compact>, XxHash>;

/// A function optimized for space.
pub type SmallMphf = Mphf<Ortho<Rice>, LinearDiff<Compact>, XxHash>;

impl<P: PilotEncoder, O: OffsetEncoder, H> Mphf<P, O, H> {
    /// Encodes a construction result; pilots and offsets are encoded
    /// concurrently.
    pub fn encode(solution: &Solution, config: &MphfConfig, hasher: H, tradeoff: f64) -> Self {
        let (pilots, offsets) = rayon::join(
            || {
                P::encode(
                    &solution.pilots,
                    solution.partitions,
                    solution.buckets,
                    tradeoff,
                )
            },
            || O::encode(&solution.partition_offsets, config.partition_size()),
        );
        Self {
            n: solution.n,
            partitions: solution.partitions,
            buckets: solution.buckets,
            fulcrums: config.fulcrums().clone(),
            hasher,
            pilots,
            offsets,
        }
    }

    /// Returns the value associated with `key`.
    ///
    /// If `key` was not in the key set used at construction time, the result
    /// is an arbitrary value in `[0..n)`.
    #[inline]
    pub fn get<K: ?Sized>(&self, key: &K) -> usize
    where
        H: KeyHasher<K>,
    {
        let key = self.hasher.hash(key);
        let partition = partition_of(key.partitioner, self.partitions);
        let bucket = self.fulcrums.bucket(key.bucketer);
        let pilot = self.pilots.access(partition, bucket) as u32;
        let offset = self.offsets.access(partition);
        let size = (self.offsets.access(partition + 1) - offset) as u32;
        if size == 0 {
            // Only keys outside the key set can land in an empty partition
            return 0;
        }
        offset as usize + hash_pos(pilot, key.lower1, key.lower2, compute_m(size), size) as usize
    }

    /// Returns the number of keys.
    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn partitions(&self) -> usize {
        self.partitions
    }

    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Returns the number of bits used by the pilots.
    pub fn pilot_bits(&self) -> u64 {
        self.pilots.num_bits()
    }

    /// Returns the number of bits used by the partition offsets.
    pub fn offset_bits(&self) -> u64 {
        self.offsets.num_bits()
    }

    /// Returns the overall number of bits: encoded pilots and offsets, the
    /// fulcrum table, and one word per partition.
    pub fn size_in_bits(&self) -> u64 {
        self.pilot_bits() + self.offset_bits() + self.fulcrums.num_bits() + 32 * self.partitions as u64
    }

    pub fn bits_per_key(&self) -> f64 {
        self.size_in_bits() as f64 / self.n as f64
    }

    /// Returns a one-line summary of the space usage.
    pub fn result_line(&self) -> String {
        let n = self.n as f64;
        format!(
            "total_bits={:.6} pilot_bits={:.6} offsets_bits={:.6}",
            self.bits_per_key(),
            self.pilot_bits() as f64 / n,
            self.offset_bits() as f64 / n
        )
    }
}

#[cfg(test)]
mod test_mphf {
    use super::*;
    use crate::enc::{Mono, MultiDual};
    use crate::hash::{MurmurHash2, SeedableHasher};
    use crate::mph::{MphfBuilder, Sequential, UniformBucketer};
    use dsi_progress_logger::no_logging;

    #[test]
    fn test_small() -> anyhow::Result<()> {
        let keys = (0..100_u32).collect::<Vec<_>>();
        let config = MphfConfig::new(3.0, 32, &mut UniformBucketer)?;
        let mphf: Mphf<MultiDual<Compact, Rice>, LinearDiff<Compact>, MurmurHash2> = MphfBuilder::default()
            .config(config)
            .build(&Sequential, &keys, MurmurHash2::new_with_seed(1), no_logging![])?;
        assert_eq!(mphf.len(), 100);
        assert_eq!(mphf.partitions(), 4);
        let mut values = keys.iter().map(|k| mphf.get(k)).collect::<Vec<_>>();
        values.sort();
        assert!(values.into_iter().eq(0..100));
        assert!(mphf.result_line().starts_with("total_bits="));
        Ok(())
    }

    #[test]
    fn test_size() -> anyhow::Result<()> {
        let keys = (0..10_000_u64).collect::<Vec<_>>();
        let mphf: Mphf<Mono<Compact>, LinearDiff<Compact>, XxHash> =
            MphfBuilder::default().build(&Sequential, &keys, XxHash::default(), no_logging![])?;
        assert_eq!(
            mphf.size_in_bits(),
            mphf.pilot_bits() + mphf.offset_bits() + 32 * 32 + 32 * mphf.partitions() as u64
        );
        assert!(mphf.mem_size(SizeFlags::default()) > 0);
        Ok(())
    }
}
