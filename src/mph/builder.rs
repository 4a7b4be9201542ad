/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::stages::*;
use super::{Backend, ConfigError, Mphf, MphfConfig};
use crate::enc::{OffsetEncoder, PilotEncoder};
use crate::hash::KeyHasher;
use derivative::Derivative;
use derive_setters::*;
use dsi_progress_logger::ProgressLog;
use log::debug;

/// The default bound on the pilot search.
pub const DEFAULT_MAX_PILOT: u32 = 1 << 24;

/// Fatal build errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum BuildError {
    #[error("Invalid configuration: {0}")]
    /// The key set or the parameters are not valid.
    Config(#[from] ConfigError),
    #[error("Construction failed: {0}")]
    /// The construction failed for the given key set and hash function;
    /// retrying with a different seed will usually succeed, unless there are
    /// duplicate keys.
    ConstructionFailed(#[from] SolveError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
/// Errors of the construction that depend on the hash function, and that
/// might be solved by a different seed.
pub enum SolveError {
    #[error("Partition {partition} contains {size} keys (maximum: {max})")]
    /// A partition contains more keys than the maximum partition size.
    PartitionTooLarge {
        partition: usize,
        size: usize,
        max: usize,
    },
    #[error("No pilot smaller than {max_pilot} places bucket {bucket} of partition {partition}")]
    /// The pilot search reached its bound.
    PilotSearchExhausted {
        partition: usize,
        bucket: usize,
        max_pilot: u32,
    },
    #[error("Duplicate key (or duplicate 128-bit hash) in bucket {bucket} of partition {partition}")]
    /// Two keys in the same bucket have the same hash.
    DuplicateKey { partition: usize, bucket: usize },
}

/// Statistics collected during a construction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    /// The number of keys in buckets of each index, summed over partitions.
    pub bucket_histogram: Vec<u32>,
    /// The largest pilot found.
    pub max_pilot: u32,
    /// The number of keys of the largest partition.
    pub max_partition_size: u32,
}

/// The raw result of a construction, before encoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Solution {
    /// The number of keys.
    pub n: usize,
    /// The number of partitions.
    pub partitions: usize,
    /// The number of buckets of each partition.
    pub buckets: usize,
    /// The pilots, indexed by `partition * buckets + bucket`.
    pub pilots: Vec<u32>,
    /// The `partitions + 1` partition offsets; the last one is `n`.
    pub partition_offsets: Vec<u32>,
    pub stats: BuildStats,
}

/// A builder for [`Mphf`]s.
///
/// The builder runs the construction pipeline on an execution
/// [backend](Backend) and encodes the result.
///
/// # Examples
///
/// ```rust
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use dsi_progress_logger::no_logging;
/// use phobic::prelude::*;
///
/// let keys = (0..1000_u64).collect::<Vec<_>>();
/// let mphf: FastMphf = MphfBuilder::default().build(
///     &Rayon::default(),
///     &keys,
///     XxHash::new_with_seed(0),
///     no_logging![],
/// )?;
///
/// let mut seen = vec![false; keys.len()];
/// for key in &keys {
///     let pos = mphf.get(key);
///     assert!(!seen[pos]);
///     seen[pos] = true;
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Setters, Debug, Clone, Derivative)]
#[derivative(Default)]
#[setters(generate = false)]
pub struct MphfBuilder {
    /// The construction parameters.
    #[setters(generate = true)]
    config: MphfConfig,

    /// The bound on the pilot search. If no pilot smaller than this value
    /// places a bucket, the construction fails. The default is 2²⁴.
    #[setters(generate = true)]
    #[derivative(Default(value = "DEFAULT_MAX_PILOT"))]
    max_pilot: u32,

    /// The fraction of the bucket range stored by the first encoder of dual
    /// pilot encoders. The default is 0.5.
    #[setters(generate = true)]
    #[derivative(Default(value = "0.5"))]
    tradeoff: f64,
}

impl MphfBuilder {
    /// Returns the configuration of this builder.
    pub fn get_config(&self) -> &MphfConfig {
        &self.config
    }

    /// Runs the construction pipeline and returns pilots and partition
    /// offsets without encoding them.
    pub fn solve<K: Sync, H: KeyHasher<K>>(
        &self,
        backend: &impl Backend,
        keys: &[K],
        hasher: &H,
        pl: &mut impl ProgressLog,
    ) -> Result<Solution, BuildError> {
        let n = keys.len();
        if n == 0 {
            return Err(ConfigError::EmptyKeySet.into());
        }
        if n > u32::MAX as usize {
            return Err(ConfigError::TooManyKeys(n).into());
        }

        let config = &self.config;
        let partitions = config.partitions(n);
        let buckets = config.bucket_count();

        pl.info(format_args!("{}", config));
        pl.info(format_args!(
            "Keys: {}, partitions: {}, backend: {}, hash: {}",
            n,
            partitions,
            backend.name(),
            H::name()
        ));

        pl.item_name("key");
        pl.expected_updates(Some(n));
        pl.start("Hashing keys...");
        let hashes = hash_keys(backend, keys, hasher);
        pl.done_with_count(n);

        pl.start("Computing bucket sizes...");
        let BucketSizes {
            sizes,
            placements,
            histogram,
        } = bucket_sizes(backend, &hashes, partitions, buckets, config.fulcrums());
        pl.done_with_count(n);

        pl.item_name("partition");
        pl.expected_updates(Some(partitions));
        pl.start("Sorting buckets...");
        let SortedBuckets {
            order,
            mut starts,
            partition_sizes,
        } = bucket_sort(
            backend,
            &sizes,
            buckets,
            config.sorting_bins(),
            config.partition_max_size(),
        )?;
        pl.done_with_count(partitions);

        pl.start("Computing partition offsets...");
        let partition_offsets = prefix_sum(backend, &partition_sizes);
        apply_offsets(backend, &mut starts, buckets, &partition_offsets);
        pl.done_with_count(partitions);

        pl.item_name("key");
        pl.expected_updates(Some(n));
        pl.start("Redistributing keys...");
        let lower = redistribute(backend, &hashes, &placements, &starts);
        drop(hashes);
        drop(placements);
        pl.done_with_count(n);

        pl.item_name("partition");
        pl.expected_updates(Some(partitions));
        pl.start("Searching pilots...");
        let Pilots { pilots, max_pilot } = search(
            backend,
            &order,
            &sizes,
            buckets,
            &partition_offsets,
            &lower,
            self.max_pilot,
        )?;
        pl.done_with_count(partitions);

        let stats = BuildStats {
            bucket_histogram: histogram,
            max_pilot,
            max_partition_size: partition_sizes.iter().copied().max().unwrap_or(0),
        };
        pl.info(format_args!(
            "Max pilot: {}, max partition size: {}",
            stats.max_pilot, stats.max_partition_size
        ));
        debug!("Bucket histogram: {:?}", stats.bucket_histogram);

        Ok(Solution {
            n,
            partitions,
            buckets,
            pilots,
            partition_offsets,
            stats,
        })
    }

    /// Builds and encodes an [`Mphf`] for the given keys.
    ///
    /// Construction fails with [`BuildError::ConstructionFailed`] when the
    /// keys contain duplicates, or, with very low probability, for a
    /// specific combination of keys and hash function; in the latter case
    /// callers can retry with a different seed.
    pub fn build<K: Sync, P: PilotEncoder, O: OffsetEncoder, H: KeyHasher<K>>(
        &self,
        backend: &impl Backend,
        keys: &[K],
        hasher: H,
        pl: &mut impl ProgressLog,
    ) -> Result<Mphf<P, O, H>, BuildError> {
        if !(0.0..=1.0).contains(&self.tradeoff) {
            return Err(ConfigError::InvalidTradeoff(self.tradeoff).into());
        }
        let solution = self.solve(backend, keys, &hasher, pl)?;

        pl.start("Encoding...");
        let mphf = Mphf::encode(&solution, &self.config, hasher, self.tradeoff);
        pl.done();
        pl.info(format_args!(
            "Pilot encoder: {}, offset encoder: {}, bits/key: {:.3}",
            P::name(),
            O::name(),
            mphf.bits_per_key()
        ));

        Ok(mphf)
    }
}
