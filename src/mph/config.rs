/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{Bucketer, OptBucketer};
use mem_dbg::*;

/// The number of samples of the bucketer in a [fulcrum table](Fulcrums).
pub const FULCS_INTER: usize = 32;

/// The default average bucket size.
pub const DEFAULT_LAMBDA: f64 = 7.5;

/// The default expected number of keys per partition.
pub const DEFAULT_PARTITION_SIZE: usize = 2048;

/// The default number of bins of the bucket sort.
pub const DEFAULT_SORTING_BINS: usize = 256;

/// An upper bound on the probability that a partition contains more than
/// [`MphfConfig::partition_max_size`] keys.
pub const PARTITION_OVERFLOW_PROBABILITY: f64 = 1E-12;

/// Partition sizes from which half a partition of slack is always enough.
const POISSON_SLACK_THRESHOLD: usize = 1 << 12;

/// Returns the smallest *k* such that a Poisson variable of mean `lambda`
/// exceeds *k* with probability at most `bound`.
///
/// Probabilities are computed in log space. Past the mode the ratio of
/// consecutive probabilities P(*j* + 1) / P(*j*) = λ / (*j* + 1) decreases,
/// so the tail beyond *k* is at most P(*k* + 1) / (1 − λ / (*k* + 2)).
pub fn poisson_upper_quantile(lambda: f64, bound: f64) -> usize {
    let ln_lambda = lambda.ln();
    let ln_bound = bound.ln();
    // ln P(X = k)
    let mut ln_p = -lambda;
    let mut k = 0_usize;
    loop {
        let ln_next = ln_p + ln_lambda - ((k + 1) as f64).ln();
        let ratio = lambda / (k + 2) as f64;
        if ratio < 1.0 && ln_next - (1.0 - ratio).ln() <= ln_bound {
            return k;
        }
        ln_p = ln_next;
        k += 1;
    }
}

/// Invalid construction parameters.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("The key set is empty")]
    /// There are no keys.
    EmptyKeySet,
    #[error("Too many keys: {0} (at most 2³² - 1 keys are supported)")]
    /// The number of keys does not fit in a `u32`.
    TooManyKeys(usize),
    #[error("Invalid average bucket size: {0}")]
    /// The average bucket size is not finite and positive, or it is so large
    /// that partitions would have no buckets.
    InvalidLambda(f64),
    #[error("Invalid partition size: {0}")]
    /// The partition size is zero or too large.
    InvalidPartitionSize(usize),
    #[error("Too many buckets per partition: {0} (must be smaller than 2¹⁶)")]
    /// The number of buckets per partition does not fit the fixed-point
    /// representation of the fulcrum table.
    TooManyBuckets(usize),
    #[error("Invalid number of sorting bins: {0}")]
    /// There must be at least two sorting bins.
    InvalidSortingBins(usize),
    #[error("Invalid encoder tradeoff: {0} (must be in [0..1])")]
    /// The fraction of buckets assigned to the first encoder of a dual
    /// encoder is not in [0..1].
    InvalidTradeoff(f64),
}

/// A fixed-point sampling of a [`Bucketer`] used to compute bucket indices
/// by linear interpolation.
///
/// The table contains [`FULCS_INTER`] nondecreasing values, the first being
/// zero and the last being the number of buckets per partition shifted left
/// by 16 bits.
#[derive(Debug, Clone, PartialEq, Eq, MemDbg, MemSize)]
pub struct Fulcrums {
    values: Box<[u32]>,
}

impl Fulcrums {
    /// Samples `bucketer` for a partition with `buckets` buckets.
    pub fn new(bucketer: &impl Bucketer, buckets: usize) -> Self {
        let last = (buckets as u64) << 16;
        let mut values = Vec::with_capacity(FULCS_INTER);
        let mut max = 0;
        for i in 0..FULCS_INTER {
            let x = i as f64 / (FULCS_INTER - 1) as f64;
            let y = bucketer.bucket_rel(x).clamp(0.0, 1.0);
            let value = if i == 0 {
                0
            } else if i == FULCS_INTER - 1 {
                last
            } else {
                Ord::min((y * buckets as f64 * 65536.0) as u64, last)
            };
            max = Ord::max(max, value);
            values.push(max as u32);
        }
        Self {
            values: values.into_boxed_slice(),
        }
    }

    /// Returns the bucket index of a key with given `bucketer` field.
    ///
    /// The result is smaller than the number of buckets the table was built
    /// for.
    #[inline(always)]
    pub fn bucket(&self, bucketer: u32) -> usize {
        let z = bucketer as u64 * (FULCS_INTER as u64 - 1);
        let index = (z >> 32) as usize;
        let part = z & 0xFFFF_FFFF;
        let v1 = (self.values[index] as u64 * (0xFFFF_FFFF - part)) >> 32;
        let v2 = (self.values[index + 1] as u64 * part) >> 32;
        ((v1 + v2) >> 16) as usize
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.values
    }

    pub fn num_bits(&self) -> u64 {
        self.values.len() as u64 * 32
    }
}

/// Immutable construction parameters.
///
/// A configuration fixes the average bucket size λ, the expected number of
/// keys per partition, the number of buckets per partition (the rounded
/// ratio of the previous two) and the [fulcrum table](Fulcrums) sampled from
/// a [`Bucketer`].
///
/// # Examples
///
/// ```rust
/// # use phobic::mph::{MphfConfig, SkewBucketer};
/// let config = MphfConfig::new(7.5, 1024, &mut SkewBucketer)?;
/// assert_eq!(config.bucket_count(), 137);
/// assert_eq!(config.partition_max_size(), 1536);
/// # Ok::<(), phobic::mph::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct MphfConfig {
    lambda: f64,
    partition_size: usize,
    bucket_count: usize,
    partition_max_size: usize,
    sorting_bins: usize,
    bucketer_name: &'static str,
    fulcrums: Fulcrums,
}

impl MphfConfig {
    /// Creates a configuration with given average bucket size and expected
    /// partition size, initializing and sampling `bucketer`.
    pub fn new(
        lambda: f64,
        partition_size: usize,
        bucketer: &mut impl Bucketer,
    ) -> Result<Self, ConfigError> {
        if !lambda.is_finite() || lambda <= 0.0 {
            return Err(ConfigError::InvalidLambda(lambda));
        }
        // The maximum partition size must fit in a u32
        if partition_size == 0 || partition_size > (u32::MAX / 2) as usize {
            return Err(ConfigError::InvalidPartitionSize(partition_size));
        }
        let bucket_count = (partition_size as f64 / lambda).round() as usize;
        if bucket_count == 0 {
            return Err(ConfigError::InvalidLambda(lambda));
        }
        if bucket_count >= 1 << 16 {
            return Err(ConfigError::TooManyBuckets(bucket_count));
        }
        Ok(Self::build(lambda, partition_size, bucket_count, bucketer))
    }

    fn build(
        lambda: f64,
        partition_size: usize,
        bucket_count: usize,
        bucketer: &mut impl Bucketer,
    ) -> Self {
        bucketer.init(lambda, partition_size as f64);
        let mut partition_max_size = partition_size + partition_size / 2;
        if partition_size < POISSON_SLACK_THRESHOLD {
            partition_max_size = Ord::max(
                partition_max_size,
                poisson_upper_quantile(partition_size as f64, PARTITION_OVERFLOW_PROBABILITY),
            );
        }
        Self {
            lambda,
            partition_size,
            partition_max_size,
            bucket_count,
            sorting_bins: DEFAULT_SORTING_BINS,
            bucketer_name: bucketer.name(),
            fulcrums: Fulcrums::new(bucketer, bucket_count),
        }
    }

    /// Sets the number of bins of the bucket sort. Buckets larger than the
    /// last bin are sorted by a slower path.
    pub fn with_sorting_bins(mut self, sorting_bins: usize) -> Result<Self, ConfigError> {
        if sorting_bins < 2 {
            return Err(ConfigError::InvalidSortingBins(sorting_bins));
        }
        self.sorting_bins = sorting_bins;
        Ok(self)
    }

    pub fn lambda(&self) -> f64 {
        self.lambda
    }

    pub fn partition_size(&self) -> usize {
        self.partition_size
    }

    /// Returns the number of buckets of each partition.
    pub fn bucket_count(&self) -> usize {
        self.bucket_count
    }

    pub fn sorting_bins(&self) -> usize {
        self.sorting_bins
    }

    pub fn bucketer_name(&self) -> &'static str {
        self.bucketer_name
    }

    pub fn fulcrums(&self) -> &Fulcrums {
        &self.fulcrums
    }

    /// Returns the maximum number of keys a partition may contain.
    ///
    /// This is one and a half times the partition size, or, for small
    /// partitions, the size exceeded with probability at most
    /// [`PARTITION_OVERFLOW_PROBABILITY`] if larger.
    pub fn partition_max_size(&self) -> usize {
        self.partition_max_size
    }

    /// Returns the number of partitions for `n` keys.
    pub fn partitions(&self, n: usize) -> usize {
        Ord::max(1, n.div_ceil(self.partition_size))
    }
}

impl Default for MphfConfig {
    /// λ = 7.5, 2048 keys per partition, [optimized bucketer](OptBucketer).
    fn default() -> Self {
        Self::build(
            DEFAULT_LAMBDA,
            DEFAULT_PARTITION_SIZE,
            (DEFAULT_PARTITION_SIZE as f64 / DEFAULT_LAMBDA).round() as usize,
            &mut OptBucketer::default(),
        )
    }
}

impl std::fmt::Display for MphfConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "λ: {}, partition size: {}, buckets per partition: {}, sorting bins: {}, bucketer: {}",
            self.lambda, self.partition_size, self.bucket_count, self.sorting_bins, self.bucketer_name
        )
    }
}

/// Returns the partition of a key with given `partitioner` field.
#[inline(always)]
pub fn partition_of(partitioner: u32, partitions: usize) -> usize {
    ((partitioner as u64 * partitions as u64) >> 32) as usize
}

#[cfg(test)]
mod test_config {
    use super::*;
    use crate::mph::{SkewBucketer, UniformBucketer};

    #[test]
    fn test_uniform_fulcrums() {
        let fulcrums = Fulcrums::new(&UniformBucketer, 100);
        assert_eq!(fulcrums.as_slice()[0], 0);
        assert_eq!(fulcrums.as_slice()[FULCS_INTER - 1], 100 << 16);
        assert_eq!(fulcrums.bucket(0), 0);
        assert_eq!(fulcrums.bucket(u32::MAX), 99);
        assert_eq!(fulcrums.bucket(1 << 31), 49);
    }

    #[test]
    fn test_bucket_range() {
        let config = MphfConfig::new(3.0, 1000, &mut SkewBucketer).unwrap();
        let fulcrums = config.fulcrums();
        let mut prev = 0;
        for i in 0..=1_000_000_u64 {
            let bucketer = (i * (u32::MAX as u64) / 1_000_000) as u32;
            let bucket = fulcrums.bucket(bucketer);
            assert!(bucket < config.bucket_count());
            assert!(bucket + 1 >= prev);
            prev = bucket;
        }
        assert_eq!(prev, config.bucket_count() - 1);
    }

    #[test]
    fn test_errors() {
        assert_eq!(
            MphfConfig::new(0.0, 1000, &mut UniformBucketer).unwrap_err(),
            ConfigError::InvalidLambda(0.0)
        );
        assert!(MphfConfig::new(f64::NAN, 1000, &mut UniformBucketer).is_err());
        assert_eq!(
            MphfConfig::new(2000.0, 100, &mut UniformBucketer).unwrap_err(),
            ConfigError::InvalidLambda(2000.0)
        );
        assert_eq!(
            MphfConfig::new(1.0, 0, &mut UniformBucketer).unwrap_err(),
            ConfigError::InvalidPartitionSize(0)
        );
        assert_eq!(
            MphfConfig::new(1.0, 1 << 16, &mut UniformBucketer).unwrap_err(),
            ConfigError::TooManyBuckets(1 << 16)
        );
        assert!(MphfConfig::default().with_sorting_bins(1).is_err());
    }

    #[test]
    fn test_default() {
        let config = MphfConfig::default();
        assert_eq!(config.partition_size(), 2048);
        assert_eq!(config.bucket_count(), 273);
        assert_eq!(config.sorting_bins(), 256);
        assert_eq!(config.partitions(0), 1);
        assert_eq!(config.partitions(2048), 1);
        assert_eq!(config.partitions(2049), 2);
    }

    #[test]
    fn test_poisson_upper_quantile() {
        for lambda in [1.0, 16.0, 100.0] {
            let k = poisson_upper_quantile(lambda, PARTITION_OVERFLOW_PROBABILITY);
            // Sum the tail directly, starting from P(X = k + 1)
            let mut p = (-lambda).exp();
            for j in 1..=k + 1 {
                p *= lambda / j as f64;
            }
            let mut tail = 0.0;
            for j in k + 1..k + 200 {
                tail += p;
                p *= lambda / (j + 1) as f64;
            }
            assert!(tail <= PARTITION_OVERFLOW_PROBABILITY, "λ = {}: {}", lambda, tail);
            assert!(k as f64 > lambda);
        }
        assert!(poisson_upper_quantile(2048.0, PARTITION_OVERFLOW_PROBABILITY) < 3072);
    }

    #[test]
    fn test_partition_max_size() {
        let config = MphfConfig::new(2.0, 16, &mut UniformBucketer).unwrap();
        assert!(config.partition_max_size() > 27);
        assert_eq!(
            config.partition_max_size(),
            poisson_upper_quantile(16.0, PARTITION_OVERFLOW_PROBABILITY)
        );
        let config = MphfConfig::new(7.5, 2048, &mut UniformBucketer).unwrap();
        assert_eq!(config.partition_max_size(), 3072);
        let config = MphfConfig::new(2000.0, 1 << 20, &mut UniformBucketer).unwrap();
        assert_eq!(config.partition_max_size(), 3 << 19);
    }

    #[test]
    fn test_partition_of() {
        assert_eq!(partition_of(0, 10), 0);
        assert_eq!(partition_of(u32::MAX, 10), 9);
        assert_eq!(partition_of(u32::MAX, 1), 0);
    }
}
