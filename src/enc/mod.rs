/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Succinct encoders for pilots and partition offsets.

There are three layers:

- [sequence encoders](SequenceEncoder) store a sequence of integers with
  random access: [`Compact`], [`Rice`], [`EliasFanoSeq`] and
  [`Dictionary`];
- [pilot encoders](PilotEncoder) store the two-dimensional array of pilots
  (one per partition and bucket) by routing each (partition, bucket) pair to
  one or more sequence encoders: [`Mono`], [`Ortho`], [`OrthoDual`] and
  [`MultiDual`];
- [partition-offset encoders](OffsetEncoder) store the `partitions + 1`
  cumulative partition offsets: [`Direct`] and [`LinearDiff`].

All encoders are lossless: accessing an encoded sequence returns exactly the
values it was encoded from.

Pilots are passed to pilot encoders in partition-major order, that is, the
pilot of bucket `b` of partition `p` is at index `p * buckets + b`.

*/

mod compact;
pub use compact::*;

mod rice;
pub use rice::*;

mod elias_fano;
pub use elias_fano::*;

mod dictionary;
pub use dictionary::*;

mod pilot;
pub use pilot::*;

mod offsets;
pub use offsets::*;

/// A sequence of integers supporting random access.
pub trait SequenceEncoder: Sized + Send + Sync {
    /// Encodes the given values.
    fn encode(values: &[u64]) -> Self;

    /// Returns the value of given index.
    ///
    /// # Panics
    ///
    /// May panic if `index` is not smaller than [`len`](SequenceEncoder::len).
    fn access(&self, index: usize) -> u64;

    /// Returns the number of encoded values.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the space occupied by the encoding, in bits.
    fn num_bits(&self) -> u64;

    fn name() -> String;
}

/// The encoded pilots of all buckets of all partitions.
pub trait PilotEncoder: Sized + Send + Sync {
    /// Encodes `partitions * buckets` pilots given in partition-major order.
    ///
    /// `tradeoff` is the fraction of the bucket range assigned to the first
    /// encoder of dual encoders; single encoders ignore it.
    fn encode(pilots: &[u32], partitions: usize, buckets: usize, tradeoff: f64) -> Self;

    /// Returns the pilot of bucket `bucket` of partition `partition`.
    fn access(&self, partition: usize, bucket: usize) -> u64;

    fn num_bits(&self) -> u64;

    fn name() -> String;
}

/// The encoded cumulative partition offsets.
pub trait OffsetEncoder: Sized + Send + Sync {
    /// Encodes the `partitions + 1` cumulative offsets; `partition_size` is
    /// the expected number of keys per partition.
    fn encode(offsets: &[u32], partition_size: usize) -> Self;

    /// Returns the offset of the first key of partition `partition`.
    fn access(&self, partition: usize) -> u64;

    fn num_bits(&self) -> u64;

    fn name() -> String;
}
