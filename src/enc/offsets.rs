/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{OffsetEncoder, SequenceEncoder};
use crate::utils::{zigzag_decode, zigzag_encode};
use mem_dbg::*;

/// Stores the partition offsets as they are.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct Direct<E> {
    enc: E,
}

impl<E: SequenceEncoder> OffsetEncoder for Direct<E> {
    fn encode(offsets: &[u32], _partition_size: usize) -> Self {
        Self {
            enc: E::encode(&offsets.iter().map(|&x| x as u64).collect::<Vec<_>>()),
        }
    }

    #[inline(always)]
    fn access(&self, partition: usize) -> u64 {
        self.enc.access(partition)
    }

    fn num_bits(&self) -> u64 {
        self.enc.num_bits()
    }

    fn name() -> String {
        format!("Direct<{}>", E::name())
    }
}

/// Stores the difference between each partition offset and its expected
/// value `partition · partition_size`, in zig-zag form.
///
/// Partitions have on average almost exactly the expected size, so the
/// differences are small.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct LinearDiff<E> {
    increment: u64,
    enc: E,
}

impl<E: SequenceEncoder> OffsetEncoder for LinearDiff<E> {
    fn encode(offsets: &[u32], partition_size: usize) -> Self {
        let increment = partition_size as u64;
        let diffs = offsets
            .iter()
            .enumerate()
            .map(|(i, &x)| zigzag_encode(x as i64 - (i as u64 * increment) as i64))
            .collect::<Vec<_>>();
        Self {
            increment,
            enc: E::encode(&diffs),
        }
    }

    #[inline(always)]
    fn access(&self, partition: usize) -> u64 {
        let expected = partition as u64 * self.increment;
        (expected as i64 + zigzag_decode(self.enc.access(partition))) as u64
    }

    fn num_bits(&self) -> u64 {
        self.enc.num_bits() + 64
    }

    fn name() -> String {
        format!("LinearDiff<{}>", E::name())
    }
}

#[cfg(test)]
mod test_offsets {
    use super::*;
    use crate::enc::{Compact, Rice};
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    fn random_offsets(partitions: usize, partition_size: usize) -> Vec<u32> {
        let mut rng = SmallRng::seed_from_u64(0);
        let mut offsets = vec![0_u32];
        let mut sum = 0;
        for _ in 0..partitions {
            sum += rng.random_range(partition_size - 50..partition_size + 50) as u32;
            offsets.push(sum);
        }
        offsets
    }

    #[test]
    fn test_offset_encoders() {
        let offsets = random_offsets(1000, 2048);
        let direct = Direct::<Compact>::encode(&offsets, 2048);
        let diff = LinearDiff::<Compact>::encode(&offsets, 2048);
        let diff_rice = LinearDiff::<Rice>::encode(&offsets, 2048);
        for (i, &x) in offsets.iter().enumerate() {
            assert_eq!(direct.access(i), x as u64);
            assert_eq!(diff.access(i), x as u64);
            assert_eq!(diff_rice.access(i), x as u64);
        }
        assert!(diff.num_bits() < direct.num_bits());
    }

    #[test]
    fn test_below_expected() {
        // Offsets lagging behind the expected line produce negative residuals
        let offsets = [0, 10, 15, 20];
        let diff = LinearDiff::<Compact>::encode(&offsets, 100);
        for (i, &x) in offsets.iter().enumerate() {
            assert_eq!(diff.access(i), x as u64);
        }
    }
}
