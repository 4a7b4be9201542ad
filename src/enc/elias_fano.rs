/*
 *
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Elias–Fano representation of monotone sequences, and a sequence encoder
based on it.

Given a monotone sequence 0 ≤ *x*₀ ≤ *x*₁ ≤ ... ≤ *x*<sub>*n* – 1</sub> ≤
*u*, the Elias–Fano representation stores the lower *s* = ⌊lg(*u* / *n*)⌋
bits of each element contiguously, and the upper bits in an array of *n* +
⌊*u* / 2<sup>*s*</sup>⌋ bits by setting, for each 0 ≤ *i* < *n*, the bit of
index ⌊*x*<sub>*i*</sub> / 2<sup>*s*</sup>⌋ + *i*. The upper bits of an
element are recovered by selecting the *i*-th one of the upper-bits array and
subtracting *i*.

[`EliasFanoSeq`] turns an arbitrary sequence into a monotone one by storing
its prefix sums, and returns elements as differences of consecutive sums.

*/

use super::SequenceEncoder;
use crate::bits::{BitFieldVec, BitVec};
use crate::rank_sel::SimpleSelect;
use crate::utils::bit_width;
use mem_dbg::*;

/// A monotone sequence in Elias–Fano representation.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct EliasFano {
    /// The number of values.
    n: usize,
    /// An upper bound to the values.
    u: u64,
    /// The lower-bits array.
    low_bits: BitFieldVec,
    /// The upper-bits array, with a selection structure.
    high_bits: SimpleSelect,
}

impl EliasFano {
    /// Builds the representation of a nondecreasing sequence.
    ///
    /// # Panics
    ///
    /// If the sequence is not nondecreasing.
    pub fn new(values: &[u64]) -> Self {
        let n = values.len();
        let u = values.last().copied().unwrap_or(0);
        let l = if n == 0 || u <= n as u64 {
            0
        } else {
            bit_width(u / n as u64) - 1
        };
        let low_mask = if l == 0 { 0 } else { u64::MAX >> (64 - l) };

        let mut low_bits = BitFieldVec::new(l, n);
        let mut high_bits = BitVec::new(n + (u >> l) as usize + 1);
        let mut prev = 0;
        for (i, &x) in values.iter().enumerate() {
            assert!(
                x >= prev,
                "The values are not nondecreasing: {} < {} at index {}",
                x,
                prev,
                i
            );
            prev = x;
            low_bits.set(i, x & low_mask);
            high_bits.set((x >> l) as usize + i, true);
        }

        Self {
            n,
            u,
            low_bits,
            high_bits: SimpleSelect::new(high_bits),
        }
    }

    /// Returns the element of given index.
    #[inline]
    pub fn get(&self, index: usize) -> u64 {
        let high = (self.high_bits.select(index) - index) as u64;
        high << self.low_bits.bit_width() | self.low_bits.get(index)
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Returns the upper bound (the last element).
    pub fn upper_bound(&self) -> u64 {
        self.u
    }

    pub fn num_bits(&self) -> u64 {
        self.low_bits.num_bits() + self.high_bits.num_bits()
    }
}

/// A sequence encoder storing the prefix sums of the values in an
/// [`EliasFano`] structure.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct EliasFanoSeq {
    prefix_sums: EliasFano,
}

impl SequenceEncoder for EliasFanoSeq {
    fn encode(values: &[u64]) -> Self {
        let mut prefix_sums = Vec::with_capacity(values.len() + 1);
        let mut sum = 0_u64;
        prefix_sums.push(0);
        for &v in values {
            sum += v;
            prefix_sums.push(sum);
        }
        Self {
            prefix_sums: EliasFano::new(&prefix_sums),
        }
    }

    #[inline]
    fn access(&self, index: usize) -> u64 {
        self.prefix_sums.get(index + 1) - self.prefix_sums.get(index)
    }

    fn len(&self) -> usize {
        self.prefix_sums.len() - 1
    }

    fn num_bits(&self) -> u64 {
        self.prefix_sums.num_bits()
    }

    fn name() -> String {
        "EF".to_string()
    }
}

#[cfg(test)]
mod test_elias_fano {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_monotone() {
        let mut rng = SmallRng::seed_from_u64(0);
        for (n, u) in [(0, 0), (1, 0), (10, 1000), (1000, 10), (1000, 1 << 40)] {
            let mut values = (0..n).map(|_| rng.random_range(0..=u)).collect::<Vec<_>>();
            values.sort();
            let ef = EliasFano::new(&values);
            assert_eq!(ef.len(), n);
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(ef.get(i), v);
            }
        }
    }

    #[test]
    #[should_panic]
    fn test_not_monotone() {
        EliasFano::new(&[2, 1]);
    }

    #[test]
    fn test_seq() {
        let mut rng = SmallRng::seed_from_u64(1);
        let values = (0..10_000)
            .map(|_| rng.random_range(0..100))
            .collect::<Vec<_>>();
        let seq = EliasFanoSeq::encode(&values);
        assert_eq!(seq.len(), values.len());
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(seq.access(i), v);
        }
        let empty = EliasFanoSeq::encode(&[]);
        assert!(empty.is_empty());
    }
}
