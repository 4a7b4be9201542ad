/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Golomb–Rice codes with random access.

Each value *v* is split into its lowest ℓ bits, which are stored in a
[`BitFieldVec`], and the remaining high part ⌊*v* / 2<sup>ℓ</sup>⌋, which is
written in unary in a [`BitVec`]. A [`SimpleSelect`] structure over the
unary part locates the code of any value in constant time.

The parameter ℓ is chosen by modelling the values as a geometric
distribution with parameter *p* = *n* / (*S* + *n*), where *S* is the sum of
the values, and picking the optimal Golomb parameter rounded to the next
power of two, as suggested by Kiely in “Selecting the Golomb parameter in
Rice coding”, *IPN Progress Report* 42-159, 2004.

*/

use super::SequenceEncoder;
use crate::bits::{BitFieldVec, BitVec};
use crate::rank_sel::SimpleSelect;
use mem_dbg::*;

/// A Golomb–Rice code over a sequence of integers.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct Rice {
    high_bits: SimpleSelect,
    low_bits: BitFieldVec,
}

impl Rice {
    /// Returns the optimal number of low bits for the given values.
    pub fn optimal_low_bits(values: &[u64]) -> usize {
        let n = values.len() as f64;
        let sum = values.iter().map(|&v| v as f64).sum::<f64>();
        if sum == 0.0 {
            return 0;
        }
        let p = n / (sum + n);
        let golden = (5.0_f64.sqrt() + 1.0) / 2.0;
        let l = (golden.ln() / -(-p).ln_1p()).log2().ceil();
        if l.is_nan() || l <= 0.0 {
            0
        } else {
            Ord::min(l as usize, 63)
        }
    }

    /// Returns the number of low bits of each code.
    pub fn low_bits(&self) -> usize {
        self.low_bits.bit_width()
    }
}

impl SequenceEncoder for Rice {
    fn encode(values: &[u64]) -> Self {
        let l = Self::optimal_low_bits(values);
        let low_mask = if l == 0 { 0 } else { u64::MAX >> (64 - l) };

        let mut low_bits = BitFieldVec::new(l, values.len());
        let mut high_bits = BitVec::with_capacity(values.len() * 2);
        for (i, &v) in values.iter().enumerate() {
            low_bits.set(i, v & low_mask);
            high_bits.push_unary((v >> l) as usize);
        }

        Self {
            high_bits: SimpleSelect::new(high_bits),
            low_bits,
        }
    }

    #[inline]
    fn access(&self, index: usize) -> u64 {
        let end = self.high_bits.select(index);
        let start = if index == 0 {
            0
        } else {
            self.high_bits.select(index - 1) + 1
        };
        (((end - start) as u64) << self.low_bits.bit_width()) | self.low_bits.get(index)
    }

    fn len(&self) -> usize {
        self.low_bits.len()
    }

    fn num_bits(&self) -> u64 {
        self.high_bits.num_bits() + self.low_bits.num_bits()
    }

    fn name() -> String {
        "R".to_string()
    }
}

#[cfg(test)]
mod test_rice {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_optimal_low_bits() {
        assert_eq!(Rice::optimal_low_bits(&[]), 0);
        assert_eq!(Rice::optimal_low_bits(&[0, 0, 0]), 0);
        // Mean 1000: the optimal parameter is close to 1000 · ln φ ≈ 481
        let l = Rice::optimal_low_bits(&[1000; 100]);
        assert_eq!(l, 9);
    }

    #[test]
    fn test_geometric() {
        let mut rng = SmallRng::seed_from_u64(0);
        for mean in [1_u64, 10, 100, 10_000] {
            let values = (0..5000)
                .map(|_| rng.random_range(0..2 * mean))
                .collect::<Vec<_>>();
            let rice = Rice::encode(&values);
            assert_eq!(rice.len(), values.len());
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(rice.access(i), v);
            }
        }
    }

    #[test]
    fn test_large_values() {
        let values = [0, u32::MAX as u64, 1, 1 << 40];
        let rice = Rice::encode(&values);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(rice.access(i), v);
        }
    }
}
