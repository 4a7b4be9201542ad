/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::SequenceEncoder;
use crate::bits::BitFieldVec;
use mem_dbg::*;

/// Fixed-width encoding: every value uses the bit width of the largest value.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct Compact {
    values: BitFieldVec,
}

impl Compact {
    /// Returns the bit width used for each value.
    pub fn bit_width(&self) -> usize {
        self.values.bit_width()
    }
}

impl SequenceEncoder for Compact {
    fn encode(values: &[u64]) -> Self {
        Self {
            values: BitFieldVec::from_slice(values),
        }
    }

    #[inline(always)]
    fn access(&self, index: usize) -> u64 {
        self.values.get(index)
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn num_bits(&self) -> u64 {
        self.values.num_bits()
    }

    fn name() -> String {
        "C".to_string()
    }
}

#[cfg(test)]
mod test_compact {
    use super::*;

    #[test]
    fn test_compact() {
        let values = [3, 0, 7, 1, 5];
        let compact = Compact::encode(&values);
        assert_eq!(compact.bit_width(), 3);
        assert_eq!(compact.len(), values.len());
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(compact.access(i), v);
        }
        assert_eq!(compact.num_bits(), 15);
    }

    #[test]
    fn test_all_zeros() {
        let compact = Compact::encode(&[0; 100]);
        assert_eq!(compact.bit_width(), 0);
        assert_eq!(compact.num_bits(), 0);
        assert_eq!(compact.access(99), 0);
    }
}
