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
use std::collections::HashMap;

/// Dictionary encoding: distinct values are stored once, sorted by
/// decreasing frequency, and the sequence is stored as fixed-width ranks into
/// the dictionary.
///
/// Pilot distributions are heavily skewed towards small values, so the most
/// frequent values receive the smallest ranks.
#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct Dictionary {
    ranks: BitFieldVec,
    dict: BitFieldVec,
}

impl Dictionary {
    /// Returns the number of distinct values.
    pub fn num_distinct(&self) -> usize {
        self.dict.len()
    }
}

impl SequenceEncoder for Dictionary {
    fn encode(values: &[u64]) -> Self {
        let mut counts = HashMap::<u64, usize>::new();
        for &v in values {
            *counts.entry(v).or_default() += 1;
        }
        let mut distinct = counts.into_iter().collect::<Vec<_>>();
        // Decreasing frequency, then increasing value for determinism
        distinct.sort_unstable_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));

        let rank_of = distinct
            .iter()
            .enumerate()
            .map(|(rank, &(value, _))| (value, rank as u64))
            .collect::<HashMap<_, _>>();
        let dict = distinct.iter().map(|&(value, _)| value).collect::<Vec<_>>();
        let ranks = values.iter().map(|v| rank_of[v]).collect::<Vec<_>>();

        Self {
            ranks: BitFieldVec::from_slice(&ranks),
            dict: BitFieldVec::from_slice(&dict),
        }
    }

    #[inline(always)]
    fn access(&self, index: usize) -> u64 {
        self.dict.get(self.ranks.get(index) as usize)
    }

    fn len(&self) -> usize {
        self.ranks.len()
    }

    fn num_bits(&self) -> u64 {
        self.ranks.num_bits() + self.dict.num_bits()
    }

    fn name() -> String {
        "D".to_string()
    }
}

#[cfg(test)]
mod test_dictionary {
    use super::*;

    #[test]
    fn test_dictionary() {
        let values = [5, 5, 5, 1000, 5, 3, 3, 1000, 5];
        let dict = Dictionary::encode(&values);
        assert_eq!(dict.num_distinct(), 3);
        for (i, &v) in values.iter().enumerate() {
            assert_eq!(dict.access(i), v);
        }
        // Three distinct values need two bits per rank
        assert_eq!(dict.num_bits(), 9 * 2 + 3 * 10);
    }
}
