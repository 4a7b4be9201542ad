/*
 * SPDX-FileCopyrightText: 2023 Inria
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Growable bit vectors backed by a `Vec<u64>`.

Bits are stored least-significant first: bit `i` is bit `i % 64` of word
`i / 64`. Unused bits of the last word are always zero, so counting ones on
the whole backing slice is exact.

*/

use mem_dbg::*;
use std::ops::Index;

/// A growable bit vector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, MemDbg, MemSize)]
pub struct BitVec {
    data: Vec<u64>,
    len: usize,
}

macro_rules! panic_if_out_of_bounds {
    ($index: expr, $len: expr) => {
        if $index >= $len {
            panic!("Bit index out of bounds: {} >= {}", $index, $len)
        }
    };
}

impl BitVec {
    /// Creates a new zero-filled bit vector of length `len`.
    pub fn new(len: usize) -> Self {
        let n_of_words = len.div_ceil(64);
        Self {
            data: vec![0; n_of_words],
            len,
        }
    }

    /// Creates an empty bit vector that will not reallocate for up to
    /// `capacity` bits.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity.div_ceil(64)),
            len: 0,
        }
    }

    #[inline(always)]
    #[allow(clippy::len_without_is_empty)]
    /// Returns the number of bits in this bit vector.
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> bool {
        panic_if_out_of_bounds!(index, self.len);
        (self.data[index / 64] >> (index % 64)) & 1 != 0
    }

    #[inline(always)]
    pub fn set(&mut self, index: usize, value: bool) {
        panic_if_out_of_bounds!(index, self.len);
        let word = &mut self.data[index / 64];
        let bit = 1_u64 << (index % 64);
        if value {
            *word |= bit;
        } else {
            *word &= !bit;
        }
    }

    /// Appends a bit.
    pub fn push(&mut self, value: bool) {
        if self.len % 64 == 0 {
            self.data.push(0);
        }
        let len = self.len;
        self.len += 1;
        if value {
            self.data[len / 64] |= 1 << (len % 64);
        }
    }

    /// Appends `count` zeros followed by a one.
    ///
    /// This is the unary code of `count`, used by the high bits of Rice and
    /// Elias–Fano codes.
    pub fn push_unary(&mut self, count: usize) {
        let new_len = self.len + count;
        self.data.resize(new_len.div_ceil(64), 0);
        self.len = new_len;
        self.push(true);
    }

    /// Returns the number of ones in this bit vector.
    pub fn count_ones(&self) -> usize {
        self.data.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Returns the underlying words.
    #[inline(always)]
    pub fn as_words(&self) -> &[u64] {
        &self.data
    }

    /// Returns an iterator over the bits.
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| (self.data[i / 64] >> (i % 64)) & 1 != 0)
    }

    /// Returns the number of bits of storage, including slack in the last
    /// word.
    pub fn num_bits(&self) -> u64 {
        self.data.len() as u64 * 64
    }
}

impl Index<usize> for BitVec {
    type Output = bool;

    fn index(&self, index: usize) -> &Self::Output {
        match self.get(index) {
            false => &false,
            true => &true,
        }
    }
}

impl FromIterator<bool> for BitVec {
    fn from_iter<T: IntoIterator<Item = bool>>(iter: T) -> Self {
        let mut bits = BitVec::default();
        for bit in iter {
            bits.push(bit);
        }
        bits
    }
}

#[cfg(test)]
mod test_bit_vec {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_push_get_set() {
        let mut rng = SmallRng::seed_from_u64(0);
        let bits = (0..1000).map(|_| rng.random_bool(0.3)).collect::<Vec<_>>();
        let mut bv = bits.iter().copied().collect::<BitVec>();
        assert_eq!(bv.len(), 1000);
        for (i, &b) in bits.iter().enumerate() {
            assert_eq!(bv[i], b);
        }
        assert_eq!(bv.count_ones(), bits.iter().filter(|&&b| b).count());
        bv.set(999, true);
        bv.set(0, false);
        assert!(bv.get(999));
        assert!(!bv.get(0));
    }

    #[test]
    fn test_unary() {
        let mut bv = BitVec::default();
        bv.push_unary(0);
        bv.push_unary(70);
        bv.push_unary(3);
        assert_eq!(bv.len(), 1 + 71 + 4);
        assert_eq!(bv.count_ones(), 3);
        assert!(bv[0]);
        assert!(bv[71]);
        assert!(!bv[70]);
        assert!(bv[75]);
    }

    #[test]
    #[should_panic]
    fn test_out_of_bounds() {
        let bv = BitVec::new(10);
        bv.get(10);
    }
}
