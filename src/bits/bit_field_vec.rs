/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Vectors of values of fixed bit width.

Elements are stored contiguously, with no padding bits (in particular,
unless the bit width is a power of two some elements will be stored
across word boundaries). A bit width of zero is allowed: all values are
then zero and no storage is used besides a single guard word.

*/

use mem_dbg::*;

/// A vector of bit fields of fixed width.
#[derive(Debug, Clone, PartialEq, Eq, Hash, MemDbg, MemSize)]
pub struct BitFieldVec {
    /// The underlying storage.
    data: Vec<u64>,
    /// The bit width of the values stored in the vector.
    bit_width: usize,
    /// A mask with its lowest `bit_width` bits set to one.
    mask: u64,
    /// The length of the vector.
    len: usize,
}

fn mask(bit_width: usize) -> u64 {
    if bit_width == 0 {
        0
    } else {
        u64::MAX >> (64 - bit_width)
    }
}

macro_rules! panic_if_out_of_bounds {
    ($index: expr, $len: expr) => {
        if $index >= $len {
            panic!("Index out of bounds: {} >= {}", $index, $len)
        }
    };
}

macro_rules! panic_if_value {
    ($value: expr, $mask: expr, $bit_width: expr) => {
        if $value & $mask != $value {
            panic!("Value {} does not fit in {} bits", $value, $bit_width);
        }
    };
}

impl BitFieldVec {
    /// Creates a new zero-initialized vector of given bit width and length.
    pub fn new(bit_width: usize, len: usize) -> Self {
        assert!(bit_width <= 64, "Bit width {} is larger than 64", bit_width);
        // We need at least one word to handle the case of bit width zero.
        let n_of_words = Ord::max(1, (len * bit_width).div_ceil(64));
        Self {
            data: vec![0; n_of_words],
            bit_width,
            mask: mask(bit_width),
            len,
        }
    }

    /// Creates a vector containing the given values using the minimum bit
    /// width sufficient to represent the largest one.
    pub fn from_slice(values: &[u64]) -> Self {
        let max = values.iter().copied().max().unwrap_or(0);
        let mut result = Self::new(crate::utils::bit_width(max), values.len());
        for (i, &value) in values.iter().enumerate() {
            // SAFETY: i < len and the value fits by construction.
            unsafe { result.set_unchecked(i, value) };
        }
        result
    }

    #[inline(always)]
    pub fn bit_width(&self) -> usize {
        self.bit_width
    }

    #[inline(always)]
    #[allow(clippy::len_without_is_empty)]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns the number of bits used by the payload (excluding the
    /// padding of the last word).
    #[inline(always)]
    pub fn num_bits(&self) -> u64 {
        (self.len * self.bit_width) as u64
    }

    #[inline(always)]
    pub fn get(&self, index: usize) -> u64 {
        panic_if_out_of_bounds!(index, self.len);
        unsafe { self.get_unchecked(index) }
    }

    /// # Safety
    ///
    /// `index` must be between 0 (included) and [`BitFieldVec::len`] (excluded).
    #[inline]
    pub unsafe fn get_unchecked(&self, index: usize) -> u64 {
        let pos = index * self.bit_width;
        let word_index = pos / 64;
        let bit_index = pos % 64;

        if bit_index + self.bit_width <= 64 {
            (*self.data.get_unchecked(word_index) >> bit_index) & self.mask
        } else {
            (*self.data.get_unchecked(word_index) >> bit_index
                | *self.data.get_unchecked(word_index + 1) << (64 - bit_index))
                & self.mask
        }
    }

    /// May panic if the index is not in in [0..[len](`BitFieldVec::len`))
    /// or the value does not fit in [`BitFieldVec::bit_width`] bits.
    #[inline(always)]
    pub fn set(&mut self, index: usize, value: u64) {
        panic_if_out_of_bounds!(index, self.len);
        panic_if_value!(value, self.mask, self.bit_width);
        unsafe {
            self.set_unchecked(index, value);
        }
    }

    /// # Safety
    ///
    /// `index` must be between 0 (included) and [`BitFieldVec::len`]
    /// (excluded) and `value` must fit in [`BitFieldVec::bit_width`] bits.
    #[inline]
    pub unsafe fn set_unchecked(&mut self, index: usize, value: u64) {
        if self.bit_width == 0 {
            return;
        }
        let pos = index * self.bit_width;
        let word_index = pos / 64;
        let bit_index = pos % 64;

        if bit_index + self.bit_width <= 64 {
            let mut word = *self.data.get_unchecked(word_index);
            word &= !(self.mask << bit_index);
            word |= value << bit_index;
            *self.data.get_unchecked_mut(word_index) = word;
        } else {
            let mut word = *self.data.get_unchecked(word_index);
            word &= (1 << bit_index) - 1;
            word |= value << bit_index;
            *self.data.get_unchecked_mut(word_index) = word;

            let mut word = *self.data.get_unchecked(word_index + 1);
            word &= !(self.mask >> (64 - bit_index));
            word |= value >> (64 - bit_index);
            *self.data.get_unchecked_mut(word_index + 1) = word;
        }
    }

    /// Returns an iterator over the values.
    pub fn iter(&self) -> impl Iterator<Item = u64> + '_ {
        (0..self.len).map(move |i| unsafe { self.get_unchecked(i) })
    }
}

#[cfg(test)]
mod test_bit_field_vec {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_widths() {
        let mut rng = SmallRng::seed_from_u64(0);
        for bit_width in 0..=64 {
            let mask = mask(bit_width);
            let values = (0..200).map(|_| rng.random::<u64>() & mask).collect::<Vec<_>>();
            let mut bfv = BitFieldVec::new(bit_width, values.len());
            for (i, &v) in values.iter().enumerate() {
                bfv.set(i, v);
            }
            for (i, &v) in values.iter().enumerate() {
                assert_eq!(bfv.get(i), v, "bit width {}", bit_width);
            }
            // Overwrite in reverse order to check that neighbours are preserved
            for (i, &v) in values.iter().enumerate().rev() {
                bfv.set(i, v);
            }
            assert!(bfv.iter().eq(values.iter().copied()));
        }
    }

    #[test]
    fn test_from_slice() {
        let bfv = BitFieldVec::from_slice(&[0, 5, 3, 1023]);
        assert_eq!(bfv.bit_width(), 10);
        assert_eq!(bfv.get(3), 1023);
        assert_eq!(bfv.num_bits(), 40);

        let zeros = BitFieldVec::from_slice(&[0, 0, 0]);
        assert_eq!(zeros.bit_width(), 0);
        assert_eq!(zeros.get(2), 0);
        assert_eq!(zeros.num_bits(), 0);
    }

    #[test]
    #[should_panic]
    fn test_value_too_large() {
        let mut bfv = BitFieldVec::new(3, 4);
        bfv.set(0, 8);
    }
}
