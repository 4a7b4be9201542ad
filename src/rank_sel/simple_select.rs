/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! A simple inventory-based selection structure.
//!
//! The position of every [`SimpleSelect::ONES_PER_INVENTORY`]-th one is
//! recorded in an inventory; a selection starts from the closest inventory
//! entry and scans words using broadword popcounts. On bit vectors with
//! bounded gaps between ones (such as the unary parts of Rice and Elias–Fano
//! codes, whose density is at least one half) this gives constant-time
//! selection, as in the `darray` structure.

use crate::bits::BitVec;
use crate::utils::select_in_word;
use mem_dbg::*;

#[derive(Debug, Clone, MemDbg, MemSize)]
pub struct SimpleSelect {
    bits: BitVec,
    inventory: Vec<u64>,
    num_ones: usize,
}

impl SimpleSelect {
    pub const LOG2_ONES_PER_INVENTORY: usize = 8;
    pub const ONES_PER_INVENTORY: usize = 1 << Self::LOG2_ONES_PER_INVENTORY;

    pub fn new(bits: BitVec) -> Self {
        let mut inventory = Vec::with_capacity(bits.len() / Self::ONES_PER_INVENTORY + 1);
        let mut num_ones = 0_usize;

        for (word_index, &word) in bits.as_words().iter().enumerate() {
            let ones = word.count_ones() as usize;
            // The next inventoried one is the one with rank ≡ 0 mod ONES_PER_INVENTORY
            let mut next = num_ones.next_multiple_of(Self::ONES_PER_INVENTORY);
            while next < num_ones + ones {
                inventory.push((word_index * 64 + select_in_word(word, next - num_ones)) as u64);
                next += Self::ONES_PER_INVENTORY;
            }
            num_ones += ones;
        }

        Self {
            bits,
            inventory,
            num_ones,
        }
    }

    /// Returns the number of ones in the underlying bit vector.
    #[inline(always)]
    pub fn num_ones(&self) -> usize {
        self.num_ones
    }

    /// Returns the position of the one of given rank.
    ///
    /// # Panics
    ///
    /// If `rank` is not smaller than the number of ones.
    #[inline]
    pub fn select(&self, rank: usize) -> usize {
        if rank >= self.num_ones {
            panic!("Rank out of bounds: {} >= {}", rank, self.num_ones);
        }
        unsafe { self.select_unchecked(rank) }
    }

    /// # Safety
    ///
    /// `rank` must be smaller than the number of ones.
    #[inline]
    pub unsafe fn select_unchecked(&self, rank: usize) -> usize {
        let words = self.bits.as_words();
        let inventory_index = rank >> Self::LOG2_ONES_PER_INVENTORY;
        let pos = *self.inventory.get_unchecked(inventory_index) as usize;
        let mut residual = rank & (Self::ONES_PER_INVENTORY - 1);

        let mut word_index = pos / 64;
        // Clear the bits before the inventoried one
        let mut word = (*words.get_unchecked(word_index) >> (pos % 64)) << (pos % 64);
        loop {
            let bit_count = word.count_ones() as usize;
            if residual < bit_count {
                break;
            }
            residual -= bit_count;
            word_index += 1;
            word = *words.get_unchecked(word_index);
        }

        word_index * 64 + select_in_word(word, residual)
    }

    /// Returns the number of bits used by the bit vector and the inventory.
    pub fn num_bits(&self) -> u64 {
        self.bits.num_bits() + self.inventory.len() as u64 * 64
    }
}
