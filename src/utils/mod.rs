/*
 *
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Utility functions: bit-level helpers and division-free modular arithmetic.

*/

pub mod fastmod;
pub use fastmod::*;

/// Returns the number of bits necessary to represent `value`, that is,
/// ⌈log₂(`value` + 1)⌉ (zero for zero).
#[inline(always)]
#[must_use]
pub const fn bit_width(value: u64) -> usize {
    (u64::BITS - value.leading_zeros()) as usize
}

/// Returns the position of the one of given rank in `word`.
///
/// The result is undefined (but the function does not panic) if `word`
/// contains `rank` ones or fewer.
#[inline(always)]
#[must_use]
#[allow(unused_mut)]
pub fn select_in_word(mut word: u64, rank: usize) -> usize {
    #[cfg(all(target_arch = "x86_64", target_feature = "bmi2"))]
    {
        use core::arch::x86_64::_pdep_u64;
        // A Fast x86 Implementation of Select
        // by Prashant Pandey, Michael A. Bender, and Rob Johnson
        let mask = 1 << rank;
        let one = unsafe { _pdep_u64(mask, word) };
        one.trailing_zeros() as usize
    }

    #[cfg(not(all(target_arch = "x86_64", target_feature = "bmi2")))]
    {
        for _ in 0..rank {
            // reset the lowest set bits (BLSR)
            word &= word.wrapping_sub(1);
        }
        word.trailing_zeros() as usize
    }
}

/// Maps a signed integer to an unsigned one so that values of small
/// magnitude get small codes (0, -1, 1, -2, 2, ...).
#[inline(always)]
#[must_use]
pub const fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
#[inline(always)]
#[must_use]
pub const fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

#[cfg(test)]
mod test_utils {
    use super::*;

    #[test]
    fn test_bit_width() {
        assert_eq!(bit_width(0), 0);
        assert_eq!(bit_width(1), 1);
        assert_eq!(bit_width(2), 2);
        assert_eq!(bit_width(255), 8);
        assert_eq!(bit_width(256), 9);
        assert_eq!(bit_width(u64::MAX), 64);
    }

    #[test]
    fn test_select_in_word() {
        let word = 0b1011_0010_u64;
        assert_eq!(select_in_word(word, 0), 1);
        assert_eq!(select_in_word(word, 1), 4);
        assert_eq!(select_in_word(word, 2), 5);
        assert_eq!(select_in_word(word, 3), 7);
        assert_eq!(select_in_word(u64::MAX, 63), 63);
    }

    #[test]
    fn test_zigzag() {
        for v in [0_i64, -1, 1, -2, 2, i64::MAX, i64::MIN, 12345, -98765] {
            assert_eq!(zigzag_decode(zigzag_encode(v)), v);
        }
        assert_eq!(zigzag_encode(0), 0);
        assert_eq!(zigzag_encode(-1), 1);
        assert_eq!(zigzag_encode(1), 2);
    }
}
