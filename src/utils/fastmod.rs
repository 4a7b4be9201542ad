/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

//! Division-free remainder and quotient by a runtime constant.
//!
//! Given a 32-bit divisor *d*, the magic constant *M* = ⌊(2⁶⁴ − 1) / *d*⌋ + 1
//! makes it possible to compute *a* mod *d* and ⌊*a* / *d*⌋ for any 32-bit *a*
//! with two and one 64×64→128 multiplications, respectively.
//!
//! # Reference
//! - [Daniel Lemire, Owen Kaser, and Nathan Kurz, Faster Remainder by Direct
//!   Computation](https://arxiv.org/abs/1902.01961)
//!
//! For *d* = 1 the constant wraps to zero: the remainder is zero, and so
//! is the quotient.

/// Computes the magic constant for divisor `d`.
///
/// # Panics
///
/// If `d` is zero.
#[inline(always)]
#[must_use]
pub const fn compute_m(d: u32) -> u64 {
    (u64::MAX / d as u64).wrapping_add(1)
}

/// Computes `a % d` given the magic constant `m` of `d`.
#[inline(always)]
#[must_use]
pub const fn fastmod(a: u32, m: u64, d: u32) -> u32 {
    let low_bits = m.wrapping_mul(a as u64);
    ((low_bits as u128 * d as u128) >> 64) as u32
}

/// Computes `a / d` given the magic constant `m` of `d`.
#[inline(always)]
#[must_use]
pub const fn fastdiv(a: u32, m: u64) -> u32 {
    ((m as u128 * a as u128) >> 64) as u32
}

#[cfg(test)]
mod test_fastmod {
    use super::*;
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_against_division() {
        let mut rng = SmallRng::seed_from_u64(0);
        for d in (2..2000).chain([3_000_000, u32::MAX - 1, u32::MAX]) {
            let m = compute_m(d);
            for a in (0..100).chain((0..100).map(|_| rng.random::<u32>())) {
                assert_eq!(fastmod(a, m, d), a % d, "{} % {}", a, d);
                assert_eq!(fastdiv(a, m), a / d, "{} / {}", a, d);
            }
        }
    }

    #[test]
    fn test_one() {
        let m = compute_m(1);
        assert_eq!(m, 0);
        assert_eq!(fastmod(12345, m, 1), 0);
        assert_eq!(fastdiv(12345, m), 0);
    }
}
