/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::mph::Backend;

/// The number of elements scanned by a single worker.
pub const SCAN_BLOCK: usize = 1 << 10;

/// Returns the exclusive prefix sums of `values`, followed by their total.
///
/// The scan is computed in two levels: the first level scans blocks of
/// [`SCAN_BLOCK`] values in parallel, the block totals are scanned (again
/// in two levels, if there are enough of them), and the second level adds
/// to each block the sum of the preceding blocks.
pub fn prefix_sum(backend: &impl Backend, values: &[u32]) -> Vec<u32> {
    let mut sums = vec![0_u32; values.len() + 1];
    if values.len() <= SCAN_BLOCK {
        let mut sum = 0;
        for (s, &v) in sums[1..].iter_mut().zip(values) {
            sum += v;
            *s = sum;
        }
        return sums;
    }

    // Level 1: inclusive scans of each block
    backend.run_chunks(&mut sums[1..], SCAN_BLOCK, |block, chunk| {
        let mut sum = 0;
        for (s, &v) in chunk.iter_mut().zip(&values[block * SCAN_BLOCK..]) {
            sum += v;
            *s = sum;
        }
    });

    let totals = sums[1..]
        .chunks(SCAN_BLOCK)
        .map(|chunk| chunk[chunk.len() - 1])
        .collect::<Vec<_>>();
    let bases = prefix_sum(backend, &totals);

    // Level 2: add the base of each block
    backend.run_chunks(&mut sums[1..], SCAN_BLOCK, |block, chunk| {
        let base = bases[block];
        for s in chunk {
            *s += base;
        }
    });

    sums
}

#[cfg(test)]
mod test_prefix_sum {
    use super::*;
    use crate::mph::{Rayon, Sequential};
    use rand::{rngs::SmallRng, Rng, SeedableRng};

    #[test]
    fn test_prefix_sum() {
        let mut rng = SmallRng::seed_from_u64(0);
        for n in [0, 1, 10, SCAN_BLOCK, SCAN_BLOCK + 1, 5 * SCAN_BLOCK + 17, SCAN_BLOCK * SCAN_BLOCK + 3] {
            let values = (0..n).map(|_| rng.random_range(0..100)).collect::<Vec<u32>>();
            let mut expected = vec![0];
            let mut sum = 0;
            for &v in &values {
                sum += v;
                expected.push(sum);
            }
            assert_eq!(prefix_sum(&Sequential, &values), expected);
            assert_eq!(prefix_sum(&Rayon::default(), &values), expected);
        }
    }
}
