/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use crate::mph::Backend;

/// Turns the bucket starts relative to their partition into global offsets
/// by adding the partition offsets.
pub fn apply_offsets(
    backend: &impl Backend,
    starts: &mut [u32],
    buckets: usize,
    partition_offsets: &[u32],
) {
    backend.run_chunks(starts, buckets, |partition, starts| {
        let base = partition_offsets[partition];
        for start in starts {
            *start += base;
        }
    });
}

#[cfg(test)]
mod test_apply_offsets {
    use super::*;
    use crate::mph::Sequential;

    #[test]
    fn test_apply_offsets() {
        let mut starts = vec![0, 3, 5, 0, 2, 2];
        apply_offsets(&Sequential, &mut starts, 3, &[0, 10, 17]);
        assert_eq!(starts, vec![0, 3, 5, 10, 12, 12]);
    }
}
