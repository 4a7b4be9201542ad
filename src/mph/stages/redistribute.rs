/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use super::{Placement, KEYS_PER_WORKER};
use crate::hash::Key;
use crate::mph::Backend;
use std::sync::atomic::{AtomicU64, Ordering};

/// Moves the residual fields of each key (see [`Key::lower`]) to the global
/// offset of its bucket plus its position inside the bucket.
///
/// The keys of each bucket end up contiguous, and the buckets of each
/// partition are laid out in the order computed by
/// [`bucket_sort`](super::bucket_sort).
pub fn redistribute(
    backend: &impl Backend,
    keys: &[Key],
    placements: &[Placement],
    bucket_offsets: &[u32],
) -> Vec<u64> {
    let lower = (0..keys.len())
        .map(|_| AtomicU64::new(0))
        .collect::<Vec<_>>();

    backend.run(keys.len().div_ceil(KEYS_PER_WORKER), |worker| {
        let start = worker * KEYS_PER_WORKER;
        let end = Ord::min(start + KEYS_PER_WORKER, keys.len());
        for (key, placement) in keys[start..end].iter().zip(&placements[start..end]) {
            let pos = bucket_offsets[placement.bucket] as usize + placement.offset as usize;
            lower[pos].store(key.lower(), Ordering::Relaxed);
        }
    });

    lower.into_iter().map(AtomicU64::into_inner).collect()
}
