/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

The stages of the construction pipeline.

Every stage dispatches its kernels on a [`Backend`](crate::mph::Backend)
and returns when all of them are done:

1. [`hash_keys`]: initial hashing of the input keys to [`Key`]s;
2. [`bucket_sizes`]: partition and bucket of each key, bucket sizes, and
   position of each key inside its bucket;
3. [`bucket_sort`]: buckets of each partition in descending-size order, and
   partition sizes;
4. [`prefix_sum`]: partition offsets;
5. [`apply_offsets`]: global offset of each bucket;
6. [`redistribute`]: keys grouped by bucket in descending-size order;
7. [`search`]: one pilot per bucket.

*/

mod bucket_sizes;
pub use bucket_sizes::*;

mod bucket_sort;
pub use bucket_sort::*;

mod prefix_sum;
pub use prefix_sum::*;

mod apply_offsets;
pub use apply_offsets::*;

mod redistribute;
pub use redistribute::*;

mod search;
pub use search::*;

use crate::hash::{Key, KeyHasher};
use crate::mph::Backend;

/// The number of keys processed by a single worker in per-key stages.
pub const KEYS_PER_WORKER: usize = 1 << 12;

/// Maps input keys to [`Key`]s.
pub fn hash_keys<K: Sync, H: KeyHasher<K>>(
    backend: &impl Backend,
    keys: &[K],
    hasher: &H,
) -> Vec<Key> {
    let mut hashes = vec![Key::default(); keys.len()];
    backend.run_chunks(&mut hashes, KEYS_PER_WORKER, |worker, chunk| {
        let keys = &keys[worker * KEYS_PER_WORKER..];
        for (hash, key) in chunk.iter_mut().zip(keys) {
            *hash = hasher.hash(key);
        }
    });
    hashes
}
