/*
 *
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Partitioned minimal perfect hash functions.

Keys are [hashed](crate::hash) to 128 bits and distributed into partitions
of a few thousand keys each; inside each partition, keys are distributed
into buckets using a skewed [bucketer](Bucketer). A pilot search finds, for
each bucket, a pilot that places the keys of the bucket into free slots of
the partition; the pilots and the partition offsets are then stored with
[succinct encoders](crate::enc).

Construction is a pipeline of [stages](stages), each dispatched on an
execution [`Backend`]. The resulting [`Mphf`] is immutable.

*/

mod bucketer;
pub use bucketer::*;

mod config;
pub use config::*;

mod backend;
pub use backend::*;

pub mod stages;

mod builder;
pub use builder::*;

mod mphf;
pub use mphf::*;
