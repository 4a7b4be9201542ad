/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

#![doc = include_str!("../README.md")]
#![deny(unconditional_recursion)]

pub mod bits;
pub mod enc;
pub mod hash;
pub mod mph;
pub mod rank_sel;
pub mod utils;

pub mod prelude {
    pub use crate::enc::*;
    pub use crate::hash::*;
    pub use crate::mph::{
        Backend, BuildError, BuildStats, Bucketer, ConfigError, FastMphf, Mphf, MphfBuilder,
        MphfConfig, OptBucketer, Rayon, Sequential, SkewBucketer, SmallMphf, Solution,
        SolveError, SplineBucketer, UniformBucketer,
    };
}
