/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use std::io::{BufRead, BufReader};

use anyhow::{bail, Result};
use clap::{ArgGroup, Parser, ValueEnum};
use dsi_progress_logger::*;
use phobic::prelude::*;
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Encoding {
    /// One compact encoder per bucket index.
    Fast,
    /// One Golomb–Rice encoder per bucket index.
    Small,
    /// A single Golomb–Rice encoder.
    MonoRice,
    /// Compact encoders for the first buckets, Golomb–Rice for the others.
    OrthoDual,
    /// A compact encoder for the first buckets, Golomb–Rice for the others.
    MultiDual,
    /// One Elias–Fano encoder per bucket index.
    EliasFano,
    /// One dictionary encoder per bucket index.
    Dictionary,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum BucketerKind {
    Uniform,
    Skew,
    Opt,
}

#[derive(Parser, Debug)]
#[command(about = "Builds a partitioned minimal perfect hash function, checks it, and prints its space usage", long_about = None)]
#[clap(group(
            ArgGroup::new("input")
                .required(true)
                .args(&["filename", "n"]),
))]
struct Args {
    #[arg(short, long)]
    /// A file containing UTF-8 keys, one per line.
    filename: Option<String>,
    #[arg(short)]
    /// Use n random 128-bit keys.
    n: Option<usize>,
    /// The average bucket size.
    #[arg(short, long, default_value_t = 7.5)]
    lambda: f64,
    /// The expected number of keys per partition.
    #[arg(short, long, default_value_t = 2048)]
    partition_size: usize,
    /// The bucketer.
    #[arg(short, long, value_enum, default_value_t = BucketerKind::Opt)]
    bucketer: BucketerKind,
    /// A CSV file of x,y points defining a spline bucketer (overrides --bucketer).
    #[arg(long)]
    spline: Option<String>,
    /// The pilot and offset encoders.
    #[arg(short, long, value_enum, default_value_t = Encoding::Fast)]
    encoding: Encoding,
    /// The fraction of buckets stored by the first encoder of dual encoders.
    #[arg(long, default_value_t = 0.5)]
    tradeoff: f64,
    /// The bound on the pilot search.
    #[arg(long, default_value_t = 1 << 24)]
    max_pilot: u32,
    /// A 64-bit seed for the initial hash.
    #[arg(short, long, default_value_t = 0)]
    seed: u64,
    /// Use this number of threads (zero: one per core).
    #[arg(short, long, default_value_t = 0)]
    threads: usize,
    /// Run all stages on the calling thread.
    #[arg(long)]
    sequential: bool,
    /// The number of construction attempts with different seeds.
    #[arg(long, default_value_t = 3)]
    attempts: usize,
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .try_init()?;

    let args = Args::parse();

    let config = match &args.spline {
        Some(path) => MphfConfig::new(
            args.lambda,
            args.partition_size,
            &mut SplineBucketer::load(path)?,
        )?,
        None => match args.bucketer {
            BucketerKind::Uniform => {
                MphfConfig::new(args.lambda, args.partition_size, &mut UniformBucketer)?
            }
            BucketerKind::Skew => {
                MphfConfig::new(args.lambda, args.partition_size, &mut SkewBucketer)?
            }
            BucketerKind::Opt => MphfConfig::new(
                args.lambda,
                args.partition_size,
                &mut OptBucketer::default(),
            )?,
        },
    };

    if let Some(filename) = &args.filename {
        let keys = BufReader::new(std::fs::File::open(filename)?)
            .lines()
            .collect::<std::io::Result<Vec<_>>>()?;
        dispatch(&args, config, &keys)
    } else if let Some(n) = args.n {
        let mut rng = SmallRng::seed_from_u64(args.seed);
        let keys = (0..n).map(|_| rng.random::<[u32; 4]>()).collect::<Vec<_>>();
        dispatch(&args, config, &keys)
    } else {
        unreachable!()
    }
}

fn dispatch<K: Sync>(args: &Args, config: MphfConfig, keys: &[K]) -> Result<()>
where
    XxHash: KeyHasher<K>,
{
    if args.sequential {
        dispatch_encoding(args, config, keys, &Sequential)
    } else {
        dispatch_encoding(args, config, keys, &Rayon::new(args.threads)?)
    }
}

fn dispatch_encoding<K: Sync>(
    args: &Args,
    config: MphfConfig,
    keys: &[K],
    backend: &impl Backend,
) -> Result<()>
where
    XxHash: KeyHasher<K>,
{
    match args.encoding {
        Encoding::Fast => run::<K, Ortho<Compact>, LinearDiff<Compact>>(args, config, keys, backend),
        Encoding::Small => run::<K, Ortho<Rice>, LinearDiff<Compact>>(args, config, keys, backend),
        Encoding::MonoRice => run::<K, Mono<Rice>, LinearDiff<Compact>>(args, config, keys, backend),
        Encoding::OrthoDual => {
            run::<K, OrthoDual<Compact, Rice>, LinearDiff<Compact>>(args, config, keys, backend)
        }
        Encoding::MultiDual => {
            run::<K, MultiDual<Compact, Rice>, LinearDiff<Compact>>(args, config, keys, backend)
        }
        Encoding::EliasFano => {
            run::<K, Ortho<EliasFanoSeq>, Direct<Compact>>(args, config, keys, backend)
        }
        Encoding::Dictionary => {
            run::<K, Ortho<Dictionary>, LinearDiff<Compact>>(args, config, keys, backend)
        }
    }
}

fn run<K: Sync, P: PilotEncoder, O: OffsetEncoder>(
    args: &Args,
    config: MphfConfig,
    keys: &[K],
    backend: &impl Backend,
) -> Result<()>
where
    XxHash: KeyHasher<K>,
{
    let mut pl = ProgressLogger::default();
    pl.display_memory(true);

    let builder = MphfBuilder::default()
        .config(config)
        .max_pilot(args.max_pilot)
        .tradeoff(args.tradeoff);

    let mut seed = args.seed;
    let mut attempt = 1;
    let mphf: Mphf<P, O, XxHash> = loop {
        match builder.build(backend, keys, XxHash::new_with_seed(seed), &mut pl) {
            Ok(mphf) => break mphf,
            Err(BuildError::ConstructionFailed(SolveError::DuplicateKey { .. })) => {
                bail!("The input contains duplicate keys")
            }
            Err(BuildError::ConstructionFailed(error)) if attempt < args.attempts => {
                log::warn!("{}; retrying with a different seed", error);
                seed = seed.wrapping_add(0x9e37_79b9_7f4a_7c15);
                attempt += 1;
            }
            Err(error) => return Err(error.into()),
        }
    };

    log::info!("Built with seed {}", mphf.hasher().seed());

    pl.item_name("key");
    pl.expected_updates(Some(keys.len()));
    pl.start("Checking...");
    let mut seen = vec![false; keys.len()];
    for key in keys {
        let pos = mphf.get(key);
        if seen[pos] {
            bail!("Position {} returned twice", pos);
        }
        seen[pos] = true;
    }
    pl.done_with_count(keys.len());

    println!("{}", mphf.result_line());
    Ok(())
}
