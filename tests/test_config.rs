/*
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

use anyhow::Result;
use phobic::mph::*;

fn check_fulcrums(config: &MphfConfig) {
    let fulcrums = config.fulcrums().as_slice();
    assert_eq!(fulcrums.len(), FULCS_INTER);
    assert_eq!(fulcrums[0], 0);
    assert_eq!(
        fulcrums[FULCS_INTER - 1],
        (config.bucket_count() as u32) << 16
    );
    assert!(fulcrums.windows(2).all(|w| w[0] <= w[1]), "{}", config);
}

#[test]
fn test_fulcrums() -> Result<()> {
    for (lambda, partition_size) in [(1.0, 100), (4.0, 1024), (7.5, 2048), (10.0, 50_000)] {
        check_fulcrums(&MphfConfig::new(lambda, partition_size, &mut UniformBucketer)?);
        check_fulcrums(&MphfConfig::new(lambda, partition_size, &mut SkewBucketer)?);
        check_fulcrums(&MphfConfig::new(lambda, partition_size, &mut OptBucketer::default())?);
    }
    check_fulcrums(&MphfConfig::default());

    // A spline overshooting [0..1] is clamped
    let mut spline =
        SplineBucketer::from_points(&[(0.0, 0.0), (0.3, 0.9), (0.6, 0.2), (1.0, 1.0)])?;
    check_fulcrums(&MphfConfig::new(7.5, 2048, &mut spline)?);
    Ok(())
}

#[test]
fn test_buckets_in_range() -> Result<()> {
    let config = MphfConfig::new(7.5, 2048, &mut OptBucketer::default())?;
    let fulcrums = config.fulcrums();
    let mut counts = vec![0_usize; config.bucket_count()];
    for i in 0..(1_u64 << 20) {
        counts[fulcrums.bucket((i << 12) as u32)] += 1;
    }
    counts[fulcrums.bucket(u32::MAX)] += 1;
    assert!(counts.iter().all(|&c| c > 0));
    // The optimized bucketer makes the first buckets larger
    assert!(counts[0] > counts[config.bucket_count() - 1]);
    Ok(())
}

#[test]
fn test_opt_bucketer_slope() {
    let mut opt = OptBucketer::default();
    opt.init(7.5, 2048.0);
    let c = 0.2 * 7.5 / 2048.0_f64.sqrt();
    // The derivative at zero is the linear component
    let slope = opt.bucket_rel(1E-7) / 1E-7;
    assert!((slope - c).abs() < 1E-6);
}

#[test]
fn test_partition_of() {
    let partitions = 1000;
    let mut counts = vec![0; partitions];
    for i in 0..1_000_000_u64 {
        counts[partition_of((i * 4295) as u32, partitions)] += 1;
    }
    assert!(counts.iter().all(|&c| c > 0));
}
