/*
 *
 * SPDX-FileCopyrightText: 2023 Tommaso Fontana
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Bucketers: monotone maps from the relative position of a key to a relative
bucket index.

A bucketer is sampled once, when a [configuration](crate::mph::MphfConfig)
is built, into a fixed-point [fulcrum table](crate::mph::Fulcrums); it is
never evaluated at query time. Skewed bucketers assign many keys to few
large buckets at the start of the range, which are placed first by the
pilot search, and spread the remaining keys over many small buckets.

*/

use anyhow::{ensure, Context};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// A monotone nondecreasing map from [0..1] to [0..1] with `b(0) = 0` and
/// `b(1) = 1`.
pub trait Bucketer {
    /// Configures data-dependent parameters given the average bucket size
    /// and the expected partition size. The default implementation does
    /// nothing.
    fn init(&mut self, _lambda: f64, _partition_size: f64) {}

    /// Returns the relative bucket index of the relative position `x`.
    fn bucket_rel(&self, x: f64) -> f64;

    fn name(&self) -> &'static str;
}

/// The identity: all buckets have the same expected size.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformBucketer;

impl Bucketer for UniformBucketer {
    #[inline(always)]
    fn bucket_rel(&self, x: f64) -> f64 {
        x
    }

    fn name(&self) -> &'static str {
        "uniform"
    }
}

/// The classical PTHash skewed bucketer: 60% of the keys go to 30% of the
/// buckets.
#[derive(Debug, Clone, Copy, Default)]
pub struct SkewBucketer;

impl Bucketer for SkewBucketer {
    #[inline(always)]
    fn bucket_rel(&self, x: f64) -> f64 {
        if x < 0.6 {
            x / 0.6 * 0.3
        } else {
            0.3 + (x - 0.6) / 0.4 * 0.7
        }
    }

    fn name(&self) -> &'static str {
        "skew"
    }
}

/// The bucketer minimizing the expected search cost, `x + (1 − x) ln(1 − x)`,
/// mixed with a small linear component depending on the average bucket size
/// and on the partition size.
#[derive(Debug, Clone, Copy, Default)]
pub struct OptBucketer {
    c: f64,
}

impl Bucketer for OptBucketer {
    fn init(&mut self, lambda: f64, partition_size: f64) {
        self.c = 0.2 * lambda / partition_size.sqrt();
    }

    #[inline(always)]
    fn bucket_rel(&self, x: f64) -> f64 {
        if x >= 1.0 {
            return 1.0;
        }
        (x + (1.0 - x) * (1.0 - x).ln()) * (1.0 - self.c) + self.c * x
    }

    fn name(&self) -> &'static str {
        "opt"
    }
}

/// A natural cubic spline through a set of sample points, usually obtained
/// by numerical optimization and loaded from a CSV file.
#[derive(Debug, Clone)]
pub struct SplineBucketer {
    x: Vec<f64>,
    y: Vec<f64>,
    /// Second derivatives at the sample points.
    m: Vec<f64>,
}

impl SplineBucketer {
    /// Interpolates the given points, which must have strictly increasing
    /// abscissae.
    pub fn from_points(points: &[(f64, f64)]) -> anyhow::Result<Self> {
        ensure!(
            points.len() >= 2,
            "At least two points are necessary, got {}",
            points.len()
        );
        for w in points.windows(2) {
            ensure!(
                w[0].0 < w[1].0,
                "Abscissae are not strictly increasing: {} >= {}",
                w[0].0,
                w[1].0
            );
        }

        let x = points.iter().map(|p| p.0).collect::<Vec<_>>();
        let y = points.iter().map(|p| p.1).collect::<Vec<_>>();
        let n = x.len();
        let h = x.windows(2).map(|w| w[1] - w[0]).collect::<Vec<_>>();

        // Thomas algorithm on the tridiagonal system for the inner second
        // derivatives; natural boundary conditions m₀ = mₙ₋₁ = 0
        let mut m = vec![0.0; n];
        if n > 2 {
            let mut diag = vec![0.0; n];
            let mut rhs = vec![0.0; n];
            for i in 1..n - 1 {
                diag[i] = 2.0 * (h[i - 1] + h[i]);
                rhs[i] = 6.0 * ((y[i + 1] - y[i]) / h[i] - (y[i] - y[i - 1]) / h[i - 1]);
            }
            for i in 2..n - 1 {
                let w = h[i - 1] / diag[i - 1];
                diag[i] -= w * h[i - 1];
                rhs[i] -= w * rhs[i - 1];
            }
            m[n - 2] = rhs[n - 2] / diag[n - 2];
            for i in (1..n - 2).rev() {
                m[i] = (rhs[i] - h[i] * m[i + 1]) / diag[i];
            }
        }

        Ok(Self { x, y, m })
    }

    /// Loads sample points from a file containing one `x,y` pair per line.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Could not open {}", path.display()))?;
        let mut points = vec![];
        for (line_number, line) in BufReader::new(file).lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut cells = line.split(',');
            let mut next = |column: &str| -> anyhow::Result<f64> {
                let cell = cells
                    .next()
                    .with_context(|| format!("Missing {} column at line {}", column, line_number + 1))?;
                cell.trim()
                    .parse::<f64>()
                    .with_context(|| format!("Invalid {} column at line {}", column, line_number + 1))
            };
            let x = next("first")?;
            let y = next("second")?;
            points.push((x, y));
        }
        Self::from_points(&points)
    }

    fn eval(&self, x: f64) -> f64 {
        let n = self.x.len();
        let x = x.clamp(self.x[0], self.x[n - 1]);
        // Index of the interval containing x
        let i = self.x.partition_point(|&p| p <= x).clamp(1, n - 1) - 1;
        let h = self.x[i + 1] - self.x[i];
        let a = self.x[i + 1] - x;
        let b = x - self.x[i];
        self.m[i] * a * a * a / (6.0 * h)
            + self.m[i + 1] * b * b * b / (6.0 * h)
            + (self.y[i] / h - self.m[i] * h / 6.0) * a
            + (self.y[i + 1] / h - self.m[i + 1] * h / 6.0) * b
    }
}

impl Bucketer for SplineBucketer {
    fn bucket_rel(&self, x: f64) -> f64 {
        if x > 0.9999 {
            1.0
        } else if x < 0.0001 {
            0.0
        } else {
            self.eval(x).clamp(0.0, 1.0)
        }
    }

    fn name(&self) -> &'static str {
        "spline"
    }
}

#[cfg(test)]
mod test_bucketer {
    use super::*;

    fn check_monotone(bucketer: &impl Bucketer) {
        assert_eq!(bucketer.bucket_rel(0.0), 0.0, "{}", bucketer.name());
        assert!((bucketer.bucket_rel(1.0) - 1.0).abs() < 1E-12, "{}", bucketer.name());
        let mut prev = 0.0;
        for i in 0..=1000 {
            let y = bucketer.bucket_rel(i as f64 / 1000.0);
            assert!(y >= prev - 1E-12, "{} at {}", bucketer.name(), i);
            prev = y;
        }
    }

    #[test]
    fn test_bucketers() {
        check_monotone(&UniformBucketer);
        check_monotone(&SkewBucketer);
        let mut opt = OptBucketer::default();
        opt.init(7.5, 2048.0);
        check_monotone(&opt);
        assert!((SkewBucketer.bucket_rel(0.6) - 0.3).abs() < 1E-12);
    }

    #[test]
    fn test_spline_linear() -> anyhow::Result<()> {
        let spline = SplineBucketer::from_points(&[(0.0, 0.0), (0.25, 0.25), (0.5, 0.5), (1.0, 1.0)])?;
        for i in 1..100 {
            let x = i as f64 / 100.0;
            assert!((spline.bucket_rel(x) - x).abs() < 1E-9);
        }
        check_monotone(&spline);
        Ok(())
    }

    #[test]
    fn test_spline_errors() {
        assert!(SplineBucketer::from_points(&[(0.0, 0.0)]).is_err());
        assert!(SplineBucketer::from_points(&[(0.0, 0.0), (0.0, 1.0)]).is_err());
        assert!(SplineBucketer::load("/nonexistent/bucketer.csv").is_err());
    }

    #[test]
    fn test_spline_load() -> anyhow::Result<()> {
        let path = std::env::temp_dir().join(format!("phobic-spline-{}.csv", std::process::id()));
        std::fs::write(&path, "0,0\n0.6,0.3\n\n1,1\n")?;
        let spline = SplineBucketer::load(&path)?;
        std::fs::remove_file(&path)?;
        assert!((spline.eval(0.6) - 0.3).abs() < 1E-12);
        check_monotone(&spline);
        Ok(())
    }
}
