/*
 *
 * SPDX-FileCopyrightText: 2023 Inria
 * SPDX-FileCopyrightText: 2023 Sebastiano Vigna
 *
 * SPDX-License-Identifier: Apache-2.0 OR LGPL-2.1-or-later
 */

/*!

Parallel execution backends.

Each stage of the construction is expressed as a kernel dispatched on a
number of independent workers: one per key, per partition, or per chunk of
a buffer. A [`Backend`] runs all the workers of a dispatch, and returns
only when all of them have completed; the return is the barrier between
consecutive stages, so a stage always sees the complete output of the
previous one.

Kernels of the same dispatch never write to the same memory: they either
receive disjoint mutable chunks of a buffer or write through atomics.

*/

use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// An execution backend for data-parallel kernels.
pub trait Backend: Sync {
    /// Runs `kernel(i)` for each worker index `i` in `0..workers`.
    fn run<F>(&self, workers: usize, kernel: F)
    where
        F: Fn(usize) + Send + Sync;

    /// Splits `data` into consecutive chunks of `chunk_len` elements (the
    /// last one might be shorter) and runs `kernel(i, chunk)` on the `i`-th
    /// chunk.
    fn run_chunks<T, F>(&self, data: &mut [T], chunk_len: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync;

    /// Like [`run_chunks`](Backend::run_chunks), but kernels may fail. The
    /// first error stops the dispatch of new workers and is returned; which
    /// error is returned when several workers fail is unspecified.
    fn try_run_chunks<T, E, F>(&self, data: &mut [T], chunk_len: usize, kernel: F) -> Result<(), E>
    where
        T: Send,
        E: Send,
        F: Fn(usize, &mut [T]) -> Result<(), E> + Send + Sync;

    /// Returns the number of threads workers are distributed on.
    fn num_threads(&self) -> usize;

    fn name(&self) -> String;
}

/// Runs all workers on the calling thread, in order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl Backend for Sequential {
    fn run<F>(&self, workers: usize, kernel: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        (0..workers).for_each(kernel);
    }

    fn run_chunks<T, F>(&self, data: &mut [T], chunk_len: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        data.chunks_mut(chunk_len)
            .enumerate()
            .for_each(|(i, chunk)| kernel(i, chunk));
    }

    fn try_run_chunks<T, E, F>(&self, data: &mut [T], chunk_len: usize, kernel: F) -> Result<(), E>
    where
        T: Send,
        E: Send,
        F: Fn(usize, &mut [T]) -> Result<(), E> + Send + Sync,
    {
        data.chunks_mut(chunk_len)
            .enumerate()
            .try_for_each(|(i, chunk)| kernel(i, chunk))
    }

    fn num_threads(&self) -> usize {
        1
    }

    fn name(&self) -> String {
        "sequential".to_string()
    }
}

/// Distributes workers on a [`rayon`] thread pool.
///
/// [`Rayon::default`] uses the global thread pool; [`Rayon::new`] creates a
/// dedicated pool with a given number of threads.
#[derive(Debug, Default)]
pub struct Rayon {
    pool: Option<ThreadPool>,
}

impl Rayon {
    /// Creates a backend with a dedicated pool of `num_threads` threads. If
    /// `num_threads` is zero, rayon picks the number of threads.
    pub fn new(num_threads: usize) -> Result<Self, ThreadPoolBuildError> {
        Ok(Self {
            pool: Some(ThreadPoolBuilder::new().num_threads(num_threads).build()?),
        })
    }

    fn install<R: Send>(&self, op: impl FnOnce() -> R + Send) -> R {
        match &self.pool {
            Some(pool) => pool.install(op),
            None => op(),
        }
    }
}

impl Backend for Rayon {
    fn run<F>(&self, workers: usize, kernel: F)
    where
        F: Fn(usize) + Send + Sync,
    {
        self.install(|| (0..workers).into_par_iter().for_each(kernel));
    }

    fn run_chunks<T, F>(&self, data: &mut [T], chunk_len: usize, kernel: F)
    where
        T: Send,
        F: Fn(usize, &mut [T]) + Send + Sync,
    {
        self.install(|| {
            data.par_chunks_mut(chunk_len)
                .enumerate()
                .for_each(|(i, chunk)| kernel(i, chunk))
        });
    }

    fn try_run_chunks<T, E, F>(&self, data: &mut [T], chunk_len: usize, kernel: F) -> Result<(), E>
    where
        T: Send,
        E: Send,
        F: Fn(usize, &mut [T]) -> Result<(), E> + Send + Sync,
    {
        self.install(|| {
            data.par_chunks_mut(chunk_len)
                .enumerate()
                .try_for_each(|(i, chunk)| kernel(i, chunk))
        })
    }

    fn num_threads(&self) -> usize {
        match &self.pool {
            Some(pool) => pool.current_num_threads(),
            None => rayon::current_num_threads(),
        }
    }

    fn name(&self) -> String {
        format!("rayon ({} threads)", self.num_threads())
    }
}

#[cfg(test)]
mod test_backend {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn check(backend: &impl Backend) {
        let sum = AtomicUsize::new(0);
        backend.run(1000, |i| {
            sum.fetch_add(i, Ordering::Relaxed);
        });
        assert_eq!(sum.into_inner(), 999 * 1000 / 2);

        let mut data = vec![0_usize; 1003];
        backend.run_chunks(&mut data, 10, |i, chunk| chunk.fill(i));
        for (j, &x) in data.iter().enumerate() {
            assert_eq!(x, j / 10);
        }

        let result = backend.try_run_chunks(&mut data, 10, |i, _| if i == 50 { Err(i) } else { Ok(()) });
        assert_eq!(result, Err(50));
        assert_eq!(backend.try_run_chunks(&mut data, 10, |_, _| Ok::<(), ()>(())), Ok(()));
    }

    #[test]
    fn test_backends() -> anyhow::Result<()> {
        check(&Sequential);
        check(&Rayon::default());
        let rayon = Rayon::new(3)?;
        assert_eq!(rayon.num_threads(), 3);
        check(&rayon);
        Ok(())
    }
}
