//! Worker pool for batched effect computation
//!
//! Effects hand their internal buffers (accretion disks, vortex motes,
//! lensing paths) to the pool in batches. Every call joins before it
//! returns, so an effect's force phase always reads finished data.
//!
//! Batches work on a scratch copy and only write back on success: a
//! panicking batch leaves its slice exactly as it was (stale for a frame)
//! and is reported instead of unwinding into the tick.

use std::panic::{self, AssertUnwindSafe};

use rayon::prelude::*;

use crate::error::Result;

/// Outcome of one batched run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Number of batches dispatched
    pub batches: usize,
    /// Start offsets of batches that panicked and were discarded
    pub failed: Vec<usize>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// Fold another report into this one
    pub fn merge(&mut self, other: BatchReport) {
        self.batches += other.batches;
        self.failed.extend(other.failed);
    }
}

/// Fixed-size pool owned by the simulation and lent to effects per frame
pub struct WorkerPool {
    pool: rayon::ThreadPool,
    threads: usize,
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.threads)
            .finish()
    }
}

impl WorkerPool {
    pub fn new(threads: usize) -> Result<Self> {
        let threads = threads.max(1);
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("warpfield-worker-{i}"))
            .build()?;
        log::info!("Worker pool ready with {} threads", threads);
        Ok(Self { pool, threads })
    }

    pub fn threads(&self) -> usize {
        self.threads
    }

    /// Run `work(start_index, batch)` over `items` split into one batch per
    /// thread. Inputs shorter than `min_batch` run as a single batch.
    ///
    /// Blocks until every batch has finished.
    pub fn run_batches<T, F>(&self, items: &mut [T], min_batch: usize, work: F) -> BatchReport
    where
        T: Clone + Send,
        F: Fn(usize, &mut [T]) + Sync,
    {
        if items.is_empty() {
            return BatchReport::default();
        }

        let batch_size = if items.len() < min_batch.max(1) {
            items.len()
        } else {
            items.len().div_ceil(self.threads)
        };

        let outcomes: Vec<Option<usize>> = if batch_size >= items.len() {
            vec![run_guarded(0, items, &work)]
        } else {
            self.pool.install(|| {
                items
                    .par_chunks_mut(batch_size)
                    .enumerate()
                    .map(|(i, batch)| run_guarded(i * batch_size, batch, &work))
                    .collect()
            })
        };

        let report = BatchReport {
            batches: outcomes.len(),
            failed: outcomes.into_iter().flatten().collect(),
        };
        if !report.is_clean() {
            log::warn!(
                "{} of {} worker batches failed; keeping previous frame's data",
                report.failed.len(),
                report.batches
            );
        }
        report
    }
}

/// Run one batch on a scratch copy; commit only if it completes
fn run_guarded<T, F>(start: usize, batch: &mut [T], work: &F) -> Option<usize>
where
    T: Clone,
    F: Fn(usize, &mut [T]),
{
    let mut scratch = batch.to_vec();
    match panic::catch_unwind(AssertUnwindSafe(|| work(start, &mut scratch))) {
        Ok(()) => {
            batch.clone_from_slice(&scratch);
            None
        }
        Err(payload) => {
            let reason = payload
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| payload.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            log::warn!("Worker batch at offset {} failed: {}", start, reason);
            Some(start)
        }
    }
}
