//! Parallel processing strategies for the per-entry pipeline.
//!
//! Entries are independent of each other, so they can be spread over worker
//! threads. Only std threads are used:
//! - Sequential (baseline, see `Pipeline::process_sequential`)
//! - Batch-parallel (scoped threads over fixed-size batches of entries)
//!
//! Results always come back in input order, so assembly sees the same
//! sequence whichever strategy ran.

use std::thread;

use crate::model::RawEntry;
use crate::pipeline::{Pipeline, ProcessedEntry};

/// Configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ParallelConfig {
    /// Number of threads to use
    pub num_threads: usize,
    /// Entries handed to the thread pool at a time
    pub batch_size: usize,
}

impl Default for ParallelConfig {
    fn default() -> Self {
        let cpus = thread::available_parallelism()
            .map(|p| p.get())
            .unwrap_or(4);
        Self {
            num_threads: cpus,
            batch_size: 64,
        }
    }
}

/// Process entries batch by batch, each batch split across `num_threads`
/// scoped threads. `on_progress` receives the number of entries done after
/// each batch.
pub fn process_batch_parallel(
    pipeline: &Pipeline<'_>,
    entries: &[RawEntry],
    config: &ParallelConfig,
    mut on_progress: impl FnMut(usize),
) -> Vec<ProcessedEntry> {
    let batch_size = config.batch_size.max(1);
    let mut results = Vec::with_capacity(entries.len());

    for (batch_no, batch) in entries.chunks(batch_size).enumerate() {
        let base_id = batch_no * batch_size;
        results.extend(process_batch_threaded(pipeline, batch, base_id, config.num_threads));
        on_progress(results.len());
    }

    results
}

/// Process one batch using multiple threads, preserving order.
fn process_batch_threaded(
    pipeline: &Pipeline<'_>,
    batch: &[RawEntry],
    base_id: usize,
    num_threads: usize,
) -> Vec<ProcessedEntry> {
    if batch.is_empty() {
        return vec![];
    }

    let num_threads = num_threads.min(batch.len()).max(1);
    let chunk_size = batch.len().div_ceil(num_threads);

    thread::scope(|scope| {
        let handles: Vec<_> = batch
            .chunks(chunk_size)
            .enumerate()
            .map(|(chunk_no, chunk)| {
                let first_id = base_id + chunk_no * chunk_size;
                scope.spawn(move || {
                    chunk
                        .iter()
                        .enumerate()
                        .map(|(i, entry)| pipeline.process_entry(entry, first_id + i))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        // Collect results preserving order
        let mut results = Vec::with_capacity(batch.len());
        for handle in handles {
            match handle.join() {
                Ok(chunk_results) => results.extend(chunk_results),
                Err(panic) => std::panic::resume_unwind(panic),
            }
        }
        results
    })
}
