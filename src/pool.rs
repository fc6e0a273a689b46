// 🧵 Worker Pool
//
// Splits parent ids into contiguous chunks, one OS thread per non-empty chunk.
// Workers own their chunk and share only the (immutable) generator function.
// Each worker sends exactly one message back: its records or an error.
//
// Aggregation is fail-fast: the first error received wins and the remaining
// workers are left to finish on their own (their results are dropped).

use std::any::Any;
use std::ops::Range;
use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread;

use crate::error::PipelineError;
use crate::generator::{rng_for, SeedRng};

/// One worker's report: (worker index, records or error message)
type WorkerMessage<R> = (usize, Result<Vec<R>, String>);

/// Split `0..len` into `workers` contiguous ranges
///
/// Sizes differ by at most one; the first `len % workers` ranges take the
/// extra item. Ranges may be empty when `len < workers`.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1);
    let base = len / workers;
    let extra = len % workers;

    let mut ranges = Vec::with_capacity(workers);
    let mut start = 0;
    for index in 0..workers {
        let size = base + usize::from(index < extra);
        ranges.push(start..start + size);
        start += size;
    }
    ranges
}

#[derive(Debug, Clone, Copy)]
pub struct WorkerPool {
    workers: usize,
}

impl WorkerPool {
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Run `generate` once per parent id across the pool
    ///
    /// The parent at position `i` gets `rng_for(seed, i)`, so the output does
    /// not depend on the worker count. Records come back in parent order.
    pub fn run<R, F>(
        &self,
        parent_ids: Vec<String>,
        seed: u64,
        generate: F,
    ) -> Result<Vec<R>, PipelineError>
    where
        R: Send + 'static,
        F: Fn(&str, &mut SeedRng) -> Result<Vec<R>, String> + Send + Sync + 'static,
    {
        let ranges = partition(parent_ids.len(), self.workers);
        let generate = Arc::new(generate);
        let (tx, rx) = mpsc::channel::<WorkerMessage<R>>();

        let mut ids = parent_ids.into_iter();
        let mut spawned = Vec::new();

        for (index, range) in ranges.into_iter().enumerate() {
            if range.is_empty() {
                continue;
            }

            let chunk: Vec<String> = ids.by_ref().take(range.len()).collect();
            let offset = range.start;
            let tx = tx.clone();
            let generate = Arc::clone(&generate);

            tracing::debug!(
                "Spawning worker {} for parents {}..{}",
                index,
                range.start,
                range.end
            );

            thread::Builder::new()
                .name(format!("seed-worker-{}", index))
                .spawn(move || {
                    let result = panic::catch_unwind(AssertUnwindSafe(|| {
                        run_chunk(&chunk, offset, seed, generate.as_ref())
                    }))
                    .unwrap_or_else(|payload| {
                        Err(format!("worker panicked: {}", panic_message(payload.as_ref())))
                    });

                    // Receiver is gone once the pool has failed fast
                    let _ = tx.send((index, result));
                })
                .map_err(|e| PipelineError::Worker {
                    worker: index,
                    message: format!("failed to spawn worker thread: {}", e),
                })?;

            spawned.push(index);
        }

        // Only worker-held senders remain, so recv fails once every worker is gone
        drop(tx);

        let mut results: Vec<Option<Vec<R>>> = (0..self.workers).map(|_| None).collect();

        for _ in 0..spawned.len() {
            match rx.recv() {
                Ok((index, Ok(records))) => {
                    tracing::debug!("Worker {} finished with {} records", index, records.len());
                    results[index] = Some(records);
                }
                Ok((index, Err(message))) => {
                    tracing::error!("Worker {} failed: {}", index, message);
                    return Err(PipelineError::Worker {
                        worker: index,
                        message,
                    });
                }
                Err(_) => {
                    let worker = spawned
                        .iter()
                        .copied()
                        .find(|&i| results[i].is_none())
                        .unwrap_or_default();
                    return Err(PipelineError::Worker {
                        worker,
                        message: "worker exited without reporting a result".to_string(),
                    });
                }
            }
        }

        Ok(results.into_iter().flatten().flatten().collect())
    }
}

fn run_chunk<R, F>(chunk: &[String], offset: usize, seed: u64, generate: &F) -> Result<Vec<R>, String>
where
    F: Fn(&str, &mut SeedRng) -> Result<Vec<R>, String>,
{
    let mut records = Vec::new();
    for (i, parent_id) in chunk.iter().enumerate() {
        let mut rng = rng_for(seed, (offset + i) as u64);
        records.extend(generate(parent_id, &mut rng)?);
    }
    Ok(records)
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
