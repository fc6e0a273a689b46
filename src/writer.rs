// 📝 Batch Writer
//
// Persists a record list in fixed-size batches, in order. Every batch insert is
// wrapped in the retry combinator; once retries are exhausted the write stops
// and earlier batches stay committed.

use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::progress::Progress;
use crate::retry::{retry, RetryPolicy};
use crate::storage::{Record, Storage};

/// What one phase (or one slice of a phase) wrote
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteSummary {
    pub batches: usize,
    pub records: usize,
    pub inserted: usize,
    /// Records whose id already existed
    pub skipped: usize,
    pub retries: u32,
}

impl WriteSummary {
    pub fn absorb(&mut self, other: WriteSummary) {
        self.batches += other.batches;
        self.records += other.records;
        self.inserted += other.inserted;
        self.skipped += other.skipped;
        self.retries += other.retries;
    }
}

pub struct BatchWriter<'a> {
    batch_size: usize,
    policy: RetryPolicy,
    progress: &'a dyn Progress,
}

impl<'a> BatchWriter<'a> {
    pub fn new(batch_size: usize, policy: RetryPolicy, progress: &'a dyn Progress) -> Self {
        Self {
            batch_size: batch_size.max(1),
            policy,
            progress,
        }
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    pub fn write<S, R>(&self, storage: &mut S, records: &[R]) -> Result<WriteSummary, PipelineError>
    where
        S: Storage + ?Sized,
        R: Record,
    {
        self.write_from(storage, records, 0)
    }

    /// Write `records` as the continuation of a phase that has already
    /// written `completed` records
    ///
    /// Progress and batch numbers are reported relative to the whole phase.
    pub fn write_from<S, R>(
        &self,
        storage: &mut S,
        records: &[R],
        completed: u64,
    ) -> Result<WriteSummary, PipelineError>
    where
        S: Storage + ?Sized,
        R: Record,
    {
        let entity = R::ENTITY;
        let first_batch = completed as usize / self.batch_size;
        let mut summary = WriteSummary::default();
        let mut written = completed;

        for (i, batch) in records.chunks(self.batch_size).enumerate() {
            let batch_index = first_batch + i;

            let outcome = retry(&self.policy, || R::insert_batch(&mut *storage, batch)).map_err(|e| {
                tracing::error!(
                    "Batch {} of {} failed after {} attempts: {}",
                    batch_index,
                    entity,
                    e.attempts,
                    e.last
                );
                PipelineError::BatchWrite {
                    entity,
                    batch: batch_index,
                    attempts: e.attempts,
                    source: e.last,
                }
            })?;

            let inserted = outcome.value;
            summary.batches += 1;
            summary.records += batch.len();
            summary.inserted += inserted;
            summary.skipped += batch.len().saturating_sub(inserted);
            summary.retries += outcome.retries;

            written += batch.len() as u64;
            self.progress.update(entity, written);

            tracing::debug!(
                "Batch {} of {}: {} inserted, {} skipped",
                batch_index,
                entity,
                inserted,
                batch.len().saturating_sub(inserted)
            );
        }

        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{Customer, Entity};
    use crate::generator::generate_customers;
    use crate::progress::NoProgress;
    use crate::storage::testing::FlakyStorage;
    use crate::storage::MemoryStorage;
    use chrono::Utc;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingProgress {
        updates: Mutex<Vec<(Entity, u64)>>,
    }

    impl Progress for RecordingProgress {
        fn update(&self, entity: Entity, completed: u64) {
            self.updates.lock().unwrap().push((entity, completed));
        }
    }

    fn customers(n: usize) -> Vec<Customer> {
        generate_customers(7, 0, n, Utc::now())
    }

    fn policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy::fixed(max_retries, Duration::ZERO)
    }

    #[test]
    fn test_records_split_into_ordered_batches() {
        let mut storage = FlakyStorage::new();
        let writer = BatchWriter::new(1000, policy(3), &NoProgress);

        let summary = writer.write(&mut storage, &customers(2500)).unwrap();

        assert_eq!(storage.attempts_for(Entity::Customer), vec![1000, 1000, 500]);
        assert_eq!(summary.batches, 3);
        assert_eq!(summary.records, 2500);
        assert_eq!(summary.inserted, 2500);
        assert_eq!(summary.retries, 0);
        assert_eq!(storage.count(Entity::Customer).unwrap(), 2500);
    }

    #[test]
    fn test_empty_input_writes_nothing() {
        let mut storage = FlakyStorage::new();
        let writer = BatchWriter::new(10, policy(3), &NoProgress);

        let summary = writer.write::<_, Customer>(&mut storage, &[]).unwrap();

        assert_eq!(summary, WriteSummary::default());
        assert!(storage.attempts.is_empty());
    }

    #[test]
    fn test_transient_failures_are_retried() {
        let mut storage = FlakyStorage::new();
        storage.pass_next(1);
        storage.fail_next(2);
        let writer = BatchWriter::new(10, policy(3), &NoProgress);

        let summary = writer.write(&mut storage, &customers(25)).unwrap();

        assert_eq!(summary.retries, 2);
        assert_eq!(summary.inserted, 25);
        // Second batch took three attempts
        assert_eq!(storage.attempts_for(Entity::Customer), vec![10, 10, 10, 10, 5]);
    }

    #[test]
    fn test_exhausted_retries_halt_the_write() {
        let mut storage = FlakyStorage::new();
        storage.pass_next(1);
        storage.fail_next(4);
        let progress = RecordingProgress::default();
        let writer = BatchWriter::new(10, policy(3), &progress);

        let err = writer.write(&mut storage, &customers(30)).unwrap_err();

        match err {
            PipelineError::BatchWrite {
                entity,
                batch,
                attempts,
                ..
            } => {
                assert_eq!(entity, Entity::Customer);
                assert_eq!(batch, 1);
                assert_eq!(attempts, 4);
            }
            other => panic!("expected batch write error, got {:?}", other),
        }

        // First batch stays committed, the third is never attempted
        assert_eq!(storage.count(Entity::Customer).unwrap(), 10);
        assert_eq!(storage.attempts_for(Entity::Customer).len(), 5);
        assert_eq!(*progress.updates.lock().unwrap(), vec![(Entity::Customer, 10)]);
    }

    #[test]
    fn test_duplicates_count_as_skipped() {
        let mut storage = MemoryStorage::new();
        let writer = BatchWriter::new(4, policy(0), &NoProgress);
        let records = customers(6);

        writer.write(&mut storage, &records).unwrap();
        let again = writer.write(&mut storage, &records).unwrap();

        assert_eq!(again.inserted, 0);
        assert_eq!(again.skipped, 6);
        assert_eq!(storage.count(Entity::Customer).unwrap(), 6);
    }

    #[test]
    fn test_progress_is_cumulative_across_slices() {
        let mut storage = MemoryStorage::new();
        let progress = RecordingProgress::default();
        let writer = BatchWriter::new(4, policy(0), &progress);
        let records = customers(10);

        let mut total = writer.write(&mut storage, &records[..8]).unwrap();
        total.absorb(writer.write_from(&mut storage, &records[8..], 8).unwrap());

        assert_eq!(total.batches, 3);
        assert_eq!(total.inserted, 10);
        assert_eq!(
            *progress.updates.lock().unwrap(),
            vec![
                (Entity::Customer, 4),
                (Entity::Customer, 8),
                (Entity::Customer, 10)
            ]
        );
    }
}
