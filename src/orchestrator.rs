// 🚦 Phase Orchestrator
//
// Runs the bulk pipeline as a linear state machine:
//
//   Idle → ClearingData → GeneratingCustomers → GeneratingAccounts
//        → GeneratingTransactions → Done
//
// Failed is reachable from any non-terminal state. Storage is touched only from
// the calling thread; workers just generate records.
//
// A failed phase is not rolled back. The error carries the row counts that were
// in storage at the moment of failure.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;
use std::time::{Duration, Instant};

use crate::config::SeederConfig;
use crate::entities::Entity;
use crate::error::PipelineError;
use crate::generator::{
    generate_accounts, generate_customers, generate_transactions, phase_seed, rng_for, SeedRng,
};
use crate::pool::WorkerPool;
use crate::progress::Progress;
use crate::storage::{EntityCounts, Storage};
use crate::writer::{BatchWriter, WriteSummary};

/// Mixed into the account phase seed for the owner sample
const OWNER_SAMPLE_SALT: u64 = 0x6f77_6e65_7273_0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PipelineState {
    Idle,
    ClearingData,
    GeneratingCustomers,
    GeneratingAccounts,
    GeneratingTransactions,
    Done,
    Failed,
}

impl PipelineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Done | PipelineState::Failed)
    }

    /// Forward-only chain, plus Failed from anywhere that is not terminal
    pub fn can_transition_to(&self, next: PipelineState) -> bool {
        use PipelineState::*;

        if next == Failed {
            return !self.is_terminal();
        }

        matches!(
            (self, next),
            (Idle, ClearingData)
                | (ClearingData, GeneratingCustomers)
                | (GeneratingCustomers, GeneratingAccounts)
                | (GeneratingAccounts, GeneratingTransactions)
                | (GeneratingTransactions, Done)
        )
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PipelineState::Idle => "idle",
            PipelineState::ClearingData => "clearing data",
            PipelineState::GeneratingCustomers => "generating customers",
            PipelineState::GeneratingAccounts => "generating accounts",
            PipelineState::GeneratingTransactions => "generating transactions",
            PipelineState::Done => "done",
            PipelineState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Write summary and wall time of one generation phase
#[derive(Debug, Clone, Serialize)]
pub struct PhaseSummary {
    pub entity: Entity,
    pub write: WriteSummary,
    pub elapsed: Duration,
}

/// Outcome of a completed bulk run
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub customers: u64,
    pub accounts: u64,
    pub transactions: u64,
    pub elapsed: Duration,
    pub phases: Vec<PhaseSummary>,
    /// Seed the run used; pass it back in the config to reproduce the dataset
    pub seed: u64,
}

impl RunReport {
    pub fn counts(&self) -> EntityCounts {
        EntityCounts {
            customers: self.customers,
            accounts: self.accounts,
            transactions: self.transactions,
        }
    }
}

/// Delete every generated row, children first
pub fn clear_data<S: Storage + ?Sized>(storage: &mut S) -> Result<EntityCounts, PipelineError> {
    let mut removed = EntityCounts::default();
    for entity in Entity::clear_order() {
        let n = storage.delete_all(entity)?;
        tracing::info!("Deleted {} {}", n, entity);
        match entity {
            Entity::Customer => removed.customers = n,
            Entity::Account => removed.accounts = n,
            Entity::Transaction => removed.transactions = n,
        }
    }
    Ok(removed)
}

/// Pick `ratio` of `ids` (at least one when any exist), keeping their order
pub fn sample_owners(ids: Vec<String>, ratio: f64, rng: &mut SeedRng) -> Vec<String> {
    let len = ids.len();
    if len == 0 {
        return ids;
    }

    let amount = ((len as f64 * ratio).round() as usize).clamp(1, len);
    if amount == len {
        return ids;
    }

    let mut picked = rand::seq::index::sample(rng, len, amount).into_vec();
    picked.sort_unstable();

    let mut ids = ids;
    picked
        .into_iter()
        .map(|i| std::mem::take(&mut ids[i]))
        .collect()
}

pub struct Orchestrator<'a, S: Storage + ?Sized> {
    storage: &'a mut S,
    config: &'a SeederConfig,
    progress: &'a dyn Progress,
    state: PipelineState,
    now: DateTime<Utc>,
}

impl<'a, S: Storage + ?Sized> Orchestrator<'a, S> {
    pub fn new(storage: &'a mut S, config: &'a SeederConfig, progress: &'a dyn Progress) -> Self {
        Self {
            storage,
            config,
            progress,
            state: PipelineState::Idle,
            now: Utc::now(),
        }
    }

    /// Reference time for generated timestamps (defaults to construction time)
    pub fn with_now(mut self, now: DateTime<Utc>) -> Self {
        self.now = now;
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    fn transition(&mut self, next: PipelineState) -> Result<(), PipelineError> {
        if !self.state.can_transition_to(next) {
            return Err(PipelineError::InvalidTransition {
                from: self.state,
                to: next,
            });
        }
        tracing::info!("Pipeline: {} → {}", self.state, next);
        self.state = next;
        Ok(())
    }

    /// Run the whole pipeline once
    ///
    /// The configuration is validated before any state change, so an invalid
    /// config leaves both the pipeline and the storage untouched.
    pub fn run(&mut self) -> Result<RunReport, PipelineError> {
        self.config.validate()?;

        let started = Instant::now();
        let seed = self.config.resolve_seed();
        tracing::info!(
            "Starting bulk run: {} customers, {} workers, seed {}",
            self.config.customer_count,
            self.config.worker_count(),
            seed
        );

        let outcome = self.run_phases(seed).and_then(|phases| {
            let counts = EntityCounts::fetch(&*self.storage)?;
            self.transition(PipelineState::Done)?;
            Ok((phases, counts))
        });
        let (phases, counts) = match outcome {
            Ok(done) => done,
            Err(source) => return Err(self.fail(source)),
        };
        tracing::info!("Bulk run finished in {:?}: {}", started.elapsed(), counts);

        Ok(RunReport {
            customers: counts.customers,
            accounts: counts.accounts,
            transactions: counts.transactions,
            elapsed: started.elapsed(),
            phases,
            seed,
        })
    }

    fn fail(&mut self, source: PipelineError) -> PipelineError {
        let phase = self.state;
        let persisted = match EntityCounts::fetch(&*self.storage) {
            Ok(counts) => Some(counts),
            Err(e) => {
                tracing::warn!("Could not count persisted rows: {}", e);
                None
            }
        };

        if let Err(e) = self.transition(PipelineState::Failed) {
            tracing::warn!("{}", e);
        }
        tracing::error!("Phase '{}' failed: {}", phase, source);

        PipelineError::Phase {
            phase,
            persisted,
            source: Box::new(source),
        }
    }

    fn run_phases(&mut self, seed: u64) -> Result<Vec<PhaseSummary>, PipelineError> {
        self.transition(PipelineState::ClearingData)?;
        clear_data(&mut *self.storage)?;

        self.transition(PipelineState::GeneratingCustomers)?;
        let customers = self.generate_customers(seed)?;

        self.transition(PipelineState::GeneratingAccounts)?;
        let accounts = self.generate_accounts(seed)?;

        self.transition(PipelineState::GeneratingTransactions)?;
        let transactions = self.generate_transactions(seed)?;

        Ok(vec![customers, accounts, transactions])
    }

    fn writer(&self) -> BatchWriter<'a> {
        BatchWriter::new(
            self.config.batch_size,
            self.config.retry_policy(),
            self.progress,
        )
    }

    /// Generate and write customers one batch-sized slice at a time
    fn generate_customers(&mut self, seed: u64) -> Result<PhaseSummary, PipelineError> {
        let started = Instant::now();
        let total = self.config.customer_count;
        let customer_seed = phase_seed(seed, Entity::Customer);
        let writer = self.writer();
        let slice = writer.batch_size();

        self.progress.start(Entity::Customer, total as u64);
        let mut write = WriteSummary::default();
        let mut start = 0;

        while start < total {
            let count = slice.min(total - start);
            let customers = generate_customers(customer_seed, start, count, self.now);
            write.absorb(writer.write_from(&mut *self.storage, &customers, start as u64)?);
            start += count;
        }
        self.progress.finish(Entity::Customer);

        Ok(PhaseSummary {
            entity: Entity::Customer,
            write,
            elapsed: started.elapsed(),
        })
    }

    fn generate_accounts(&mut self, seed: u64) -> Result<PhaseSummary, PipelineError> {
        let started = Instant::now();
        let account_seed = phase_seed(seed, Entity::Account);

        let customer_ids = self.storage.list_ids(Entity::Customer)?;
        let mut sample_rng = rng_for(account_seed ^ OWNER_SAMPLE_SALT, 0);
        let owners = sample_owners(customer_ids, self.config.account_owner_ratio, &mut sample_rng);
        tracing::info!("Generating accounts for {} customers", owners.len());

        let range = self.config.accounts_per_customer;
        let now = self.now;
        let accounts = WorkerPool::new(self.config.worker_count()).run(
            owners,
            account_seed,
            move |customer_id, rng| Ok(generate_accounts(customer_id, rng, range, now)),
        )?;

        self.progress.start(Entity::Account, accounts.len() as u64);
        let write = self.writer().write(&mut *self.storage, &accounts)?;
        self.progress.finish(Entity::Account);

        Ok(PhaseSummary {
            entity: Entity::Account,
            write,
            elapsed: started.elapsed(),
        })
    }

    fn generate_transactions(&mut self, seed: u64) -> Result<PhaseSummary, PipelineError> {
        let started = Instant::now();
        let transaction_seed = phase_seed(seed, Entity::Transaction);

        let account_ids = self.storage.list_ids(Entity::Account)?;
        tracing::info!("Generating transactions for {} accounts", account_ids.len());

        let range = self.config.transactions_per_account;
        let now = self.now;
        let transactions = WorkerPool::new(self.config.worker_count()).run(
            account_ids,
            transaction_seed,
            move |account_id, rng| Ok(generate_transactions(account_id, rng, range, now)),
        )?;

        self.progress.start(Entity::Transaction, transactions.len() as u64);
        let write = self.writer().write(&mut *self.storage, &transactions)?;
        self.progress.finish(Entity::Transaction);

        Ok(PhaseSummary {
            entity: Entity::Transaction,
            write,
            elapsed: started.elapsed(),
        })
    }
}
