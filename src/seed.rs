// 🌱 Small-scale seed mode
//
// A few dozen customers for local development. Unlike the bulk pipeline every
// customer gets accounts, every account gets transactions, and each balance is
// the signed sum of that account's transactions. Runs on the calling thread.

use chrono::Utc;
use serde::Serialize;
use std::time::{Duration, Instant};

use crate::config::SeederConfig;
use crate::entities::{round_cents, Account, Entity, Transaction};
use crate::error::PipelineError;
use crate::generator::{
    generate_accounts, generate_customers, generate_transactions, phase_seed, rng_for,
};
use crate::orchestrator::{clear_data, PipelineState};
use crate::progress::Progress;
use crate::storage::{EntityCounts, Storage};
use crate::writer::BatchWriter;

#[derive(Debug, Clone, Serialize)]
pub struct SeedReport {
    pub customers: u64,
    pub accounts: u64,
    pub transactions: u64,
    pub elapsed: Duration,
    pub seed: u64,
}

/// Replace all data with a small, internally consistent dataset
pub fn run<S: Storage + ?Sized>(
    storage: &mut S,
    config: &SeederConfig,
    progress: &dyn Progress,
) -> Result<SeedReport, PipelineError> {
    config.validate()?;

    let started = Instant::now();
    let seed = config.resolve_seed();
    let mut phase = PipelineState::ClearingData;

    tracing::info!(
        "Seeding {} customers (seed {})",
        config.seed_customers,
        seed
    );

    match seed_all(&mut *storage, config, progress, seed, &mut phase) {
        Ok(counts) => {
            tracing::info!("Seed finished in {:?}: {}", started.elapsed(), counts);
            Ok(SeedReport {
                customers: counts.customers,
                accounts: counts.accounts,
                transactions: counts.transactions,
                elapsed: started.elapsed(),
                seed,
            })
        }
        Err(source) => {
            tracing::error!("Seed failed while {}: {}", phase, source);
            Err(PipelineError::Phase {
                phase,
                persisted: EntityCounts::fetch(&*storage).ok(),
                source: Box::new(source),
            })
        }
    }
}

fn seed_all<S: Storage + ?Sized>(
    storage: &mut S,
    config: &SeederConfig,
    progress: &dyn Progress,
    seed: u64,
    phase: &mut PipelineState,
) -> Result<EntityCounts, PipelineError> {
    let now = Utc::now();
    let writer = BatchWriter::new(config.batch_size, config.retry_policy(), progress);

    clear_data(&mut *storage)?;

    // Customers
    *phase = PipelineState::GeneratingCustomers;
    let customers = generate_customers(
        phase_seed(seed, Entity::Customer),
        0,
        config.seed_customers,
        now,
    );
    progress.start(Entity::Customer, customers.len() as u64);
    writer.write(&mut *storage, &customers)?;
    progress.finish(Entity::Customer);

    // Accounts and their transactions are generated together so each balance
    // can be derived from the account's own history
    let account_seed = phase_seed(seed, Entity::Account);
    let transaction_seed = phase_seed(seed, Entity::Transaction);
    let mut accounts: Vec<Account> = Vec::new();
    let mut transactions: Vec<Transaction> = Vec::new();

    for (i, customer) in customers.iter().enumerate() {
        let mut rng = rng_for(account_seed, i as u64);
        for mut account in generate_accounts(
            &customer.id,
            &mut rng,
            config.seed_accounts_per_customer,
            now,
        ) {
            let mut tx_rng = rng_for(transaction_seed, accounts.len() as u64);
            let history = generate_transactions(
                &account.id,
                &mut tx_rng,
                config.seed_transactions_per_account,
                now,
            );
            account.balance = round_cents(history.iter().map(Transaction::signed_amount).sum());

            transactions.extend(history);
            accounts.push(account);
        }
    }

    *phase = PipelineState::GeneratingAccounts;
    progress.start(Entity::Account, accounts.len() as u64);
    writer.write(&mut *storage, &accounts)?;
    progress.finish(Entity::Account);

    *phase = PipelineState::GeneratingTransactions;
    progress.start(Entity::Transaction, transactions.len() as u64);
    writer.write(&mut *storage, &transactions)?;
    progress.finish(Entity::Transaction);

    *phase = PipelineState::Done;
    Ok(EntityCounts::fetch(&*storage)?)
}
