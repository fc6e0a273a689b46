// ⚙️ Seeder configuration
//
// Defaults live in constants.rs. A JSON file may override any subset of
// fields; missing fields keep their defaults. Validation runs once at startup.

use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::constants::*;
use crate::error::ConfigError;
use crate::retry::{Backoff, RetryPolicy};

/// Inclusive `[min, max]` child count drawn uniformly per parent
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRange {
    pub min: usize,
    pub max: usize,
}

impl CountRange {
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, n: usize) -> bool {
        n >= self.min && n <= self.max
    }

    fn validate(&self, field: &'static str) -> Result<(), ConfigError> {
        if self.min == 0 {
            return Err(ConfigError::EmptyRange { field });
        }
        if self.min > self.max {
            return Err(ConfigError::InvertedRange {
                field,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

impl From<(usize, usize)> for CountRange {
    fn from((min, max): (usize, usize)) -> Self {
        Self { min, max }
    }
}

/// How progress is shown while writing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressMode {
    /// Terminal progress bars (falls back to log lines without the feature)
    #[default]
    Bars,
    /// One tracing line per batch
    Log,
    /// Silent
    None,
}

/// Configuration for both generation modes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeederConfig {
    /// SQLite database file
    pub database_path: PathBuf,

    // ------------------------------------------------------------------
    // Bulk mode
    // ------------------------------------------------------------------
    pub customer_count: usize,
    pub batch_size: usize,
    pub accounts_per_customer: CountRange,
    pub transactions_per_account: CountRange,
    /// Share of customers that receive accounts (1.0 = every customer)
    pub account_owner_ratio: f64,

    // ------------------------------------------------------------------
    // Retry
    // ------------------------------------------------------------------
    /// Additional attempts after the first failure of a batch insert
    pub max_retries: u32,
    /// Fixed pause between attempts
    pub retry_delay_ms: u64,

    // ------------------------------------------------------------------
    // Parallelism and reproducibility
    // ------------------------------------------------------------------
    /// Generation workers (None = available parallelism - 1, at least 1)
    pub workers: Option<usize>,
    /// RNG seed (None = time + OS entropy). Same seed → same dataset.
    pub seed: Option<u64>,

    // ------------------------------------------------------------------
    // Small-scale seed mode
    // ------------------------------------------------------------------
    pub seed_customers: usize,
    pub seed_accounts_per_customer: CountRange,
    pub seed_transactions_per_account: CountRange,

    pub progress: ProgressMode,
}

impl Default for SeederConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_PATH),
            customer_count: DEFAULT_CUSTOMER_COUNT,
            batch_size: DEFAULT_BATCH_SIZE,
            accounts_per_customer: DEFAULT_ACCOUNTS_PER_CUSTOMER.into(),
            transactions_per_account: DEFAULT_TRANSACTIONS_PER_ACCOUNT.into(),
            account_owner_ratio: DEFAULT_ACCOUNT_OWNER_RATIO,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY_MS,
            workers: None,
            seed: None,
            seed_customers: DEFAULT_SEED_CUSTOMERS,
            seed_accounts_per_customer: DEFAULT_SEED_ACCOUNTS_PER_CUSTOMER.into(),
            seed_transactions_per_account: DEFAULT_SEED_TRANSACTIONS_PER_ACCOUNT.into(),
            progress: ProgressMode::default(),
        }
    }
}

impl SeederConfig {
    /// Load overrides from a JSON file and validate the result
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config: SeederConfig =
            serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.batch_size == 0 {
            return Err(ConfigError::Zero { field: "batch_size" });
        }
        if self.workers == Some(0) {
            return Err(ConfigError::Zero { field: "workers" });
        }
        if !(self.account_owner_ratio > 0.0 && self.account_owner_ratio <= 1.0) {
            return Err(ConfigError::OwnerRatio(self.account_owner_ratio));
        }

        self.accounts_per_customer.validate("accounts_per_customer")?;
        self.transactions_per_account
            .validate("transactions_per_account")?;
        self.seed_accounts_per_customer
            .validate("seed_accounts_per_customer")?;
        self.seed_transactions_per_account
            .validate("seed_transactions_per_account")?;

        Ok(())
    }

    /// Effective worker count
    pub fn worker_count(&self) -> usize {
        self.workers.unwrap_or_else(default_worker_count).max(1)
    }

    /// Fixed-delay retry policy for batch inserts
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            delay: Duration::from_millis(self.retry_delay_ms),
            backoff: Backoff::Fixed,
        }
    }

    /// Configured seed, or fresh entropy when none is set
    pub fn resolve_seed(&self) -> u64 {
        self.seed.unwrap_or_else(generate_entropy)
    }
}

/// Available parallelism minus one (the control thread), never below one
pub fn default_worker_count() -> usize {
    num_cpus::get().saturating_sub(1).max(1)
}

fn generate_entropy() -> u64 {
    let time_entropy = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos() as u64;

    let os_entropy = rand::rng().next_u64();

    time_entropy.wrapping_add(os_entropy)
}
