// Bank Seeder - Core Library
// Bulk synthetic banking data: customers → accounts → transactions
// Exposes all modules for use in the CLI and tests

pub mod config;
pub mod constants;
pub mod entities;     // Customer, Account, Transaction
pub mod error;
pub mod generator;    // Deterministic record generation
pub mod orchestrator; // Phase state machine (bulk mode)
pub mod pool;         // Thread-per-chunk generation workers
pub mod progress;
pub mod retry;
pub mod seed;         // Small-scale seed mode
pub mod storage;      // Storage trait + SQLite / in-memory backends
pub mod writer;       // Batched, retried inserts

// Re-export commonly used types
pub use config::{CountRange, ProgressMode, SeederConfig};
pub use entities::{
    Account, AccountType,
    Customer, Entity,
    Transaction, TransactionType,
};
pub use error::{ConfigError, PipelineError, StorageError};
pub use orchestrator::{clear_data, Orchestrator, PipelineState, RunReport};
pub use pool::{partition, WorkerPool};
pub use progress::{reporter, LogProgress, NoProgress, Progress};
#[cfg(feature = "progress-bars")]
pub use progress::BarProgress;
pub use retry::{retry, Backoff, RetryPolicy};
pub use seed::SeedReport;
pub use storage::{EntityCounts, MemoryStorage, SqliteStorage, Storage};
pub use writer::{BatchWriter, WriteSummary};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
