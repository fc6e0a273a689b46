// Pipeline defaults
// Every value here can be overridden from the JSON config file

/// Default SQLite database file
pub const DEFAULT_DATABASE_PATH: &str = "bank_seed.db";

/// Customers written by the bulk pipeline
pub const DEFAULT_CUSTOMER_COUNT: usize = 100_000;

/// Records per storage write call
pub const DEFAULT_BATCH_SIZE: usize = 1_000;

/// Accounts generated per sampled customer (inclusive)
pub const DEFAULT_ACCOUNTS_PER_CUSTOMER: (usize, usize) = (1, 3);

/// Transactions generated per account (inclusive)
pub const DEFAULT_TRANSACTIONS_PER_ACCOUNT: (usize, usize) = (5, 20);

/// Share of customers that receive accounts in the bulk path
pub const DEFAULT_ACCOUNT_OWNER_RATIO: f64 = 0.1;

/// Additional attempts after the first failed batch insert
pub const DEFAULT_MAX_RETRIES: u32 = 3;

/// Fixed pause between batch insert attempts
pub const DEFAULT_RETRY_DELAY_MS: u64 = 1_000;

// Small-scale seed mode
pub const DEFAULT_SEED_CUSTOMERS: usize = 50;
pub const DEFAULT_SEED_ACCOUNTS_PER_CUSTOMER: (usize, usize) = (1, 3);
pub const DEFAULT_SEED_TRANSACTIONS_PER_ACCOUNT: (usize, usize) = (3, 10);

/// Currency assigned to every generated account
pub const DEFAULT_CURRENCY: &str = "USD";

/// Oldest creation timestamp, measured back from the run start
pub const CREATED_AT_WINDOW_DAYS: i64 = 365;

/// Customer age bounds in years (inclusive)
pub const MIN_CUSTOMER_AGE: i64 = 18;
pub const MAX_CUSTOMER_AGE: i64 = 90;
