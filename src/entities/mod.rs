// Entity Models
// Three generated entities, each owned by exactly one generation phase:
// - Customer (no parent)
// - Account (parent: Customer)
// - Transaction (parent: Account)

pub mod account;
pub mod customer;
pub mod transaction;

pub use account::{Account, AccountType};
pub use customer::Customer;
pub use transaction::{Transaction, TransactionType};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of generated record, used to address storage tables and progress counters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Entity {
    Customer,
    Account,
    Transaction,
}

impl Entity {
    /// Backing SQL table
    pub fn table(&self) -> &'static str {
        match self {
            Entity::Customer => "customers",
            Entity::Account => "accounts",
            Entity::Transaction => "transactions",
        }
    }

    /// Plural label for progress output and summaries
    pub fn label(&self) -> &'static str {
        self.table()
    }

    /// Deletion order that respects foreign keys (children first)
    pub fn clear_order() -> [Entity; 3] {
        [Entity::Transaction, Entity::Account, Entity::Customer]
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Round a monetary value to cents
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
