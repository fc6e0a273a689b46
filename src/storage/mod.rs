// 🗄️ Storage collaborator
//
// The pipeline only needs four things from a backend: count rows, insert a
// batch while skipping ids that already exist, delete everything of one
// entity, and list ids. Each batch insert is its own unit of work.

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::{setup_database, SqliteStorage};

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::entities::{Account, Customer, Entity, Transaction};
use crate::error::StorageError;

pub trait Storage {
    fn count(&self, entity: Entity) -> Result<u64, StorageError>;

    /// Delete every row of `entity`, returning how many were removed
    fn delete_all(&mut self, entity: Entity) -> Result<u64, StorageError>;

    /// Ids of `entity` in insertion order
    fn list_ids(&self, entity: Entity) -> Result<Vec<String>, StorageError>;

    /// Skip-duplicates inserts. Each returns the number of rows actually written.
    fn insert_customers(&mut self, batch: &[Customer]) -> Result<usize, StorageError>;
    fn insert_accounts(&mut self, batch: &[Account]) -> Result<usize, StorageError>;
    fn insert_transactions(&mut self, batch: &[Transaction]) -> Result<usize, StorageError>;
}

/// A generated row the batch writer knows how to persist
pub trait Record: Send + 'static {
    const ENTITY: Entity;

    fn insert_batch<S: Storage + ?Sized>(storage: &mut S, batch: &[Self]) -> Result<usize, StorageError>
    where
        Self: Sized;
}

impl Record for Customer {
    const ENTITY: Entity = Entity::Customer;

    fn insert_batch<S: Storage + ?Sized>(storage: &mut S, batch: &[Self]) -> Result<usize, StorageError> {
        storage.insert_customers(batch)
    }
}

impl Record for Account {
    const ENTITY: Entity = Entity::Account;

    fn insert_batch<S: Storage + ?Sized>(storage: &mut S, batch: &[Self]) -> Result<usize, StorageError> {
        storage.insert_accounts(batch)
    }
}

impl Record for Transaction {
    const ENTITY: Entity = Entity::Transaction;

    fn insert_batch<S: Storage + ?Sized>(storage: &mut S, batch: &[Self]) -> Result<usize, StorageError> {
        storage.insert_transactions(batch)
    }
}

/// Row counts per entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub customers: u64,
    pub accounts: u64,
    pub transactions: u64,
}

impl EntityCounts {
    pub fn fetch<S: Storage + ?Sized>(storage: &S) -> Result<Self, StorageError> {
        Ok(Self {
            customers: storage.count(Entity::Customer)?,
            accounts: storage.count(Entity::Account)?,
            transactions: storage.count(Entity::Transaction)?,
        })
    }
}

impl fmt::Display for EntityCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} customers, {} accounts, {} transactions",
            self.customers, self.accounts, self.transactions
        )
    }
}
