// In-memory storage backend
//
// Mirrors the SQLite backend's rules: ids are unique per entity (duplicates are
// skipped), children must reference an existing parent, and a parent table
// cannot be cleared while children still point at it. Used by `dry-run`.

use std::collections::HashSet;

use super::Storage;
use crate::entities::{Account, Customer, Entity, Transaction};
use crate::error::StorageError;

#[derive(Debug, Default)]
pub struct MemoryStorage {
    customers: Vec<Customer>,
    accounts: Vec<Account>,
    transactions: Vec<Transaction>,
    customer_ids: HashSet<String>,
    account_ids: HashSet<String>,
    transaction_ids: HashSet<String>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn customers(&self) -> &[Customer] {
        &self.customers
    }

    pub fn accounts(&self) -> &[Account] {
        &self.accounts
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }
}

/// Insert rows whose id is not yet known, after checking every row's parent
fn insert_skipping<T: Clone>(
    rows: &mut Vec<T>,
    ids: &mut HashSet<String>,
    batch: &[T],
    id: impl Fn(&T) -> &str,
    parent_missing: impl Fn(&T) -> Option<String>,
) -> Result<usize, StorageError> {
    // Validate first so a rejected batch leaves nothing behind
    if let Some(message) = batch.iter().find_map(&parent_missing) {
        return Err(StorageError::Constraint(message));
    }

    let mut inserted = 0;
    for row in batch {
        if ids.insert(id(row).to_string()) {
            rows.push(row.clone());
            inserted += 1;
        }
    }
    Ok(inserted)
}

impl Storage for MemoryStorage {
    fn count(&self, entity: Entity) -> Result<u64, StorageError> {
        let count = match entity {
            Entity::Customer => self.customers.len(),
            Entity::Account => self.accounts.len(),
            Entity::Transaction => self.transactions.len(),
        };
        Ok(count as u64)
    }

    fn delete_all(&mut self, entity: Entity) -> Result<u64, StorageError> {
        let removed = match entity {
            Entity::Customer => {
                if !self.accounts.is_empty() {
                    return Err(StorageError::Constraint(
                        "customers still referenced by accounts".to_string(),
                    ));
                }
                self.customer_ids.clear();
                std::mem::take(&mut self.customers).len()
            }
            Entity::Account => {
                if !self.transactions.is_empty() {
                    return Err(StorageError::Constraint(
                        "accounts still referenced by transactions".to_string(),
                    ));
                }
                self.account_ids.clear();
                std::mem::take(&mut self.accounts).len()
            }
            Entity::Transaction => {
                self.transaction_ids.clear();
                std::mem::take(&mut self.transactions).len()
            }
        };
        Ok(removed as u64)
    }

    fn list_ids(&self, entity: Entity) -> Result<Vec<String>, StorageError> {
        let ids = match entity {
            Entity::Customer => self.customers.iter().map(|c| c.id.clone()).collect(),
            Entity::Account => self.accounts.iter().map(|a| a.id.clone()).collect(),
            Entity::Transaction => self.transactions.iter().map(|t| t.id.clone()).collect(),
        };
        Ok(ids)
    }

    fn insert_customers(&mut self, batch: &[Customer]) -> Result<usize, StorageError> {
        insert_skipping(
            &mut self.customers,
            &mut self.customer_ids,
            batch,
            |c| c.id.as_str(),
            |_| None,
        )
    }

    fn insert_accounts(&mut self, batch: &[Account]) -> Result<usize, StorageError> {
        let customer_ids = &self.customer_ids;
        insert_skipping(
            &mut self.accounts,
            &mut self.account_ids,
            batch,
            |a| a.id.as_str(),
            |a| {
                (!customer_ids.contains(&a.customer_id))
                    .then(|| format!("account {} references unknown customer {}", a.id, a.customer_id))
            },
        )
    }

    fn insert_transactions(&mut self, batch: &[Transaction]) -> Result<usize, StorageError> {
        let account_ids = &self.account_ids;
        insert_skipping(
            &mut self.transactions,
            &mut self.transaction_ids,
            batch,
            |t| t.id.as_str(),
            |t| {
                (!account_ids.contains(&t.account_id))
                    .then(|| format!("transaction {} references unknown account {}", t.id, t.account_id))
            },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AccountType, TransactionType};
    use chrono::{NaiveDate, Utc};

    fn customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            first_name: "Grace".to_string(),
            last_name: "Hopper".to_string(),
            email: format!("{}@example.com", id),
            phone: "+1-555-000-0000".to_string(),
            address: "1 Navy Yard, Arlington, VA".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1980, 12, 9).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn account(id: &str, customer_id: &str) -> Account {
        Account {
            id: id.to_string(),
            account_number: "000011112222".to_string(),
            account_type: AccountType::Checking,
            balance: 10.0,
            currency: "USD".to_string(),
            customer_id: customer_id.to_string(),
            created_at: Utc::now(),
        }
    }

    fn transaction(id: &str, account_id: &str) -> Transaction {
        Transaction {
            id: id.to_string(),
            account_id: account_id.to_string(),
            amount: 1.0,
            transaction_type: TransactionType::Fee,
            description: "Monthly fee".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_duplicates_are_skipped() {
        let mut storage = MemoryStorage::new();
        let batch = vec![customer("c1"), customer("c2")];

        assert_eq!(storage.insert_customers(&batch).unwrap(), 2);
        assert_eq!(storage.insert_customers(&batch).unwrap(), 0);
        assert_eq!(storage.count(Entity::Customer).unwrap(), 2);
        assert_eq!(storage.list_ids(Entity::Customer).unwrap(), vec!["c1", "c2"]);
    }

    #[test]
    fn test_unknown_parent_rejects_whole_batch() {
        let mut storage = MemoryStorage::new();
        storage.insert_customers(&[customer("c1")]).unwrap();

        let err = storage
            .insert_accounts(&[account("a1", "c1"), account("a2", "ghost")])
            .unwrap_err();

        assert!(matches!(err, StorageError::Constraint(_)));
        assert_eq!(storage.count(Entity::Account).unwrap(), 0);
    }

    #[test]
    fn test_clear_must_go_children_first() {
        let mut storage = MemoryStorage::new();
        storage.insert_customers(&[customer("c1")]).unwrap();
        storage.insert_accounts(&[account("a1", "c1")]).unwrap();
        storage.insert_transactions(&[transaction("t1", "a1")]).unwrap();

        assert!(storage.delete_all(Entity::Customer).is_err());

        for entity in Entity::clear_order() {
            assert_eq!(storage.delete_all(entity).unwrap(), 1);
        }
        assert_eq!(storage.count(Entity::Customer).unwrap(), 0);
    }
}
