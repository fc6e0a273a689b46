#[cfg(test)]
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, Statement};
use std::path::Path;

use super::Storage;
use crate::entities::{Account, Customer, Entity, Transaction};
use crate::error::StorageError;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed storage
///
/// One SQL transaction per batch insert. `INSERT OR IGNORE` skips ids that
/// already exist; foreign keys are enforced so a child can never point at a
/// missing parent.
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory()?;
        setup_database(&conn)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert_rows<T>(
        &mut self,
        sql: &str,
        batch: &[T],
        bind: impl Fn(&mut Statement<'_>, &T) -> rusqlite::Result<usize>,
    ) -> Result<usize, StorageError> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        {
            let mut stmt = tx.prepare_cached(sql)?;
            for row in batch {
                inserted += bind(&mut *stmt, row)?;
            }
        }
        tx.commit()?;
        Ok(inserted)
    }
}

pub fn setup_database(conn: &Connection) -> rusqlite::Result<()> {
    // Enable WAL mode for crash recovery
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS customers (
            id TEXT PRIMARY KEY,
            first_name TEXT NOT NULL,
            last_name TEXT NOT NULL,
            email TEXT NOT NULL,
            phone TEXT NOT NULL,
            address TEXT NOT NULL,
            date_of_birth TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS accounts (
            id TEXT PRIMARY KEY,
            account_number TEXT NOT NULL,
            account_type TEXT NOT NULL,
            balance REAL NOT NULL,
            currency TEXT NOT NULL,
            customer_id TEXT NOT NULL REFERENCES customers(id),
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS transactions (
            id TEXT PRIMARY KEY,
            account_id TEXT NOT NULL REFERENCES accounts(id),
            amount REAL NOT NULL,
            transaction_type TEXT NOT NULL,
            description TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",
        [],
    )?;

    // ==========================================================================
    // Indexes
    // ==========================================================================
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_accounts_customer ON accounts(customer_id)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_transactions_account ON transactions(account_id)",
        [],
    )?;

    Ok(())
}

impl Storage for SqliteStorage {
    fn count(&self, entity: Entity) -> Result<u64, StorageError> {
        let sql = format!("SELECT COUNT(*) FROM {}", entity.table());
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count as u64)
    }

    fn delete_all(&mut self, entity: Entity) -> Result<u64, StorageError> {
        let sql = format!("DELETE FROM {}", entity.table());
        let removed = self.conn.execute(&sql, [])?;
        Ok(removed as u64)
    }

    fn list_ids(&self, entity: Entity) -> Result<Vec<String>, StorageError> {
        let sql = format!("SELECT id FROM {} ORDER BY rowid", entity.table());
        let mut stmt = self.conn.prepare(&sql)?;
        let ids = stmt
            .query_map([], |row| row.get(0))?
            .collect::<Result<Vec<String>, _>>()?;
        Ok(ids)
    }

    fn insert_customers(&mut self, batch: &[Customer]) -> Result<usize, StorageError> {
        self.insert_rows(
            "INSERT OR IGNORE INTO customers (
                id, first_name, last_name, email, phone, address, date_of_birth, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            batch,
            |stmt, c| {
                stmt.execute(params![
                    c.id,
                    c.first_name,
                    c.last_name,
                    c.email,
                    c.phone,
                    c.address,
                    c.date_of_birth.format(DATE_FORMAT).to_string(),
                    c.created_at.to_rfc3339(),
                ])
            },
        )
    }

    fn insert_accounts(&mut self, batch: &[Account]) -> Result<usize, StorageError> {
        self.insert_rows(
            "INSERT OR IGNORE INTO accounts (
                id, account_number, account_type, balance, currency, customer_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            batch,
            |stmt, a| {
                stmt.execute(params![
                    a.id,
                    a.account_number,
                    a.account_type.as_str(),
                    a.balance,
                    a.currency,
                    a.customer_id,
                    a.created_at.to_rfc3339(),
                ])
            },
        )
    }

    fn insert_transactions(&mut self, batch: &[Transaction]) -> Result<usize, StorageError> {
        self.insert_rows(
            "INSERT OR IGNORE INTO transactions (
                id, account_id, amount, transaction_type, description, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            batch,
            |stmt, t| {
                stmt.execute(params![
                    t.id,
                    t.account_id,
                    t.amount,
                    t.transaction_type.as_str(),
                    t.description,
                    t.created_at.to_rfc3339(),
                ])
            },
        )
    }
}

/// Load every account row
#[cfg(test)]
pub(crate) fn get_all_accounts(conn: &Connection) -> Result<Vec<Account>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT id, account_number, account_type, balance, currency, customer_id, created_at
         FROM accounts
         ORDER BY rowid",
    )?;

    let accounts = stmt
        .query_map([], |row| {
            let type_str: String = row.get(2)?;
            let created_str: String = row.get(6)?;

            Ok(Account {
                id: row.get(0)?,
                account_number: row.get(1)?,
                account_type: crate::entities::AccountType::parse(&type_str)
                    .ok_or(rusqlite::Error::InvalidQuery)?,
                balance: row.get(3)?,
                currency: row.get(4)?,
                customer_id: row.get(5)?,
                created_at: parse_timestamp(&created_str)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(accounts)
}

/// Sum of signed transaction amounts per account id
#[cfg(test)]
pub(crate) fn transaction_totals(conn: &Connection) -> Result<Vec<(String, f64)>, StorageError> {
    let mut stmt = conn.prepare(
        "SELECT account_id,
                SUM(CASE WHEN transaction_type IN ('DEPOSIT', 'INTEREST') THEN amount ELSE -amount END)
         FROM transactions
         GROUP BY account_id
         ORDER BY account_id",
    )?;

    let totals = stmt
        .query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(totals)
}

#[cfg(test)]
fn parse_timestamp(value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| rusqlite::Error::InvalidQuery)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{AccountType, TransactionType};

    fn create_test_customer(id: &str) -> Customer {
        Customer {
            id: id.to_string(),
            first_name: "Alan".to_string(),
            last_name: "Turing".to_string(),
            email: format!("{}@example.com", id),
            phone: "+1-555-123-4567".to_string(),
            address: "2 Bletchley Park, Milton Keynes, NJ".to_string(),
            date_of_birth: NaiveDate::from_ymd_opt(1985, 6, 23).unwrap(),
            created_at: Utc::now(),
        }
    }

    fn create_test_account(id: &str, customer_id: &str, balance: f64) -> Account {
        Account {
            id: id.to_string(),
            account_number: "123412341234".to_string(),
            account_type: AccountType::Savings,
            balance,
            currency: "USD".to_string(),
            customer_id: customer_id.to_string(),
            created_at: Utc::now(),
        }
    }

    fn create_test_transaction(id: &str, account_id: &str, amount: f64, tx_type: TransactionType) -> Transaction {
        Transaction {
            id: id.to_string(),
            account_id: account_id.to_string(),
            amount,
            transaction_type: tx_type,
            description: "test".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_idempotency_insert_twice() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let customers = vec![
            create_test_customer("c1"),
            create_test_customer("c2"),
            create_test_customer("c3"),
        ];

        let inserted1 = storage.insert_customers(&customers).unwrap();
        let inserted2 = storage.insert_customers(&customers).unwrap();

        assert_eq!(inserted1, 3, "First insert should write 3 customers");
        assert_eq!(inserted2, 0, "Second insert should skip every existing id");
        assert_eq!(storage.count(Entity::Customer).unwrap(), 3);
    }

    #[test]
    fn test_list_ids_in_insertion_order() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        let customers: Vec<_> = ["zeta", "alpha", "mid"]
            .iter()
            .map(|id| create_test_customer(id))
            .collect();
        storage.insert_customers(&customers).unwrap();

        assert_eq!(
            storage.list_ids(Entity::Customer).unwrap(),
            vec!["zeta", "alpha", "mid"]
        );
    }

    #[test]
    fn test_foreign_key_enforced() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();

        let result = storage.insert_accounts(&[create_test_account("a1", "missing", 1.0)]);
        assert!(result.is_err(), "Account with unknown customer must be rejected");
        assert_eq!(storage.count(Entity::Account).unwrap(), 0);
    }

    #[test]
    fn test_clear_in_dependency_order() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.insert_customers(&[create_test_customer("c1")]).unwrap();
        storage.insert_accounts(&[create_test_account("a1", "c1", 5.0)]).unwrap();
        storage
            .insert_transactions(&[create_test_transaction("t1", "a1", 5.0, TransactionType::Deposit)])
            .unwrap();

        // Parent first violates the foreign key
        assert!(storage.delete_all(Entity::Customer).is_err());

        for entity in Entity::clear_order() {
            assert_eq!(storage.delete_all(entity).unwrap(), 1);
        }
        for entity in Entity::clear_order() {
            assert_eq!(storage.count(entity).unwrap(), 0);
        }
    }

    #[test]
    fn test_accounts_read_back_and_totals() {
        let mut storage = SqliteStorage::open_in_memory().unwrap();
        storage.insert_customers(&[create_test_customer("c1")]).unwrap();
        storage.insert_accounts(&[create_test_account("a1", "c1", 70.0)]).unwrap();
        storage
            .insert_transactions(&[
                create_test_transaction("t1", "a1", 100.0, TransactionType::Deposit),
                create_test_transaction("t2", "a1", 35.0, TransactionType::Payment),
                create_test_transaction("t3", "a1", 5.0, TransactionType::Interest),
            ])
            .unwrap();

        let accounts = get_all_accounts(storage.connection()).unwrap();
        assert_eq!(accounts.len(), 1);
        assert_eq!(accounts[0].account_type, AccountType::Savings);
        assert_eq!(accounts[0].customer_id, "c1");

        let totals = transaction_totals(storage.connection()).unwrap();
        assert_eq!(totals, vec![("a1".to_string(), 70.0)]);
    }

    #[test]
    fn test_open_file_database() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("seed.db");

        {
            let mut storage = SqliteStorage::open(&path).unwrap();
            storage.insert_customers(&[create_test_customer("c1")]).unwrap();
        }

        let storage = SqliteStorage::open(&path).unwrap();
        assert_eq!(storage.count(Entity::Customer).unwrap(), 1);
    }
}
