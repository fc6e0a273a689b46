// 🎲 Record Generator
//
// Pure functions: (parent id, RNG, now) → records. No I/O, no shared state.
// Every parent gets its own Xoshiro256++ stream derived from the run seed and
// the parent's position, so the same seed always yields the same dataset no
// matter how the work is split across workers.

use chrono::{DateTime, Duration, Utc};
use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;

use crate::config::CountRange;
use crate::constants::{
    CREATED_AT_WINDOW_DAYS, DEFAULT_CURRENCY, MAX_CUSTOMER_AGE, MIN_CUSTOMER_AGE,
};
use crate::entities::{
    round_cents, Account, AccountType, Customer, Entity, Transaction, TransactionType,
};

/// RNG used for all record generation
pub type SeedRng = Xoshiro256PlusPlus;

// ============================================================================
// SAMPLE VALUES
// ============================================================================

const FIRST_NAMES: &[&str] = &[
    "James", "Mary", "Robert", "Patricia", "John", "Jennifer", "Michael", "Linda", "David",
    "Elizabeth", "William", "Barbara", "Richard", "Susan", "Joseph", "Jessica", "Thomas", "Sarah",
    "Carlos", "Maria", "Wei", "Aisha", "Hiroshi", "Priya", "Olga", "Mateo", "Fatima", "Liam",
];

const LAST_NAMES: &[&str] = &[
    "Smith", "Johnson", "Williams", "Brown", "Jones", "Garcia", "Miller", "Davis", "Rodriguez",
    "Martinez", "Hernandez", "Lopez", "Wilson", "Anderson", "Thomas", "Taylor", "Moore", "Jackson",
    "Nguyen", "Chen", "Patel", "Kim", "Ivanova", "Okafor", "Rossi", "Schmidt", "Dubois", "Silva",
];

const STREETS: &[&str] = &[
    "Main", "Oak", "Pine", "Maple", "Cedar", "Elm", "Washington", "Lake", "Hill", "Park",
    "Sunset", "Riverside", "Highland", "Church", "Mill",
];

const STREET_SUFFIXES: &[&str] = &["St", "Ave", "Blvd", "Rd", "Ln", "Dr", "Ct"];

const CITIES: &[(&str, &str)] = &[
    ("Springfield", "IL"),
    ("Austin", "TX"),
    ("Portland", "OR"),
    ("Denver", "CO"),
    ("Columbus", "OH"),
    ("Raleigh", "NC"),
    ("Madison", "WI"),
    ("Tampa", "FL"),
    ("Phoenix", "AZ"),
    ("Boston", "MA"),
];

const EMAIL_DOMAINS: &[&str] = &["example.com", "mail.test", "inbox.test", "bank.example"];

const MERCHANTS: &[&str] = &[
    "Amazon", "Walmart", "Target", "Costco", "Starbucks", "Shell", "Uber", "Netflix", "Home Depot",
    "Whole Foods", "Delta Air Lines", "CVS Pharmacy", "Apple Store", "Spotify",
];

const EMPLOYERS: &[&str] = &["Acme Corp", "Globex", "Initech", "Umbrella Ltd", "Stark Industries"];

fn pick<T: Copy>(rng: &mut impl Rng, items: &[T]) -> T {
    items[rng.random_range(0..items.len())]
}

// ============================================================================
// SEEDING
// ============================================================================

/// Seed for one generation phase; keeps the customer, account and transaction
/// streams apart even when parent indices coincide
pub fn phase_seed(run_seed: u64, entity: Entity) -> u64 {
    let salt: u64 = match entity {
        Entity::Customer => 1,
        Entity::Account => 2,
        Entity::Transaction => 3,
    };
    run_seed ^ salt.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// RNG for the record (or parent) at `sequence` within a phase
pub fn rng_for(seed: u64, sequence: u64) -> SeedRng {
    Xoshiro256PlusPlus::seed_from_u64(seed.wrapping_add(sequence))
}

/// UUID v4 built from RNG bytes, so ids are reproducible under a fixed seed
pub fn random_id(rng: &mut impl Rng) -> String {
    uuid::Builder::from_random_bytes(rng.random())
        .into_uuid()
        .to_string()
}

fn random_created_at(rng: &mut impl Rng, now: DateTime<Utc>) -> DateTime<Utc> {
    let window = CREATED_AT_WINDOW_DAYS * 24 * 60 * 60;
    now - Duration::seconds(rng.random_range(0..=window))
}

// ============================================================================
// CUSTOMERS
// ============================================================================

pub fn generate_customer(rng: &mut impl Rng, now: DateTime<Utc>) -> Customer {
    let id = random_id(rng);
    let first_name = pick(rng, FIRST_NAMES);
    let last_name = pick(rng, LAST_NAMES);

    // id prefix keeps emails unique across customers with the same name
    let email = format!(
        "{}.{}.{}@{}",
        first_name.to_lowercase(),
        last_name.to_lowercase(),
        &id[..8],
        pick(rng, EMAIL_DOMAINS)
    );

    let phone = format!(
        "+1-{:03}-{:03}-{:04}",
        rng.random_range(200..=999),
        rng.random_range(200..=999),
        rng.random_range(0..=9999)
    );

    let (city, state) = pick(rng, CITIES);
    let address = format!(
        "{} {} {}, {}, {}",
        rng.random_range(1..=9999),
        pick(rng, STREETS),
        pick(rng, STREET_SUFFIXES),
        city,
        state
    );

    // Age drawn in days so birthdays spread across the year; the bounds stay
    // inside [MIN, MAX] whole years whatever the leap days
    let age_days = rng.random_range(MIN_CUSTOMER_AGE * 366..=MAX_CUSTOMER_AGE * 365);
    let date_of_birth = now.date_naive() - Duration::days(age_days);

    Customer {
        id,
        first_name: first_name.to_string(),
        last_name: last_name.to_string(),
        email,
        phone,
        address,
        date_of_birth,
        created_at: random_created_at(rng, now),
    }
}

/// `count` customers starting at position `start` of the customer phase
pub fn generate_customers(seed: u64, start: usize, count: usize, now: DateTime<Utc>) -> Vec<Customer> {
    (start..start + count)
        .map(|index| {
            let mut rng = rng_for(seed, index as u64);
            generate_customer(&mut rng, now)
        })
        .collect()
}

// ============================================================================
// ACCOUNTS
// ============================================================================

/// Weighted draw over `AccountType::ALL`
pub fn random_account_type(rng: &mut impl Rng) -> AccountType {
    let total: u32 = AccountType::ALL.iter().map(|t| t.weight()).sum();
    let mut roll = rng.random_range(0..total);
    for account_type in AccountType::ALL {
        if roll < account_type.weight() {
            return account_type;
        }
        roll -= account_type.weight();
    }
    AccountType::Checking
}

/// Balance uniform in the type's range, rounded to cents
pub fn random_balance(rng: &mut impl Rng, account_type: AccountType) -> f64 {
    let range = account_type.balance_range();
    round_cents(rng.random_range(range.min..=range.max))
}

pub fn generate_account(
    customer_id: &str,
    rng: &mut impl Rng,
    now: DateTime<Utc>,
) -> Account {
    let id = random_id(rng);
    let account_type = random_account_type(rng);

    Account {
        id,
        account_number: format!("{:012}", rng.random_range(0..1_000_000_000_000u64)),
        account_type,
        balance: random_balance(rng, account_type),
        currency: DEFAULT_CURRENCY.to_string(),
        customer_id: customer_id.to_string(),
        created_at: random_created_at(rng, now),
    }
}

/// Between `range.min` and `range.max` accounts owned by `customer_id`
pub fn generate_accounts(
    customer_id: &str,
    rng: &mut impl Rng,
    range: CountRange,
    now: DateTime<Utc>,
) -> Vec<Account> {
    let count = rng.random_range(range.min..=range.max);
    (0..count)
        .map(|_| generate_account(customer_id, rng, now))
        .collect()
}

// ============================================================================
// TRANSACTIONS
// ============================================================================

fn describe(rng: &mut impl Rng, transaction_type: TransactionType) -> String {
    match transaction_type {
        TransactionType::Deposit => format!("Payroll deposit from {}", pick(rng, EMPLOYERS)),
        TransactionType::Withdrawal => {
            format!("ATM withdrawal #{:05}", rng.random_range(0..100_000))
        }
        TransactionType::Transfer => {
            format!("Transfer to account *{:04}", rng.random_range(0..10_000))
        }
        TransactionType::Payment => format!("Card payment at {}", pick(rng, MERCHANTS)),
        TransactionType::Fee => "Monthly maintenance fee".to_string(),
        TransactionType::Interest => "Interest credit".to_string(),
    }
}

pub fn generate_transaction(
    account_id: &str,
    rng: &mut impl Rng,
    now: DateTime<Utc>,
) -> Transaction {
    let id = random_id(rng);
    let transaction_type = pick(rng, &TransactionType::ALL);
    let (min, max) = transaction_type.amount_range();

    Transaction {
        id,
        account_id: account_id.to_string(),
        amount: round_cents(rng.random_range(min..=max)),
        transaction_type,
        description: describe(rng, transaction_type),
        created_at: random_created_at(rng, now),
    }
}

/// Between `range.min` and `range.max` transactions on `account_id`
pub fn generate_transactions(
    account_id: &str,
    rng: &mut impl Rng,
    range: CountRange,
    now: DateTime<Utc>,
) -> Vec<Transaction> {
    let count = rng.random_range(range.min..=range.max);
    (0..count)
        .map(|_| generate_transaction(account_id, rng, now))
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn fixed_now() -> DateTime<Utc> {
        DateTime::parse_from_rfc3339("2025-06-01T12:00:00Z")
            .unwrap()
            .with_timezone(&Utc)
    }

    #[test]
    fn test_same_seed_same_records() {
        let now = fixed_now();
        let a = generate_customers(42, 0, 20, now);
        let b = generate_customers(42, 0, 20, now);
        assert_eq!(a, b);

        let c = generate_customers(43, 0, 20, now);
        assert_ne!(a, c);
    }

    #[test]
    fn test_customer_slices_are_consistent() {
        let now = fixed_now();
        let whole = generate_customers(7, 0, 10, now);
        let mut pieces = generate_customers(7, 0, 4, now);
        pieces.extend(generate_customers(7, 4, 6, now));
        assert_eq!(whole, pieces);
    }

    #[test]
    fn test_customer_fields() {
        let now = fixed_now();
        let customers = generate_customers(1, 0, 500, now);

        let ids: HashSet<_> = customers.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids.len(), 500, "ids must be unique");

        let emails: HashSet<_> = customers.iter().map(|c| c.email.as_str()).collect();
        assert_eq!(emails.len(), 500, "emails must be unique");

        for customer in &customers {
            assert!(uuid::Uuid::parse_str(&customer.id).is_ok());
            let age = customer.age_at(now.date_naive()) as i64;
            assert!(
                (MIN_CUSTOMER_AGE..=MAX_CUSTOMER_AGE).contains(&age),
                "age {} out of range",
                age
            );
            assert!(customer.created_at <= now);
            assert!(customer.created_at >= now - Duration::days(CREATED_AT_WINDOW_DAYS));
            assert!(customer.phone.starts_with("+1-"));
        }
    }

    #[test]
    fn test_loan_balances_stay_negative() {
        let mut rng = rng_for(99, 0);
        let range = AccountType::Loan.balance_range();

        for _ in 0..10_000 {
            let balance = random_balance(&mut rng, AccountType::Loan);
            assert!(
                range.contains(balance),
                "loan balance {} outside [{}, {}]",
                balance,
                range.min,
                range.max
            );
            assert!(balance <= -1_000.0 && balance >= -50_000.0);
        }
    }

    #[test]
    fn test_every_type_balance_in_range() {
        let mut rng = rng_for(5, 0);
        for account_type in AccountType::ALL {
            let range = account_type.balance_range();
            for _ in 0..1_000 {
                assert!(range.contains(random_balance(&mut rng, account_type)));
            }
        }
    }

    #[test]
    fn test_account_type_distribution_covers_all_types() {
        let mut rng = rng_for(3, 0);
        let seen: HashSet<_> = (0..2_000).map(|_| random_account_type(&mut rng)).collect();
        assert_eq!(seen.len(), AccountType::ALL.len());
    }

    #[test]
    fn test_accounts_bounded_and_owned_by_parent() {
        let now = fixed_now();
        let range = CountRange::new(1, 3);

        for parent in 0..300u64 {
            let customer_id = format!("customer-{}", parent);
            let mut rng = rng_for(11, parent);
            let accounts = generate_accounts(&customer_id, &mut rng, range, now);

            assert!(range.contains(accounts.len()), "{} accounts", accounts.len());
            for account in &accounts {
                assert_eq!(account.customer_id, customer_id);
                assert_eq!(account.account_number.len(), 12);
                assert!(account.account_type.balance_range().contains(account.balance));
            }
        }
    }

    #[test]
    fn test_transactions_bounded_and_positive() {
        let now = fixed_now();
        let range = CountRange::new(5, 20);
        let mut counts = HashSet::new();

        for parent in 0..300u64 {
            let mut rng = rng_for(13, parent);
            let transactions = generate_transactions("acc-1", &mut rng, range, now);

            assert!(range.contains(transactions.len()));
            counts.insert(transactions.len());
            for tx in &transactions {
                assert_eq!(tx.account_id, "acc-1");
                assert!(tx.amount > 0.0);
                let (min, max) = tx.transaction_type.amount_range();
                assert!(tx.amount >= min && tx.amount <= max);
                assert!(!tx.description.is_empty());
            }
        }

        // Both ends of the inclusive range get drawn
        assert!(counts.contains(&5) && counts.contains(&20));
    }

    #[test]
    fn test_fixed_count_range() {
        let mut rng = rng_for(17, 0);
        let accounts = generate_accounts("c", &mut rng, CountRange::new(2, 2), fixed_now());
        assert_eq!(accounts.len(), 2);
    }

    #[test]
    fn test_phase_seeds_differ() {
        let seeds: HashSet<_> = [Entity::Customer, Entity::Account, Entity::Transaction]
            .into_iter()
            .map(|e| phase_seed(42, e))
            .collect();
        assert_eq!(seeds.len(), 3);
    }
}
