// 💳 Account Entity - owned by a Customer
//
// Every account carries the UUID of the customer it belongs to (customer_id).
// In the bulk path the balance is assigned once, at creation, from the
// account type's range. It is NOT recomputed from transactions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// ACCOUNT TYPE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AccountType {
    /// Checking account (daily transactions, small overdrafts allowed)
    Checking,

    /// Savings account (interest-bearing, never negative)
    Savings,

    /// Investment account (brokerage, skews high-positive)
    Investment,

    /// Loan account (outstanding principal, always negative)
    Loan,

    /// Credit card (used credit line, zero or negative)
    Credit,
}

/// Inclusive balance bounds for one account type
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BalanceRange {
    pub min: f64,
    pub max: f64,
}

impl BalanceRange {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }
}

impl AccountType {
    pub const ALL: [AccountType; 5] = [
        AccountType::Checking,
        AccountType::Savings,
        AccountType::Investment,
        AccountType::Loan,
        AccountType::Credit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "CHECKING",
            AccountType::Savings => "SAVINGS",
            AccountType::Investment => "INVESTMENT",
            AccountType::Loan => "LOAN",
            AccountType::Credit => "CREDIT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(value))
    }

    /// Balance bounds used by the generator
    pub fn balance_range(&self) -> BalanceRange {
        let (min, max) = match self {
            AccountType::Checking => (-500.0, 25_000.0),
            AccountType::Savings => (0.0, 150_000.0),
            AccountType::Investment => (5_000.0, 1_000_000.0),
            AccountType::Loan => (-50_000.0, -1_000.0),
            AccountType::Credit => (-15_000.0, 0.0),
        };
        BalanceRange { min, max }
    }

    /// Relative frequency when drawing a random account type (sums to 100)
    pub fn weight(&self) -> u32 {
        match self {
            AccountType::Checking => 40,
            AccountType::Savings => 25,
            AccountType::Investment => 10,
            AccountType::Loan => 10,
            AccountType::Credit => 15,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// ACCOUNT ENTITY
// ============================================================================

/// Account Entity
///
/// Identity: UUID (never changes)
/// Relationship: customer_id → Customer entity (foreign key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Stable identity (UUID)
    pub id: String,

    /// 12-digit account number
    pub account_number: String,

    pub account_type: AccountType,

    /// Signed balance in `currency`, rounded to cents
    pub balance: f64,

    /// Currency (ISO 4217 code)
    pub currency: String,

    /// Customer ID (foreign key to Customer entity)
    pub customer_id: String,

    pub created_at: DateTime<Utc>,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_type_round_trip_names() {
        for account_type in AccountType::ALL {
            assert_eq!(AccountType::parse(account_type.as_str()), Some(account_type));
        }
        assert_eq!(AccountType::parse("loan"), Some(AccountType::Loan));
        assert_eq!(AccountType::parse("mortgage"), None);
    }

    #[test]
    fn test_loan_range_is_negative() {
        let range = AccountType::Loan.balance_range();
        assert!(range.max < 0.0);
        assert!(range.contains(-50_000.0));
        assert!(range.contains(-1_000.0));
        assert!(!range.contains(0.0));
    }

    #[test]
    fn test_weights_sum_to_100() {
        let total: u32 = AccountType::ALL.iter().map(|t| t.weight()).sum();
        assert_eq!(total, 100);
    }
}
