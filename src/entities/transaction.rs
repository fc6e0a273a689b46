// 💸 Transaction Entity - owned by an Account
//
// Amounts are always positive; the direction of the money movement is carried
// by the transaction type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransactionType {
    Deposit,
    Withdrawal,
    Transfer,
    Payment,
    Fee,
    Interest,
}

impl TransactionType {
    pub const ALL: [TransactionType; 6] = [
        TransactionType::Deposit,
        TransactionType::Withdrawal,
        TransactionType::Transfer,
        TransactionType::Payment,
        TransactionType::Fee,
        TransactionType::Interest,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionType::Deposit => "DEPOSIT",
            TransactionType::Withdrawal => "WITHDRAWAL",
            TransactionType::Transfer => "TRANSFER",
            TransactionType::Payment => "PAYMENT",
            TransactionType::Fee => "FEE",
            TransactionType::Interest => "INTEREST",
        }
    }

    /// Money flows into the account
    pub fn is_credit(&self) -> bool {
        matches!(self, TransactionType::Deposit | TransactionType::Interest)
    }

    /// Inclusive amount bounds used by the generator
    pub fn amount_range(&self) -> (f64, f64) {
        match self {
            TransactionType::Deposit => (10.0, 10_000.0),
            TransactionType::Withdrawal => (20.0, 2_000.0),
            TransactionType::Transfer => (50.0, 15_000.0),
            TransactionType::Payment => (5.0, 3_000.0),
            TransactionType::Fee => (1.0, 75.0),
            TransactionType::Interest => (0.5, 500.0),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction Entity
///
/// Relationship: account_id → Account entity (foreign key)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,

    /// Account ID (foreign key to Account entity)
    pub account_id: String,

    /// Positive amount, rounded to cents
    pub amount: f64,

    pub transaction_type: TransactionType,

    pub description: String,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the sign implied by the transaction type
    pub fn signed_amount(&self) -> f64 {
        if self.transaction_type.is_credit() {
            self.amount
        } else {
            -self.amount
        }
    }
}
