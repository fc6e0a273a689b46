// 👤 Customer Entity - root of the generated graph
// Customers have no parent; every Account points at one of them.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Customer Entity
///
/// Identity: UUID string (never changes)
/// Values: name, contact fields, date of birth
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    /// Stable identity (UUID)
    pub id: String,

    pub first_name: String,
    pub last_name: String,

    /// Unique per customer (derived from name + id prefix)
    pub email: String,

    /// Phone in `+1-XXX-XXX-XXXX` form
    pub phone: String,

    /// Street address, city and state on one line
    pub address: String,

    pub date_of_birth: NaiveDate,

    /// System time: when this record was created
    pub created_at: DateTime<Utc>,
}

impl Customer {
    /// Age in whole years at the given date
    pub fn age_at(&self, date: NaiveDate) -> i32 {
        use chrono::Datelike;

        let mut age = date.year() - self.date_of_birth.year();
        if (date.month(), date.day()) < (self.date_of_birth.month(), self.date_of_birth.day()) {
            age -= 1;
        }
        age
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_customer(date_of_birth: NaiveDate) -> Customer {
        Customer {
            id: uuid::Uuid::new_v4().to_string(),
            first_name: "Ada".to_string(),
            last_name: "Lovelace".to_string(),
            email: "ada.lovelace@example.com".to_string(),
            phone: "+1-555-010-0000".to_string(),
            address: "1 Analytical Way, London, NY".to_string(),
            date_of_birth,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_age_before_and_after_birthday() {
        let customer = create_test_customer(NaiveDate::from_ymd_opt(1990, 6, 15).unwrap());

        assert_eq!(customer.age_at(NaiveDate::from_ymd_opt(2020, 6, 14).unwrap()), 29);
        assert_eq!(customer.age_at(NaiveDate::from_ymd_opt(2020, 6, 15).unwrap()), 30);
    }
}
