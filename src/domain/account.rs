//! Account model
//!
//! Current-state row for a named account. Balances are only ever mutated
//! under an exclusive row lock (see the transfer handler).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Account lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountStatus {
    Active,
    Frozen,
}

impl From<String> for AccountStatus {
    fn from(s: String) -> Self {
        match s.as_str() {
            "FROZEN" => AccountStatus::Frozen,
            _ => AccountStatus::Active,
        }
    }
}

impl fmt::Display for AccountStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccountStatus::Active => write!(f, "ACTIVE"),
            AccountStatus::Frozen => write!(f, "FROZEN"),
        }
    }
}

/// Account row as stored in the `accounts` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub name: String,
    pub iban: String,
    pub status: AccountStatus,
    pub available_amount: Decimal,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}

impl Account {
    /// True when the account can participate in transfers
    pub fn is_active(&self) -> bool {
        self.status == AccountStatus::Active
    }
}

/// Validate the IBAN shape: two uppercase letters, two digits, then
/// 1 to 30 alphanumeric characters.
pub fn is_valid_iban(iban: &str) -> bool {
    let bytes = iban.as_bytes();
    if !(5..=34).contains(&bytes.len()) {
        return false;
    }
    bytes[..2].iter().all(|b| b.is_ascii_uppercase())
        && bytes[2..4].iter().all(|b| b.is_ascii_digit())
        && bytes[4..]
            .iter()
            .all(|b| b.is_ascii_uppercase() || b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_roundtrip() {
        assert_eq!(AccountStatus::from("ACTIVE".to_string()), AccountStatus::Active);
        assert_eq!(AccountStatus::from("FROZEN".to_string()), AccountStatus::Frozen);
        assert_eq!(AccountStatus::Active.to_string(), "ACTIVE");
        assert_eq!(AccountStatus::Frozen.to_string(), "FROZEN");
    }

    #[test]
    fn test_status_unknown_defaults_to_active() {
        assert_eq!(AccountStatus::from("???".to_string()), AccountStatus::Active);
    }

    #[test]
    fn test_status_serde() {
        let json = serde_json::to_string(&AccountStatus::Frozen).unwrap();
        assert_eq!(json, "\"FROZEN\"");
        let parsed: AccountStatus = serde_json::from_str("\"ACTIVE\"").unwrap();
        assert_eq!(parsed, AccountStatus::Active);
    }

    #[test]
    fn test_valid_iban() {
        assert!(is_valid_iban("BG80BNBG96611020345678"));
        assert!(is_valid_iban("DE44500105175407324931"));
    }

    #[test]
    fn test_invalid_iban() {
        assert!(!is_valid_iban(""));
        assert!(!is_valid_iban("BG80"));
        assert!(!is_valid_iban("bg80bnbg96611020345678"));
        assert!(!is_valid_iban("B8G0BNBG96611020345678"));
        assert!(!is_valid_iban("BG80BNBG9661-020345678"));
        // 31 characters after the check digits
        assert!(!is_valid_iban("BG80BNBG966110203456789012345678901"));
    }
}
