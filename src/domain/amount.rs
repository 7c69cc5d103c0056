//! Amount type
//!
//! Domain primitive for monetary amounts with business rule validation.
//! All amounts are validated at construction time, ensuring invalid values
//! cannot exist in the system.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Largest value storable in a NUMERIC(19, 2) column
const MAX_AMOUNT: &str = "99999999999999999.99";

/// Maximum decimal places (cents)
const MAX_SCALE: u32 = 2;

/// Amount represents a validated transfer amount.
///
/// # Invariants
/// - Value is always positive (> 0)
/// - Maximum 2 decimal places
/// - Fits in a NUMERIC(19, 2) column
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Amount(Decimal);

/// Errors that can occur when creating an Amount or Balance
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AmountError {
    #[error("Amount must be positive (got {0})")]
    NotPositive(Decimal),

    #[error("Amount has too many decimal places (max {MAX_SCALE}, got {0})")]
    TooManyDecimals(u32),

    #[error("Amount exceeds maximum allowed value ({MAX_AMOUNT})")]
    Overflow,

    #[error("Balance must not be negative (got {0})")]
    Negative(Decimal),

    #[error("Invalid amount format: {0}")]
    ParseError(String),
}

impl Amount {
    /// Create a new Amount with validation.
    ///
    /// # Errors
    /// - `AmountError::NotPositive` if value <= 0
    /// - `AmountError::TooManyDecimals` if more than 2 decimal places
    /// - `AmountError::Overflow` if value exceeds the column bound
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value <= Decimal::ZERO {
            return Err(AmountError::NotPositive(value));
        }

        // Normalize first: 10.100 carries scale 3 but is a valid cent amount
        let value = value.normalize();
        if value.scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(value.scale()));
        }

        let max = Decimal::from_str(MAX_AMOUNT).expect("Invalid MAX_AMOUNT constant");
        if value > max {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Get the underlying Decimal value.
    pub fn value(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl FromStr for Amount {
    type Err = AmountError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let decimal = Decimal::from_str(s.trim())
            .map_err(|e| AmountError::ParseError(e.to_string()))?;
        Amount::new(decimal)
    }
}

impl TryFrom<String> for Amount {
    type Error = AmountError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Amount::from_str(&value)
    }
}

impl From<Amount> for String {
    fn from(amount: Amount) -> Self {
        format!("{:.2}", amount.0)
    }
}

// Note: We don't implement Add/Sub on Amount; balance arithmetic goes
// through Balance so the non-negative floor is checked in one place.

/// Balance represents an account balance (can be zero or positive).
/// Unlike Amount, Balance can be zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Balance(Decimal);

impl Balance {
    /// Create a new balance (zero or positive)
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value < Decimal::ZERO {
            return Err(AmountError::Negative(value));
        }

        let value = value.normalize();
        if value.scale() > MAX_SCALE {
            return Err(AmountError::TooManyDecimals(value.scale()));
        }

        let max = Decimal::from_str(MAX_AMOUNT).expect("Invalid MAX_AMOUNT constant");
        if value > max {
            return Err(AmountError::Overflow);
        }

        Ok(Self(value))
    }

    /// Create a zero balance
    pub fn zero() -> Self {
        Self(Decimal::ZERO)
    }

    /// Get the underlying value
    pub fn value(&self) -> Decimal {
        self.0
    }

    /// Check if balance covers a withdrawal of `amount`
    pub fn is_sufficient_for(&self, amount: &Amount) -> bool {
        self.0 >= amount.value()
    }

    /// Add amount to balance
    pub fn credit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        Balance::new(self.0 + amount.value())
    }

    /// Subtract amount from balance
    pub fn debit(&self, amount: &Amount) -> Result<Balance, AmountError> {
        Balance::new(self.0 - amount.value())
    }
}

impl fmt::Display for Balance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

impl Default for Balance {
    fn default() -> Self {
        Self::zero()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_positive() {
        let amount = Amount::new(Decimal::new(100, 0));
        assert!(amount.is_ok());
        assert_eq!(amount.unwrap().value(), Decimal::new(100, 0));
    }

    #[test]
    fn test_amount_zero_rejected() {
        let amount = Amount::new(Decimal::ZERO);
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_negative_rejected() {
        let amount = Amount::new(Decimal::new(-100, 0));
        assert!(matches!(amount, Err(AmountError::NotPositive(_))));
    }

    #[test]
    fn test_amount_too_many_decimals() {
        // 0.125 has 3 decimal places
        let amount = Amount::new(Decimal::new(125, 3));
        assert!(matches!(amount, Err(AmountError::TooManyDecimals(3))));
    }

    #[test]
    fn test_amount_max_decimals_ok() {
        // 0.25 has 2 decimal places
        let amount = Amount::new(Decimal::new(25, 2));
        assert!(amount.is_ok());
    }

    #[test]
    fn test_amount_trailing_zeros_ok() {
        // 10.100 carries scale 3 but normalizes to 10.1
        let amount = Amount::new(Decimal::new(10100, 3));
        assert!(amount.is_ok());
        assert_eq!(amount.unwrap().to_string(), "10.10");
    }

    #[test]
    fn test_amount_overflow() {
        let value = Decimal::from_str("100000000000000000.00").unwrap();
        let amount = Amount::new(value);
        assert!(matches!(amount, Err(AmountError::Overflow)));
    }

    #[test]
    fn test_amount_from_str() {
        let amount: Result<Amount, _> = "123.45".parse();
        assert!(amount.is_ok());
        assert_eq!(amount.unwrap().value(), Decimal::new(12345, 2));
    }

    #[test]
    fn test_amount_from_str_garbage() {
        let amount: Result<Amount, _> = "12,50".parse();
        assert!(matches!(amount, Err(AmountError::ParseError(_))));
    }

    #[test]
    fn test_balance_credit_debit() {
        let balance = Balance::zero();
        let amount = Amount::new(Decimal::new(100, 0)).unwrap();

        // Credit
        let balance = balance.credit(&amount).unwrap();
        assert_eq!(balance.value(), Decimal::new(100, 0));

        // Debit
        let withdraw = Amount::new(Decimal::new(30, 0)).unwrap();
        let balance = balance.debit(&withdraw).unwrap();
        assert_eq!(balance.value(), Decimal::new(70, 0));
    }

    #[test]
    fn test_balance_negative_rejected() {
        let balance = Balance::new(Decimal::new(-1, 2));
        assert!(matches!(balance, Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_balance_insufficient() {
        let balance = Balance::new(Decimal::new(50, 0)).unwrap();
        let amount = Amount::new(Decimal::new(100, 0)).unwrap();

        assert!(!balance.is_sufficient_for(&amount));

        let result = balance.debit(&amount);
        assert!(matches!(result, Err(AmountError::Negative(_))));
    }

    #[test]
    fn test_balance_conservation() {
        let a = Balance::new(Decimal::new(10000, 2)).unwrap();
        let b = Balance::new(Decimal::new(5000, 2)).unwrap();
        let amount = Amount::new(Decimal::new(2500, 2)).unwrap();

        let a_after = a.debit(&amount).unwrap();
        let b_after = b.credit(&amount).unwrap();

        assert_eq!(a.value() + b.value(), a_after.value() + b_after.value());
    }
}
