//! Command definitions
//!
//! Commands represent intentions to change the system state.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::IdempotencyKey;

/// Command to create a new account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateAccountCommand {
    pub name: String,
    pub iban: String,
    pub initial_amount: Option<Decimal>,
}

impl CreateAccountCommand {
    pub fn new(name: impl Into<String>, iban: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            iban: iban.into(),
            initial_amount: None,
        }
    }

    pub fn with_initial_amount(mut self, amount: Decimal) -> Self {
        self.initial_amount = Some(amount);
        self
    }
}

/// Command to update an existing account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateAccountCommand {
    pub name: String,
    pub iban: String,
    pub available_amount: Decimal,
}

/// Command to move funds between two accounts
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferCommand {
    pub from_account_id: i64,
    pub to_account_id: i64,
    pub amount: Decimal,
    /// None means the caller did not request deduplication
    pub idempotency_key: Option<IdempotencyKey>,
}

impl TransferCommand {
    pub fn new(from_account_id: i64, to_account_id: i64, amount: Decimal) -> Self {
        Self {
            from_account_id,
            to_account_id,
            amount,
            idempotency_key: None,
        }
    }

    pub fn with_idempotency_key(mut self, key: IdempotencyKey) -> Self {
        self.idempotency_key = Some(key);
        self
    }
}
