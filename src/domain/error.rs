//! Domain Error Types
//!
//! Pure domain errors that don't depend on infrastructure.

use thiserror::Error;

/// Business rule violations and domain invariant failures.
///
/// These are independent of the web/infrastructure layer; callers branch on
/// the kind rather than parsing messages.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomainError {
    /// Transfer to the same account
    #[error("Cannot transfer to the same account")]
    SameAccountTransfer,

    /// Invalid amount (missing, non-positive, or wrong scale)
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// Account not found
    #[error("Account not found with id: {0}")]
    AccountNotFound(i64),

    /// Ledger entry not found
    #[error("Transfer not found with id: {0}")]
    TransferNotFound(i64),

    /// Source account of a transfer is frozen
    #[error("Source account is frozen")]
    SourceFrozen,

    /// Destination account of a transfer is frozen
    #[error("Destination account is frozen")]
    DestinationFrozen,

    /// Source balance does not cover the transfer amount
    #[error("Insufficient funds in source account: required {required}, available {available}")]
    InsufficientFunds {
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    },

    /// Duplicate ledger insert without an idempotency key to recover via
    #[error("Duplicate ledger entry for an idempotency key that was not supplied")]
    StorageConflict,

    /// Account name already in use
    #[error("Account with name '{0}' already exists")]
    NameTaken(String),

    /// Account IBAN already in use
    #[error("Account with IBAN '{0}' already exists")]
    IbanTaken(String),

    /// Account still referenced by ledger rows
    #[error("Account {0} has ledger entries and cannot be deleted")]
    AccountInUse(i64),

    /// Malformed lifecycle input (blank name, bad IBAN shape, ...)
    #[error("{0}")]
    Validation(String),
}

impl DomainError {
    pub fn insufficient_funds(
        required: rust_decimal::Decimal,
        available: rust_decimal::Decimal,
    ) -> Self {
        Self::InsufficientFunds {
            required,
            available,
        }
    }

    /// Client errors: bad input or a business rule said no. Retrying the
    /// identical request cannot succeed.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::SameAccountTransfer
                | Self::InvalidAmount(_)
                | Self::SourceFrozen
                | Self::DestinationFrozen
                | Self::InsufficientFunds { .. }
                | Self::NameTaken(_)
                | Self::IbanTaken(_)
                | Self::AccountInUse(_)
                | Self::Validation(_)
        )
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::AccountNotFound(_) | Self::TransferNotFound(_))
    }

    /// Conflict errors: an unexpected duplicate surfaced from storage.
    pub fn is_conflict_error(&self) -> bool {
        matches!(self, Self::StorageConflict)
    }
}
