//! Domain module
//!
//! Validated domain primitives, row models, and business-rule errors.

mod account;
mod amount;
mod error;
mod transfer;

pub use account::{is_valid_iban, Account, AccountStatus};
pub use amount::{Amount, AmountError, Balance};
pub use error::DomainError;
pub use transfer::{BlankIdempotencyKey, IdempotencyKey, Transfer, TransferType};
