//! Repository module
//!
//! Raw-SQL data access for the `accounts` and `transfers` tables. Locking
//! reads and multi-row writes take an open `sqlx::Transaction` so the caller
//! owns the unit-of-work boundary.

mod account;
mod transfer;

pub use account::{AccountRepository, NewAccount};
pub use transfer::{NewTransfer, TransferRepository};

/// True when `err` is a unique-constraint violation on `constraint`.
pub fn violates_unique(err: &sqlx::Error, constraint: &str) -> bool {
    match err {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() && db.constraint() == Some(constraint)
        }
        _ => false,
    }
}
