//! bank-service Library
//!
//! Re-exports modules for integration testing and external use.

pub mod api;
pub mod domain;
pub mod handlers;
pub mod repository;

// Private modules (used only by main.rs binary)
pub mod config;
pub mod db;
mod error;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use domain::{Account, AccountStatus, Amount, AmountError, Balance, DomainError};
pub use domain::{IdempotencyKey, Transfer, TransferType};
