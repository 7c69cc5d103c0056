//! Command Handlers module
//!
//! Handlers orchestrate business operations over the repositories. The
//! transfer handler is the only one with concurrency hazards.

mod account_handler;
mod commands;
mod transfer_handler;

pub use account_handler::AccountHandler;
pub use commands::*;
pub use transfer_handler::TransferHandler;
