//! Transfer (ledger entry) model
//!
//! Ledger rows are append-only; a committed transfer is exactly one DEBIT
//! row on the source account and one CREDIT row on the destination, with
//! identical amount and idempotency key.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which side of the ledger pair a row represents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransferType {
    Debit,
    Credit,
}

impl From<String> for TransferType {
    fn from(s: String) -> Self {
        match s.as_str() {
            "CREDIT" => TransferType::Credit,
            _ => TransferType::Debit,
        }
    }
}

impl fmt::Display for TransferType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransferType::Debit => write!(f, "DEBIT"),
            TransferType::Credit => write!(f, "CREDIT"),
        }
    }
}

/// Caller-supplied deduplication token.
///
/// Modeled as a newtype so "no dedup requested" (`None`) is distinct from
/// an empty or whitespace string, which is rejected at construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct IdempotencyKey(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Idempotency key must not be blank")]
pub struct BlankIdempotencyKey;

impl IdempotencyKey {
    pub fn new(key: impl Into<String>) -> Result<Self, BlankIdempotencyKey> {
        let key = key.into();
        let trimmed = key.trim();
        if trimmed.is_empty() {
            return Err(BlankIdempotencyKey);
        }
        Ok(Self(trimmed.to_string()))
    }

    /// Parse an optional header value: absent or blank means no dedup.
    pub fn from_header(value: Option<&str>) -> Option<Self> {
        value.and_then(|v| Self::new(v).ok())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for IdempotencyKey {
    type Err = BlankIdempotencyKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for IdempotencyKey {
    type Error = BlankIdempotencyKey;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<IdempotencyKey> for String {
    fn from(key: IdempotencyKey) -> Self {
        key.0
    }
}

impl fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ledger row as stored in the `transfers` table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transfer {
    pub id: i64,
    pub account_id: i64,
    pub beneficiary_account_id: i64,
    #[serde(rename = "type")]
    pub transfer_type: TransferType,
    pub amount: Decimal,
    pub idempotency_key: Option<IdempotencyKey>,
    pub created_on: DateTime<Utc>,
    pub modified_on: DateTime<Utc>,
}
