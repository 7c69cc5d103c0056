//! Transfer Repository
//!
//! Append-only storage of ledger rows. The partial unique index
//! `uk_transfers_idem` on (account_id, idempotency_key, type) is what makes
//! idempotent retries safe: a raced duplicate insert fails here and the
//! engine recovers by re-reading the winner's row.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{IdempotencyKey, Transfer, TransferType};

/// Row tuple as selected from the `transfers` table
type TransferRow = (
    i64,
    i64,
    i64,
    String,
    Decimal,
    Option<String>,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn map_row(
    (id, account_id, beneficiary_account_id, transfer_type, amount, idempotency_key, created_on, modified_on): TransferRow,
) -> Transfer {
    Transfer {
        id,
        account_id,
        beneficiary_account_id,
        transfer_type: TransferType::from(transfer_type),
        amount,
        // Stored keys were validated non-blank on the way in
        idempotency_key: idempotency_key.and_then(|k| IdempotencyKey::new(k).ok()),
        created_on,
        modified_on,
    }
}

const SELECT_COLUMNS: &str =
    "id, account_id, beneficiary_account_id, type, amount, idempotency_key, created_on, modified_on";

/// One leg of a ledger pair, before the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct NewTransfer {
    pub account_id: i64,
    pub beneficiary_account_id: i64,
    pub transfer_type: TransferType,
    pub amount: Decimal,
    pub idempotency_key: Option<IdempotencyKey>,
}

/// Repository for ledger rows
#[derive(Debug, Clone)]
pub struct TransferRepository {
    pool: PgPool,
}

impl TransferRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Look up a prior leg by the idempotency triple. Used for the replay
    /// fast path and for duplicate-insert recovery.
    pub async fn find_by_account_key_and_type(
        &self,
        account_id: i64,
        key: &IdempotencyKey,
        transfer_type: TransferType,
    ) -> Result<Option<Transfer>, sqlx::Error> {
        let row: Option<TransferRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM transfers
            WHERE account_id = $1 AND idempotency_key = $2 AND type = $3
            "#
        ))
        .bind(account_id)
        .bind(key.as_str())
        .bind(transfer_type.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    /// Insert one leg inside the caller's transaction.
    ///
    /// A unique violation on `uk_transfers_idem` surfaces as the raw
    /// `sqlx::Error`; the transfer handler decides whether it is a
    /// legitimate replay or a genuine conflict.
    pub async fn insert(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        new: &NewTransfer,
    ) -> Result<Transfer, sqlx::Error> {
        let row: TransferRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO transfers (account_id, beneficiary_account_id, type, amount, idempotency_key)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(new.account_id)
        .bind(new.beneficiary_account_id)
        .bind(new.transfer_type.to_string())
        .bind(new.amount)
        .bind(new.idempotency_key.as_ref().map(|k| k.as_str()))
        .fetch_one(&mut **tx)
        .await?;

        Ok(map_row(row))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Transfer>, sqlx::Error> {
        let row: Option<TransferRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM transfers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    pub async fn list(&self) -> Result<Vec<Transfer>, sqlx::Error> {
        let rows: Vec<TransferRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM transfers ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_row).collect())
    }

    /// All legs where the account is owner or beneficiary, newest first.
    pub async fn list_by_account(&self, account_id: i64) -> Result<Vec<Transfer>, sqlx::Error> {
        let rows: Vec<TransferRow> = sqlx::query_as(&format!(
            r#"
            SELECT {SELECT_COLUMNS} FROM transfers
            WHERE account_id = $1 OR beneficiary_account_id = $1
            ORDER BY created_on DESC, id DESC
            "#
        ))
        .bind(account_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_row).collect())
    }

    /// True when any ledger row references the account on either side.
    pub async fn exists_for_account(&self, account_id: i64) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT EXISTS (
                SELECT 1 FROM transfers
                WHERE account_id = $1 OR beneficiary_account_id = $1
            )
            "#,
        )
        .bind(account_id)
        .fetch_one(&self.pool)
        .await
    }
}
