//! Account Repository
//!
//! Keyed storage of account rows. `lock_for_update` is the exclusive-lock
//! read the transfer engine builds on; the lock is held until the caller's
//! transaction ends.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{Account, AccountStatus};

/// Row tuple as selected from the `accounts` table
type AccountRow = (
    i64,
    String,
    String,
    String,
    Decimal,
    DateTime<Utc>,
    DateTime<Utc>,
);

fn map_row(
    (id, name, iban, status, available_amount, created_on, modified_on): AccountRow,
) -> Account {
    Account {
        id,
        name,
        iban,
        status: AccountStatus::from(status),
        available_amount,
        created_on,
        modified_on,
    }
}

const SELECT_COLUMNS: &str = "id, name, iban, status, available_amount, created_on, modified_on";

/// Fields supplied by the caller on insert; id and timestamps are
/// store-assigned.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub iban: String,
    pub status: AccountStatus,
    pub available_amount: Decimal,
}

/// Repository for account rows
#[derive(Debug, Clone)]
pub struct AccountRepository {
    pool: PgPool,
}

impl AccountRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Read a row with an exclusive lock (`SELECT ... FOR UPDATE`).
    ///
    /// Blocks until any other transaction holding the same row lock commits
    /// or rolls back. Callers locking two accounts must lock in ascending
    /// id order; violating that invites a deadlock.
    pub async fn lock_for_update(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
    ) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut **tx)
        .await?;

        Ok(row.map(map_row))
    }

    /// Write a locked account's balance inside the caller's transaction.
    pub async fn save_balance(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        id: i64,
        available_amount: Decimal,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET available_amount = $2, modified_on = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(available_amount)
        .execute(&mut **tx)
        .await?;

        Ok(())
    }

    /// Insert a new account; the store assigns id and timestamps.
    ///
    /// Generic over the executor so batch creation can run every insert in
    /// one transaction.
    pub async fn insert<'e, E>(&self, executor: E, new: &NewAccount) -> Result<Account, sqlx::Error>
    where
        E: sqlx::PgExecutor<'e>,
    {
        let row: AccountRow = sqlx::query_as(&format!(
            r#"
            INSERT INTO accounts (name, iban, status, available_amount)
            VALUES ($1, $2, $3, $4)
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(&new.name)
        .bind(&new.iban)
        .bind(new.status.to_string())
        .bind(new.available_amount)
        .fetch_one(executor)
        .await?;

        Ok(map_row(row))
    }

    /// Update name, iban and balance of an existing account.
    pub async fn update(&self, account: &Account) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            r#"
            UPDATE accounts
            SET name = $2, iban = $3, available_amount = $4, modified_on = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(account.id)
        .bind(&account.name)
        .bind(&account.iban)
        .bind(account.available_amount)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    /// Flip the lifecycle status (freeze/unfreeze).
    pub async fn set_status(
        &self,
        id: i64,
        status: AccountStatus,
    ) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            r#"
            UPDATE accounts
            SET status = $2, modified_on = NOW()
            WHERE id = $1
            RETURNING {SELECT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(status.to_string())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    pub async fn find_by_id(&self, id: i64) -> Result<Option<Account>, sqlx::Error> {
        let row: Option<AccountRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(map_row))
    }

    pub async fn list(&self) -> Result<Vec<Account>, sqlx::Error> {
        let rows: Vec<AccountRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM accounts ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(map_row).collect())
    }

    pub async fn exists_by_name(&self, name: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE name = $1)")
            .bind(name)
            .fetch_one(&self.pool)
            .await
    }

    pub async fn exists_by_iban(&self, iban: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM accounts WHERE iban = $1)")
            .bind(iban)
            .fetch_one(&self.pool)
            .await
    }

    /// Delete an account row; returns false when no row matched.
    pub async fn delete(&self, id: i64) -> Result<bool, sqlx::Error> {
        let rows = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(rows > 0)
    }
}
