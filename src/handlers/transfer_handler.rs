//! Transfer Handler
//!
//! The transfer engine: idempotency short-circuit, deterministic two-account
//! locking, business-rule validation, balance mutation, and persistence of
//! the double-entry ledger pair as one unit of work.

use sqlx::{PgPool, Postgres, Transaction};

use crate::domain::{Amount, Balance, DomainError, Transfer, TransferType};
use crate::error::AppError;
use crate::repository::{
    violates_unique, AccountRepository, NewTransfer, TransferRepository,
};

use super::TransferCommand;

/// Name of the partial unique index on (account_id, idempotency_key, type)
const IDEMPOTENCY_CONSTRAINT: &str = "uk_transfers_idem";

/// Lock order for a pair of account rows: always ascending id, regardless
/// of which side is the source. This is the sole deadlock-avoidance rule
/// for transfers that touch the same pair in opposite directions.
fn lock_order(a: i64, b: i64) -> (i64, i64) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Handler for money transfers between accounts
#[derive(Debug, Clone)]
pub struct TransferHandler {
    accounts: AccountRepository,
    transfers: TransferRepository,
    pool: PgPool,
}

impl TransferHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            transfers: TransferRepository::new(pool.clone()),
            pool,
        }
    }

    /// Execute the transfer command.
    ///
    /// Returns the DEBIT leg of the ledger pair; on an idempotent replay,
    /// the previously committed DEBIT leg. Every failure after lock
    /// acquisition rolls back, leaving no persisted side effect.
    pub async fn execute(&self, command: TransferCommand) -> Result<Transfer, AppError> {
        // Fail-fast checks that need no account state
        if command.from_account_id == command.to_account_id {
            return Err(DomainError::SameAccountTransfer.into());
        }

        let amount = Amount::new(command.amount)
            .map_err(|e| DomainError::InvalidAmount(e.to_string()))?;

        // Idempotency fast path: a retransmitted request returns the prior
        // DEBIT row without taking locks or writing anything.
        if let Some(key) = &command.idempotency_key {
            if let Some(prior) = self
                .transfers
                .find_by_account_key_and_type(
                    command.from_account_id,
                    key,
                    TransferType::Debit,
                )
                .await?
            {
                tracing::debug!(
                    transfer_id = prior.id,
                    idempotency_key = %key,
                    "Replayed transfer served from ledger"
                );
                return Ok(prior);
            }
        }

        let mut tx = self.pool.begin().await?;

        let (first_id, second_id) = lock_order(command.from_account_id, command.to_account_id);
        let first = self
            .accounts
            .lock_for_update(&mut tx, first_id)
            .await?
            .ok_or(DomainError::AccountNotFound(first_id))?;
        let second = self
            .accounts
            .lock_for_update(&mut tx, second_id)
            .await?
            .ok_or(DomainError::AccountNotFound(second_id))?;

        let (from_account, to_account) = if command.from_account_id == first_id {
            (first, second)
        } else {
            (second, first)
        };

        // Validate against the freshly locked rows; earlier reads may be stale
        if !from_account.is_active() {
            return Err(DomainError::SourceFrozen.into());
        }
        if !to_account.is_active() {
            return Err(DomainError::DestinationFrozen.into());
        }

        let source = Balance::new(from_account.available_amount)
            .map_err(|e| AppError::Internal(format!("corrupt balance on account {}: {e}", from_account.id)))?;
        let destination = Balance::new(to_account.available_amount)
            .map_err(|e| AppError::Internal(format!("corrupt balance on account {}: {e}", to_account.id)))?;

        if !source.is_sufficient_for(&amount) {
            return Err(DomainError::insufficient_funds(
                amount.value(),
                source.value(),
            )
            .into());
        }

        let source = source
            .debit(&amount)
            .map_err(|e| AppError::Internal(e.to_string()))?;
        let destination = destination
            .credit(&amount)
            .map_err(|e| AppError::Internal(e.to_string()))?;

        let debit_leg = NewTransfer {
            account_id: from_account.id,
            beneficiary_account_id: to_account.id,
            transfer_type: TransferType::Debit,
            amount: amount.value(),
            idempotency_key: command.idempotency_key.clone(),
        };
        let credit_leg = NewTransfer {
            account_id: to_account.id,
            beneficiary_account_id: from_account.id,
            transfer_type: TransferType::Credit,
            amount: amount.value(),
            idempotency_key: command.idempotency_key.clone(),
        };

        match self
            .persist_pair(tx, &debit_leg, &credit_leg, source, destination)
            .await
        {
            Ok(debit_row) => {
                tracing::info!(
                    transfer_id = debit_row.id,
                    from_account_id = from_account.id,
                    to_account_id = to_account.id,
                    amount = %amount,
                    "Transfer committed"
                );
                Ok(debit_row)
            }
            Err(err) if violates_unique(&err, IDEMPOTENCY_CONSTRAINT) => {
                self.recover_duplicate(&command, err).await
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Insert both legs and write both balances, then commit. The
    /// transaction rolls back on drop if any step fails.
    async fn persist_pair(
        &self,
        mut tx: Transaction<'_, Postgres>,
        debit_leg: &NewTransfer,
        credit_leg: &NewTransfer,
        source: Balance,
        destination: Balance,
    ) -> Result<Transfer, sqlx::Error> {
        let debit_row = self.transfers.insert(&mut tx, debit_leg).await?;
        self.transfers.insert(&mut tx, credit_leg).await?;
        self.accounts
            .save_balance(&mut tx, debit_leg.account_id, source.value())
            .await?;
        self.accounts
            .save_balance(&mut tx, credit_leg.account_id, destination.value())
            .await?;
        tx.commit().await?;

        Ok(debit_row)
    }

    /// A concurrent caller won the race to insert the same idempotency key.
    ///
    /// Both legs carry the same key, so a violation on either leg implies
    /// the same prior transfer; answer it with the winner's DEBIT row. With
    /// no key (or no row to recover) the conflict is a genuine anomaly.
    async fn recover_duplicate(
        &self,
        command: &TransferCommand,
        err: sqlx::Error,
    ) -> Result<Transfer, AppError> {
        if let Some(key) = &command.idempotency_key {
            tracing::warn!(
                from_account_id = command.from_account_id,
                idempotency_key = %key,
                "Lost duplicate-insert race, recovering prior transfer"
            );
            if let Some(prior) = self
                .transfers
                .find_by_account_key_and_type(
                    command.from_account_id,
                    key,
                    TransferType::Debit,
                )
                .await?
            {
                return Ok(prior);
            }
        }

        // No key to recover via, or nothing to recover: a genuine anomaly
        tracing::error!(
            from_account_id = command.from_account_id,
            error = %err,
            "Unrecovered duplicate ledger insert"
        );
        Err(DomainError::StorageConflict.into())
    }
}
