//! Account Handler
//!
//! Account lifecycle: create, batch create, update, freeze/unfreeze,
//! delete, and the optional demo seed. No concurrency subtlety lives here;
//! balance mutation under load is the transfer handler's job.

use std::collections::HashSet;

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::domain::{is_valid_iban, Account, AccountStatus, Balance, DomainError};
use crate::error::AppError;
use crate::repository::{violates_unique, AccountRepository, NewAccount, TransferRepository};

use super::{CreateAccountCommand, UpdateAccountCommand};

const NAME_CONSTRAINT: &str = "uk_accounts_name";
const IBAN_CONSTRAINT: &str = "uk_accounts_iban";

/// Handler for account lifecycle operations
#[derive(Debug, Clone)]
pub struct AccountHandler {
    accounts: AccountRepository,
    transfers: TransferRepository,
    pool: PgPool,
}

impl AccountHandler {
    pub fn new(pool: PgPool) -> Self {
        Self {
            accounts: AccountRepository::new(pool.clone()),
            transfers: TransferRepository::new(pool.clone()),
            pool,
        }
    }

    pub async fn list(&self) -> Result<Vec<Account>, AppError> {
        Ok(self.accounts.list().await?)
    }

    pub async fn get(&self, id: i64) -> Result<Account, AppError> {
        self.accounts
            .find_by_id(id)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(id).into())
    }

    /// Create a single account. Uniqueness is probed up front for a clean
    /// error; the DB constraint still decides a lost insert race.
    pub async fn create(&self, command: CreateAccountCommand) -> Result<Account, AppError> {
        let new = validate_new_account(&command)?;

        if self.accounts.exists_by_name(&new.name).await? {
            return Err(DomainError::NameTaken(new.name).into());
        }
        if self.accounts.exists_by_iban(&new.iban).await? {
            return Err(DomainError::IbanTaken(new.iban).into());
        }

        match self.accounts.insert(&self.pool, &new).await {
            Ok(account) => {
                tracing::info!(account_id = account.id, name = %account.name, "Account created");
                Ok(account)
            }
            Err(err) => Err(map_insert_conflict(err, &new)),
        }
    }

    /// Create several accounts as one all-or-nothing unit.
    pub async fn create_batch(
        &self,
        commands: Vec<CreateAccountCommand>,
    ) -> Result<Vec<Account>, AppError> {
        if commands.is_empty() {
            return Err(DomainError::Validation("No accounts provided".to_string()).into());
        }

        let mut names = HashSet::new();
        let mut ibans = HashSet::new();
        let mut rows = Vec::with_capacity(commands.len());

        for command in &commands {
            let new = validate_new_account(command)?;
            if !names.insert(new.name.clone()) {
                return Err(DomainError::Validation(format!(
                    "Duplicate account name in request: {}",
                    new.name
                ))
                .into());
            }
            if !ibans.insert(new.iban.clone()) {
                return Err(DomainError::Validation(format!(
                    "Duplicate IBAN in request: {}",
                    new.iban
                ))
                .into());
            }
            rows.push(new);
        }

        for new in &rows {
            if self.accounts.exists_by_name(&new.name).await? {
                return Err(DomainError::NameTaken(new.name.clone()).into());
            }
            if self.accounts.exists_by_iban(&new.iban).await? {
                return Err(DomainError::IbanTaken(new.iban.clone()).into());
            }
        }

        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(rows.len());
        for new in &rows {
            let account = self
                .accounts
                .insert(&mut *tx, new)
                .await
                .map_err(|err| map_insert_conflict(err, new))?;
            created.push(account);
        }
        tx.commit().await?;

        tracing::info!(count = created.len(), "Account batch created");
        Ok(created)
    }

    pub async fn update(
        &self,
        id: i64,
        command: UpdateAccountCommand,
    ) -> Result<Account, AppError> {
        let current = self.get(id).await?;

        let name = command.name.trim().to_string();
        let iban = command.iban.trim().to_string();
        if name.is_empty() {
            return Err(DomainError::Validation("Name is required".to_string()).into());
        }
        if !is_valid_iban(&iban) {
            return Err(DomainError::Validation("Invalid IBAN format".to_string()).into());
        }
        let balance = Balance::new(command.available_amount)
            .map_err(|e| DomainError::Validation(format!("Invalid available amount: {e}")))?;

        // Probe uniqueness only when the field actually changes
        if name != current.name && self.accounts.exists_by_name(&name).await? {
            return Err(DomainError::NameTaken(name).into());
        }
        if iban != current.iban && self.accounts.exists_by_iban(&iban).await? {
            return Err(DomainError::IbanTaken(iban).into());
        }

        let updated = Account {
            name,
            iban,
            available_amount: balance.value(),
            ..current
        };

        self.accounts
            .update(&updated)
            .await?
            .ok_or_else(|| DomainError::AccountNotFound(id).into())
    }

    pub async fn freeze(&self, id: i64) -> Result<Account, AppError> {
        self.set_status(id, AccountStatus::Frozen).await
    }

    pub async fn unfreeze(&self, id: i64) -> Result<Account, AppError> {
        self.set_status(id, AccountStatus::Active).await
    }

    async fn set_status(&self, id: i64, status: AccountStatus) -> Result<Account, AppError> {
        let account = self
            .accounts
            .set_status(id, status)
            .await?
            .ok_or(DomainError::AccountNotFound(id))?;

        tracing::info!(account_id = id, status = %status, "Account status changed");
        Ok(account)
    }

    /// Delete an account with no ledger history. Ledger rows are
    /// append-only and must keep both endpoints resolvable, so a referenced
    /// account cannot be removed.
    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        // Existence first, so an unknown id reports not-found rather than in-use
        self.get(id).await?;

        if self.transfers.exists_for_account(id).await? {
            return Err(DomainError::AccountInUse(id).into());
        }

        if !self.accounts.delete(id).await? {
            return Err(DomainError::AccountNotFound(id).into());
        }

        tracing::info!(account_id = id, "Account deleted");
        Ok(())
    }

    /// Insert the demo accounts. Only routed when ALLOW_SEED is set.
    pub async fn seed(&self) -> Result<Vec<Account>, AppError> {
        let batch = vec![
            CreateAccountCommand::new("Alice", "BG80BNBG96611020345678")
                .with_initial_amount(Decimal::new(100000, 2)),
            CreateAccountCommand::new("Bob", "BG10BNBG96611020345679")
                .with_initial_amount(Decimal::new(25000, 2)),
            CreateAccountCommand::new("Carol", "BG29BNBG96611020345680")
                .with_initial_amount(Decimal::new(50000, 2)),
        ];

        self.create_batch(batch).await
    }
}

/// Trim, shape-check and default a creation command into an insertable row.
fn validate_new_account(command: &CreateAccountCommand) -> Result<NewAccount, DomainError> {
    let name = command.name.trim().to_string();
    if name.is_empty() {
        return Err(DomainError::Validation("Name is required".to_string()));
    }

    let iban = command.iban.trim().to_string();
    if !is_valid_iban(&iban) {
        return Err(DomainError::Validation("Invalid IBAN format".to_string()));
    }

    let balance = match command.initial_amount {
        Some(value) => Balance::new(value).map_err(|e| {
            DomainError::Validation(format!("Initial amount must be >= 0 ({e})"))
        })?,
        None => Balance::zero(),
    };

    Ok(NewAccount {
        name,
        iban,
        status: AccountStatus::Active,
        available_amount: balance.value(),
    })
}

/// Map a lost uniqueness race at insert time onto the same errors the
/// up-front probes produce.
fn map_insert_conflict(err: sqlx::Error, new: &NewAccount) -> AppError {
    if violates_unique(&err, NAME_CONSTRAINT) {
        DomainError::NameTaken(new.name.clone()).into()
    } else if violates_unique(&err, IBAN_CONSTRAINT) {
        DomainError::IbanTaken(new.iban.clone()).into()
    } else {
        err.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_validate_new_account_trims_inputs() {
        let cmd = CreateAccountCommand::new("  Alice  ", " BG80BNBG96611020345678 ");
        let new = validate_new_account(&cmd).unwrap();
        assert_eq!(new.name, "Alice");
        assert_eq!(new.iban, "BG80BNBG96611020345678");
        assert_eq!(new.status, AccountStatus::Active);
        assert_eq!(new.available_amount, Decimal::ZERO);
    }

    #[test]
    fn test_validate_new_account_blank_name() {
        let cmd = CreateAccountCommand::new("   ", "BG80BNBG96611020345678");
        assert!(matches!(
            validate_new_account(&cmd),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_new_account_bad_iban() {
        let cmd = CreateAccountCommand::new("Alice", "not-an-iban");
        assert!(matches!(
            validate_new_account(&cmd),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_new_account_negative_initial() {
        let cmd = CreateAccountCommand::new("Alice", "BG80BNBG96611020345678")
            .with_initial_amount(dec!(-1.00));
        assert!(matches!(
            validate_new_account(&cmd),
            Err(DomainError::Validation(_))
        ));
    }

    #[test]
    fn test_validate_new_account_keeps_initial() {
        let cmd = CreateAccountCommand::new("Alice", "BG80BNBG96611020345678")
            .with_initial_amount(dec!(1000.00));
        let new = validate_new_account(&cmd).unwrap();
        assert_eq!(new.available_amount, dec!(1000.00));
    }
}
