//! The ledger store: account opening, balance audits and funds transfers.
//!
//! # Lock ordering
//!
//! [`Store::transfer`] always locks the lower account id first, whatever the
//! direction of the transfer. Two transfers over the same pair therefore
//! queue on the same row instead of each holding one lock and waiting on the
//! other. Every code path that takes more than one account row lock must
//! follow the same order.

use std::time::Duration;

use bank_core::transfer::{ensure_same_currency, settle_leg, Leg, TransferPlan, TransferRequest};
use bank_shared::types::{AccountId, Currency, EntryId, PageRequest, TransferId};
use bank_shared::LedgerConfig;
use sea_orm::{DatabaseConnection, DatabaseTransaction};
use serde::Serialize;
use tracing::{debug, info};

use crate::entities::{accounts, entries, transfers};
use crate::error::{AccountError, TransferError, TransferStep};
use crate::executor::{Executor, TxContext};
use crate::repositories::LedgerRepository;

/// Input for opening an account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAccount {
    /// Account owner.
    pub owner: String,
    /// Account currency.
    pub currency: Currency,
    /// Initial balance in the currency's smallest unit.
    pub opening_balance: i64,
}

impl OpenAccount {
    /// Builds the input from a currency code, rejecting unsupported codes.
    pub fn new(
        owner: impl Into<String>,
        currency: &str,
        opening_balance: i64,
    ) -> Result<Self, AccountError> {
        Ok(Self {
            owner: owner.into(),
            currency: currency.parse()?,
            opening_balance,
        })
    }
}

/// Everything a committed transfer wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferResult {
    /// The transfer record.
    pub transfer: transfers::Model,
    /// Debit entry on the source account.
    pub from_entry: entries::Model,
    /// Credit entry on the destination account.
    pub to_entry: entries::Model,
    /// Source account after the debit.
    pub from_account: accounts::Model,
    /// Destination account after the credit.
    pub to_account: accounts::Model,
}

/// Result of comparing an account's balance with its entry log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalanceAudit {
    /// Audited account.
    pub account_id: AccountId,
    /// Stored balance.
    pub balance: i64,
    /// Sum of the account's entries.
    pub entries_sum: i64,
    /// True when the two agree.
    pub consistent: bool,
}

/// Account and transfer operations over a shared connection pool.
#[derive(Debug, Clone)]
pub struct Store {
    executor: Executor,
    transfer_timeout: Option<Duration>,
}

impl Store {
    /// Creates a store with the default ledger settings.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self::with_config(db, &LedgerConfig::default())
    }

    /// Creates a store with explicit ledger settings.
    #[must_use]
    pub fn with_config(db: DatabaseConnection, config: &LedgerConfig) -> Self {
        Self {
            executor: Executor::new(db),
            transfer_timeout: config.transfer_timeout(),
        }
    }

    /// The transaction executor.
    #[must_use]
    pub const fn executor(&self) -> &Executor {
        &self.executor
    }

    /// A repository over the pool, for reads outside a transaction.
    #[must_use]
    pub fn repository(&self) -> LedgerRepository<'_, DatabaseConnection> {
        LedgerRepository::new(self.executor.connection())
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Opens an account.
    ///
    /// A positive opening balance is recorded as an entry in the same
    /// transaction, so the account audits clean from creation.
    #[tracing::instrument(skip_all, fields(owner = %input.owner, currency = %input.currency))]
    pub async fn open_account(
        &self,
        ctx: &TxContext,
        input: OpenAccount,
    ) -> Result<accounts::Model, AccountError> {
        if input.opening_balance < 0 {
            return Err(AccountError::NegativeOpeningBalance(input.opening_balance));
        }

        let account = self
            .executor
            .run_in_transaction(ctx, move |repo| {
                Box::pin(async move {
                    let account = repo
                        .create_account(&input.owner, input.currency, input.opening_balance)
                        .await
                        .map_err(|e| AccountError::from_insert(e, &input.owner, input.currency))?;
                    if input.opening_balance > 0 {
                        repo.create_entry(account.account_id(), input.opening_balance)
                            .await?;
                    }
                    Ok(account)
                })
            })
            .await?;

        info!(account_id = %account.account_id(), "account opened");
        Ok(account)
    }

    /// Reads an account.
    pub async fn get_account(&self, id: AccountId) -> Result<accounts::Model, AccountError> {
        self.repository()
            .get_account(id)
            .await?
            .ok_or(AccountError::NotFound(id))
    }

    /// Lists an owner's accounts.
    pub async fn list_accounts(
        &self,
        owner: &str,
        page: PageRequest,
    ) -> Result<Vec<accounts::Model>, AccountError> {
        Ok(self.repository().list_accounts(owner, page).await?)
    }

    /// Compares an account's balance with the sum of its entries.
    ///
    /// Holds the account's row lock while reading, so no transfer on the
    /// account can commit between the two reads.
    pub async fn audit_account(
        &self,
        ctx: &TxContext,
        id: AccountId,
    ) -> Result<BalanceAudit, AccountError> {
        self.executor
            .run_in_transaction(ctx, move |repo| {
                Box::pin(async move {
                    let account = repo
                        .get_account_for_update(id)
                        .await?
                        .ok_or(AccountError::NotFound(id))?;
                    let entries_sum = repo.sum_entries(id).await?;
                    Ok(BalanceAudit {
                        account_id: id,
                        balance: account.balance,
                        entries_sum,
                        consistent: account.balance == entries_sum,
                    })
                })
            })
            .await
            .map_err(AccountError::from)
    }

    // ========================================================================
    // Entries & Transfers
    // ========================================================================

    /// Reads an entry.
    pub async fn get_entry(&self, id: EntryId) -> Result<Option<entries::Model>, AccountError> {
        Ok(self.repository().get_entry(id).await?)
    }

    /// Lists an account's entries, oldest first.
    pub async fn list_entries(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<Vec<entries::Model>, AccountError> {
        Ok(self.repository().list_entries(account_id, page).await?)
    }

    /// Reads a transfer.
    pub async fn get_transfer(
        &self,
        id: TransferId,
    ) -> Result<Option<transfers::Model>, AccountError> {
        Ok(self.repository().get_transfer(id).await?)
    }

    /// Lists transfers between `a` and `b`, in either direction, oldest first.
    pub async fn list_transfers_between(
        &self,
        a: AccountId,
        b: AccountId,
        page: PageRequest,
    ) -> Result<Vec<transfers::Model>, AccountError> {
        Ok(self.repository().list_transfers(a, b, page).await?)
    }

    /// Moves `request.amount` from one account to another.
    ///
    /// Validation failures return before any store call. Everything else runs
    /// in one transaction: both accounts are looked up, then locked lower id
    /// first, debited and credited, and two entries plus one transfer record
    /// are written. Any failure rolls the whole transfer back.
    ///
    /// When `ctx` has no deadline the store's configured transfer timeout
    /// applies. A transfer that waits on a row lock past its deadline fails
    /// with [`TransferError::Timeout`].
    ///
    /// Transfers are not deduplicated. After an error where
    /// [`TransferError::outcome_unknown`] is true, check the transfer log
    /// before retrying.
    #[tracing::instrument(
        skip_all,
        fields(
            from = %request.from_account_id,
            to = %request.to_account_id,
            amount = request.amount,
        )
    )]
    pub async fn transfer(
        &self,
        ctx: &TxContext,
        request: TransferRequest,
    ) -> Result<TransferResult, TransferError> {
        let plan = TransferPlan::new(request)?;
        let ctx = self.bounded(ctx);

        let result = self
            .executor
            .run_in_transaction(&ctx, move |repo| Box::pin(transfer_tx(repo, plan)))
            .await?;

        info!(
            transfer_id = %result.transfer.transfer_id(),
            from_balance = result.from_account.balance,
            to_balance = result.to_account.balance,
            "transfer committed"
        );
        Ok(result)
    }

    /// Applies the configured transfer timeout to a context without a deadline.
    fn bounded(&self, ctx: &TxContext) -> TxContext {
        match (ctx.deadline(), self.transfer_timeout) {
            (None, Some(timeout)) => ctx.clone().with_timeout(timeout),
            _ => ctx.clone(),
        }
    }
}

/// The transfer's unit of work.
async fn transfer_tx(
    repo: LedgerRepository<'_, DatabaseTransaction>,
    plan: TransferPlan,
) -> Result<TransferResult, TransferError> {
    let request = *plan.request();
    let from_id = request.from_account_id;
    let to_id = request.to_account_id;

    let from = lookup(repo, from_id).await?;
    let to = lookup(repo, to_id).await?;
    ensure_same_currency(from_id, &from.currency, to_id, &to.currency)?;

    let [first, second] = *plan.legs();
    let first_account = lock_and_settle(repo, &first).await?;
    let second_account = lock_and_settle(repo, &second).await?;
    let (from_account, to_account) = if first.is_source() {
        (first_account, second_account)
    } else {
        (second_account, first_account)
    };

    let from_entry = repo
        .create_entry(from_id, -request.amount)
        .await
        .map_err(|e| TransferError::query(TransferStep::InsertEntry, Some(from_id), e))?;
    let to_entry = repo
        .create_entry(to_id, request.amount)
        .await
        .map_err(|e| TransferError::query(TransferStep::InsertEntry, Some(to_id), e))?;
    let transfer = repo
        .create_transfer(from_id, to_id, request.amount)
        .await
        .map_err(|e| TransferError::query(TransferStep::InsertTransfer, None, e))?;

    Ok(TransferResult {
        transfer,
        from_entry,
        to_entry,
        from_account,
        to_account,
    })
}

/// Reads an account without locking it.
async fn lookup(
    repo: LedgerRepository<'_, DatabaseTransaction>,
    id: AccountId,
) -> Result<accounts::Model, TransferError> {
    repo.get_account(id)
        .await
        .map_err(|e| TransferError::query(TransferStep::LookupAccount, Some(id), e))?
        .ok_or(TransferError::AccountNotFound(id))
}

/// Locks one leg's account, checks the leg against its balance, then writes it.
async fn lock_and_settle(
    repo: LedgerRepository<'_, DatabaseTransaction>,
    leg: &Leg,
) -> Result<accounts::Model, TransferError> {
    let id = leg.account_id;

    let locked = repo
        .get_account_for_update(id)
        .await
        .map_err(|e| TransferError::query(TransferStep::LockAccount, Some(id), e))?
        .ok_or(TransferError::AccountNotFound(id))?;

    let expected = settle_leg(leg, locked.balance)?;

    let updated = repo
        .add_account_balance(id, leg.delta)
        .await
        .map_err(|e| TransferError::query(TransferStep::UpdateBalance, Some(id), e))?
        .ok_or(TransferError::AccountNotFound(id))?;

    debug_assert_eq!(updated.balance, expected);
    debug!(account_id = %id, balance = updated.balance, "leg settled");
    Ok(updated)
}
