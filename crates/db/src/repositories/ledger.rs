//! Ledger repository: the account, entry and transfer primitives.
//!
//! `LedgerRepository` borrows any sea-orm connection, so the same primitives
//! run against the pool for plain reads and against a `DatabaseTransaction`
//! inside the transaction executor. Balance writes are only issued from the
//! executor's scope by the transfer engine and account opening.

use bank_shared::types::{AccountId, Currency, EntryId, PageRequest, TransferId};
use sea_orm::sea_query::LockType;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, FromQueryResult,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement,
};

use crate::entities::{accounts, entries, transfers};

/// Row shape for aggregate queries.
#[derive(Debug, FromQueryResult)]
struct Total {
    total: i64,
}

/// Account, entry and transfer queries over a borrowed connection.
#[derive(Debug)]
pub struct LedgerRepository<'c, C> {
    conn: &'c C,
}

impl<C> Clone for LedgerRepository<'_, C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for LedgerRepository<'_, C> {}

impl<'c, C: ConnectionTrait> LedgerRepository<'c, C> {
    /// Creates a repository bound to `conn`.
    #[must_use]
    pub const fn new(conn: &'c C) -> Self {
        Self { conn }
    }

    /// Returns the underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &'c C {
        self.conn
    }

    // ========================================================================
    // Accounts
    // ========================================================================

    /// Inserts an account row with the given balance.
    ///
    /// Callers that want `balance == sum(entries)` from the start must write
    /// the opening entry in the same transaction.
    pub async fn create_account(
        &self,
        owner: &str,
        currency: Currency,
        balance: i64,
    ) -> Result<accounts::Model, DbErr> {
        accounts::ActiveModel {
            owner: Set(owner.to_string()),
            balance: Set(balance),
            currency: Set(currency.code().to_string()),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    /// Reads an account without locking it.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await
    }

    /// Reads an account and takes its row lock for the rest of the transaction.
    ///
    /// Blocks until any other transaction holding the row commits or rolls
    /// back. `FOR NO KEY UPDATE` still lets concurrent inserts reference the
    /// row through foreign keys.
    pub async fn get_account_for_update(
        &self,
        id: AccountId,
    ) -> Result<Option<accounts::Model>, DbErr> {
        accounts::Entity::find_by_id(id.into_inner())
            .lock(LockType::NoKeyUpdate)
            .one(self.conn)
            .await
    }

    /// Lists an owner's accounts ordered by id.
    pub async fn list_accounts(
        &self,
        owner: &str,
        page: PageRequest,
    ) -> Result<Vec<accounts::Model>, DbErr> {
        accounts::Entity::find()
            .filter(accounts::Column::Owner.eq(owner))
            .order_by_asc(accounts::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.conn)
            .await
    }

    /// Overwrites an account balance. Returns `None` if the account is missing.
    ///
    /// Only safe while holding the row lock from [`Self::get_account_for_update`].
    pub async fn update_account_balance(
        &self,
        id: AccountId,
        balance: i64,
    ) -> Result<Option<accounts::Model>, DbErr> {
        let stmt = Statement::from_sql_and_values(
            self.conn.get_database_backend(),
            "UPDATE accounts SET balance = $1 WHERE id = $2 \
             RETURNING id, owner, balance, currency, created_at",
            [balance.into(), id.into_inner().into()],
        );
        accounts::Model::find_by_statement(stmt).one(self.conn).await
    }

    /// Adds `delta` to an account balance in a single statement.
    ///
    /// Returns the updated account, or `None` if the account is missing.
    pub async fn add_account_balance(
        &self,
        id: AccountId,
        delta: i64,
    ) -> Result<Option<accounts::Model>, DbErr> {
        let stmt = Statement::from_sql_and_values(
            self.conn.get_database_backend(),
            "UPDATE accounts SET balance = balance + $1 WHERE id = $2 \
             RETURNING id, owner, balance, currency, created_at",
            [delta.into(), id.into_inner().into()],
        );
        accounts::Model::find_by_statement(stmt).one(self.conn).await
    }

    /// Deletes an account. Fails with a foreign-key error once it has history.
    pub async fn delete_account(&self, id: AccountId) -> Result<bool, DbErr> {
        let result = accounts::Entity::delete_by_id(id.into_inner())
            .exec(self.conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    // ========================================================================
    // Entries
    // ========================================================================

    /// Appends an entry.
    pub async fn create_entry(
        &self,
        account_id: AccountId,
        amount: i64,
    ) -> Result<entries::Model, DbErr> {
        entries::ActiveModel {
            account_id: Set(account_id.into_inner()),
            amount: Set(amount),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    /// Reads an entry.
    pub async fn get_entry(&self, id: EntryId) -> Result<Option<entries::Model>, DbErr> {
        entries::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await
    }

    /// Lists an account's entries, oldest first.
    pub async fn list_entries(
        &self,
        account_id: AccountId,
        page: PageRequest,
    ) -> Result<Vec<entries::Model>, DbErr> {
        entries::Entity::find()
            .filter(entries::Column::AccountId.eq(account_id.into_inner()))
            .order_by_asc(entries::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.conn)
            .await
    }

    /// Sums an account's entries. Zero when it has none.
    pub async fn sum_entries(&self, account_id: AccountId) -> Result<i64, DbErr> {
        let stmt = Statement::from_sql_and_values(
            self.conn.get_database_backend(),
            "SELECT COALESCE(SUM(amount), 0)::BIGINT AS total FROM entries WHERE account_id = $1",
            [account_id.into_inner().into()],
        );
        let row = Total::find_by_statement(stmt).one(self.conn).await?;
        Ok(row.map_or(0, |r| r.total))
    }

    // ========================================================================
    // Transfers
    // ========================================================================

    /// Records a transfer.
    pub async fn create_transfer(
        &self,
        from_account_id: AccountId,
        to_account_id: AccountId,
        amount: i64,
    ) -> Result<transfers::Model, DbErr> {
        transfers::ActiveModel {
            from_account_id: Set(from_account_id.into_inner()),
            to_account_id: Set(to_account_id.into_inner()),
            amount: Set(amount),
            ..Default::default()
        }
        .insert(self.conn)
        .await
    }

    /// Reads a transfer.
    pub async fn get_transfer(&self, id: TransferId) -> Result<Option<transfers::Model>, DbErr> {
        transfers::Entity::find_by_id(id.into_inner())
            .one(self.conn)
            .await
    }

    /// Lists transfers between `a` and `b` in either direction, oldest first.
    ///
    /// Transfers between either account and a third one are not included.
    pub async fn list_transfers(
        &self,
        a: AccountId,
        b: AccountId,
        page: PageRequest,
    ) -> Result<Vec<transfers::Model>, DbErr> {
        let (a, b) = (a.into_inner(), b.into_inner());
        transfers::Entity::find()
            .filter(
                Condition::any()
                    .add(
                        Condition::all()
                            .add(transfers::Column::FromAccountId.eq(a))
                            .add(transfers::Column::ToAccountId.eq(b)),
                    )
                    .add(
                        Condition::all()
                            .add(transfers::Column::FromAccountId.eq(b))
                            .add(transfers::Column::ToAccountId.eq(a)),
                    ),
            )
            .order_by_asc(transfers::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(self.conn)
            .await
    }
}
