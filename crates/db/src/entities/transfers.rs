//! `SeaORM` Entity for transfers table.

use bank_shared::types::{AccountId, TransferId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A transfer row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "transfers")]
pub struct Model {
    #[sea_orm(primary_key)]
    /// Transfer id.
    pub id: i64,
    /// Debited account.
    pub from_account_id: i64,
    /// Credited account.
    pub to_account_id: i64,
    /// Always positive.
    pub amount: i64,
    /// Creation time.
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Typed id of this transfer.
    #[must_use]
    pub const fn transfer_id(&self) -> TransferId {
        TransferId::new(self.id)
    }

    /// Typed id of the debited account.
    #[must_use]
    pub const fn from_account(&self) -> AccountId {
        AccountId::new(self.from_account_id)
    }

    /// Typed id of the credited account.
    #[must_use]
    pub const fn to_account(&self) -> AccountId {
        AccountId::new(self.to_account_id)
    }
}

/// Relations of a transfer.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The debited account.
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::FromAccountId",
        to = "super::accounts::Column::Id"
    )]
    FromAccount,
    /// The credited account.
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::ToAccountId",
        to = "super::accounts::Column::Id"
    )]
    ToAccount,
}

impl ActiveModelBehavior for ActiveModel {}
