//! `SeaORM` Entity for entries table.
//!
//! Entries are append-only: one row per balance change, never updated.

use bank_shared::types::{AccountId, EntryId};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An entry row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "entries")]
pub struct Model {
    #[sea_orm(primary_key)]
    /// Entry id.
    pub id: i64,
    /// Account the entry belongs to.
    pub account_id: i64,
    /// Positive for a credit, negative for a debit.
    pub amount: i64,
    /// Creation time.
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Typed id of this entry.
    #[must_use]
    pub const fn entry_id(&self) -> EntryId {
        EntryId::new(self.id)
    }

    /// Typed id of the account this entry belongs to.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        AccountId::new(self.account_id)
    }
}

/// Relations of an entry.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// The account the entry belongs to.
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
