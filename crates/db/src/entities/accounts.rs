//! `SeaORM` Entity for accounts table.

use bank_shared::types::AccountId;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// An account row.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    /// Account id.
    pub id: i64,
    /// Account owner.
    pub owner: String,
    /// Smallest currency unit. Equals the sum of the account's entries.
    pub balance: i64,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Creation time.
    pub created_at: DateTimeWithTimeZone,
}

impl Model {
    /// Typed id of this account.
    #[must_use]
    pub const fn account_id(&self) -> AccountId {
        AccountId::new(self.id)
    }
}

/// Relations of an account.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Entries recorded against the account.
    #[sea_orm(has_many = "super::entries::Entity")]
    Entries,
}

impl Related<super::entries::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Entries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
