//! The module contains `Bank` struct and its implementation.

use chrono::{DateTime, Utc};
use sea_orm::entity::{ActiveValue, prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{MoneyCents, ResultEngine, transactions::BalanceDirection, util::add_minor};

/// A bank.
///
/// A bank is where money is actually kept. Cards post transactions against
/// it, and `current_balance` is the denormalized running balance:
///
/// `current_balance = opening_balance + Σ effect(paid transactions on its cards)`
///
/// It is only moved by the engine's balance accumulator, inside the same
/// database transaction as the row change that caused it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    /// Stable identifier for this bank.
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub opening_balance: i64,
    pub current_balance: i64,
    pub created_at: DateTime<Utc>,
}

impl Bank {
    pub fn new(user_id: String, name: String, opening_balance: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            opening_balance,
            current_balance: opening_balance,
            created_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn balance(&self) -> MoneyCents {
        MoneyCents::new(self.current_balance)
    }

    /// Moves the in-memory balance by `amount_minor` in `direction`.
    pub fn apply(&mut self, amount_minor: i64, direction: BalanceDirection) -> ResultEngine<()> {
        self.current_balance = add_minor(self.current_balance, direction.signed(amount_minor))?;
        Ok(())
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "banks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: String,
    pub name: String,
    pub name_norm: String,
    pub opening_balance: i64,
    pub current_balance: i64,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::cards::Entity")]
    Cards,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Username",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Cards.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<Model> for Bank {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            name: model.name,
            opening_balance: model.opening_balance,
            current_balance: model.current_balance,
            created_at: model.created_at,
        }
    }
}

impl From<(&Bank, String)> for ActiveModel {
    fn from((bank, name_norm): (&Bank, String)) -> Self {
        Self {
            id: ActiveValue::Set(bank.id),
            user_id: ActiveValue::Set(bank.user_id.clone()),
            name: ActiveValue::Set(bank.name.clone()),
            name_norm: ActiveValue::Set(name_norm),
            opening_balance: ActiveValue::Set(bank.opening_balance),
            current_balance: ActiveValue::Set(bank.current_balance),
            created_at: ActiveValue::Set(bank.created_at),
        }
    }
}
