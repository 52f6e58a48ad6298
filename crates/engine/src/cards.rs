//! Payment cards.
//!
//! A card belongs to exactly one bank; every transaction is posted through a
//! card, which is how the engine finds the bank whose balance a transaction
//! moves.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardKind {
    Credit,
    Debit,
}

impl CardKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Credit => "credit",
            Self::Debit => "debit",
        }
    }
}

impl TryFrom<&str> for CardKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "credit" => Ok(Self::Credit),
            "debit" => Ok(Self::Debit),
            other => Err(EngineError::InvalidName(format!(
                "invalid card kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: Uuid,
    pub bank_id: Uuid,
    pub name: String,
    pub kind: CardKind,
    /// Credit limit in minor units.
    pub limit_minor: Option<i64>,
    /// Day of month on which purchases on this card fall due.
    pub due_day: Option<u32>,
    pub created_at: DateTime<Utc>,
}

impl Card {
    pub fn new(bank_id: Uuid, name: String, kind: CardKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            bank_id,
            name,
            kind,
            limit_minor: None,
            due_day: None,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "cards")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub bank_id: Uuid,
    pub name: String,
    pub kind: String,
    pub limit_minor: Option<i64>,
    pub due_day: Option<i32>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::banks::Entity",
        from = "Column::BankId",
        to = "super::banks::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Bank,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::banks::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bank.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Card> for ActiveModel {
    fn from(card: &Card) -> Self {
        Self {
            id: ActiveValue::Set(card.id),
            bank_id: ActiveValue::Set(card.bank_id),
            name: ActiveValue::Set(card.name.clone()),
            kind: ActiveValue::Set(card.kind.as_str().to_string()),
            limit_minor: ActiveValue::Set(card.limit_minor),
            due_day: ActiveValue::Set(card.due_day.map(|d| d as i32)),
            created_at: ActiveValue::Set(card.created_at),
        }
    }
}

impl TryFrom<Model> for Card {
    type Error = EngineError;

    fn try_from(model: Model) -> ResultEngine<Self> {
        let due_day = model
            .due_day
            .map(|day| {
                u32::try_from(day)
                    .map_err(|_| EngineError::InvalidDate(format!("stored due_day {day}")))
            })
            .transpose()?;
        Ok(Self {
            id: model.id,
            bank_id: model.bank_id,
            name: model.name,
            kind: CardKind::try_from(model.kind.as_str())?,
            limit_minor: model.limit_minor,
            due_day,
            created_at: model.created_at,
        })
    }
}
