//! Transaction primitives.
//!
//! A `Transaction` is one dated movement posted on a card. Only paid
//! transactions move the balance of the card's bank; the direction of the
//! movement comes from the kind (see [`TransactionKind::direction`]).

use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Expense,
    Payment,
    Refund,
    Deposit,
    TransferOut,
    TransferIn,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Payment => "payment",
            Self::Refund => "refund",
            Self::Deposit => "deposit",
            Self::TransferOut => "transfer_out",
            Self::TransferIn => "transfer_in",
        }
    }

    /// Money leaves the bank for expenses and outgoing transfers; every other
    /// kind brings money in.
    pub fn direction(self) -> BalanceDirection {
        match self {
            Self::Expense | Self::TransferOut => BalanceDirection::Debit,
            Self::Payment | Self::Refund | Self::Deposit | Self::TransferIn => {
                BalanceDirection::Credit
            }
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "expense" => Ok(Self::Expense),
            "payment" => Ok(Self::Payment),
            "refund" => Ok(Self::Refund),
            "deposit" => Ok(Self::Deposit),
            "transfer_out" => Ok(Self::TransferOut),
            "transfer_in" => Ok(Self::TransferIn),
            other => Err(EngineError::InvalidName(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BalanceDirection {
    Credit,
    Debit,
}

impl BalanceDirection {
    /// Signed delta for a positive `amount_minor`.
    pub fn signed(self, amount_minor: i64) -> i64 {
        match self {
            Self::Credit => amount_minor,
            Self::Debit => -amount_minor,
        }
    }

    #[must_use]
    pub fn reversed(self) -> Self {
        match self {
            Self::Credit => Self::Debit,
            Self::Debit => Self::Credit,
        }
    }
}

/// Where a transaction was entered from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreatedVia {
    #[default]
    Web,
    Bot,
    Cli,
    System,
}

impl CreatedVia {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Web => "web",
            Self::Bot => "bot",
            Self::Cli => "cli",
            Self::System => "system",
        }
    }
}

impl TryFrom<&str> for CreatedVia {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "web" => Ok(Self::Web),
            "bot" => Ok(Self::Bot),
            "cli" => Ok(Self::Cli),
            "system" => Ok(Self::System),
            other => Err(EngineError::InvalidName(format!(
                "invalid created_via: {other}"
            ))),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub card_id: Uuid,
    pub amount_minor: i64,
    pub kind: TransactionKind,
    pub description: String,
    /// Due (or effective) date.
    pub date: NaiveDate,
    pub purchase_date: Option<NaiveDate>,
    pub is_paid: bool,
    pub category_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub installment_number: Option<u32>,
    pub total_installments: Option<u32>,
    pub transfer_to_bank_id: Option<Uuid>,
    pub created_via: CreatedVia,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        card_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        description: String,
        date: NaiveDate,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        Ok(Self {
            id: Uuid::new_v4(),
            card_id,
            amount_minor,
            kind,
            description,
            date,
            purchase_date: None,
            is_paid: false,
            category_id: None,
            group_id: None,
            installment_number: None,
            total_installments: None,
            transfer_to_bank_id: None,
            created_via: CreatedVia::default(),
            created_at: Utc::now(),
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub card_id: Uuid,
    pub amount_minor: i64,
    pub kind: String,
    pub description: String,
    pub date: Date,
    pub purchase_date: Option<Date>,
    pub is_paid: bool,
    pub category_id: Option<Uuid>,
    pub group_id: Option<Uuid>,
    pub installment_number: Option<i32>,
    pub total_installments: Option<i32>,
    pub transfer_to_bank_id: Option<Uuid>,
    pub created_via: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::cards::Entity",
        from = "Column::CardId",
        to = "super::cards::Column::Id",
        on_update = "NoAction",
        on_delete = "Cascade"
    )]
    Card,
    #[sea_orm(
        belongs_to = "super::categories::Entity",
        from = "Column::CategoryId",
        to = "super::categories::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    Category,
    #[sea_orm(
        belongs_to = "super::banks::Entity",
        from = "Column::TransferToBankId",
        to = "super::banks::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    TransferBank,
}

impl Related<super::cards::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Card.def()
    }
}

impl Related<super::categories::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Category.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

fn to_db_count(value: Option<u32>) -> Option<i32> {
    value.and_then(|v| i32::try_from(v).ok())
}

fn from_db_count(value: Option<i32>) -> Option<u32> {
    value.and_then(|v| u32::try_from(v).ok())
}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id),
            card_id: ActiveValue::Set(tx.card_id),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            description: ActiveValue::Set(tx.description.clone()),
            date: ActiveValue::Set(tx.date),
            purchase_date: ActiveValue::Set(tx.purchase_date),
            is_paid: ActiveValue::Set(tx.is_paid),
            category_id: ActiveValue::Set(tx.category_id),
            group_id: ActiveValue::Set(tx.group_id),
            installment_number: ActiveValue::Set(to_db_count(tx.installment_number)),
            total_installments: ActiveValue::Set(to_db_count(tx.total_installments)),
            transfer_to_bank_id: ActiveValue::Set(tx.transfer_to_bank_id),
            created_via: ActiveValue::Set(tx.created_via.as_str().to_string()),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: model.id,
            card_id: model.card_id,
            amount_minor: model.amount_minor,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            description: model.description,
            date: model.date,
            purchase_date: model.purchase_date,
            is_paid: model.is_paid,
            category_id: model.category_id,
            group_id: model.group_id,
            installment_number: from_db_count(model.installment_number),
            total_installments: from_db_count(model.total_installments),
            transfer_to_bank_id: model.transfer_to_bank_id,
            created_via: CreatedVia::try_from(model.created_via.as_str())
                .unwrap_or_default(),
            created_at: model.created_at,
        })
    }
}
