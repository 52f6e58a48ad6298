//! Command structs for engine operations.
//!
//! These types group parameters for write operations
//! (create/deposit/transfer/update), keeping call sites readable and avoiding
//! long argument lists.

use chrono::NaiveDate;
use uuid::Uuid;

use crate::{CardKind, CreatedVia, TransactionKind};

/// Create a transaction, optionally split in installments.
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: String,
    pub card_id: Uuid,
    pub kind: TransactionKind,
    /// Total amount; with installments this is the purchase total.
    pub amount_minor: i64,
    pub description: String,
    /// Effective date, or the purchase date when `installments` is set.
    pub date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub installments: Option<u32>,
    pub paid: bool,
    pub created_via: CreatedVia,
}

impl CreateTransactionCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        card_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        description: impl Into<String>,
        date: NaiveDate,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            card_id,
            kind,
            amount_minor,
            description: description.into(),
            date,
            category_id: None,
            installments: None,
            paid: false,
            created_via: CreatedVia::default(),
        }
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn installments(mut self, total: u32) -> Self {
        self.installments = Some(total);
        self
    }

    /// Create the rows already paid, moving the bank balance right away.
    #[must_use]
    pub fn paid(mut self, paid: bool) -> Self {
        self.paid = paid;
        self
    }

    #[must_use]
    pub fn created_via(mut self, via: CreatedVia) -> Self {
        self.created_via = via;
        self
    }
}

/// Deposit money on a bank.
#[derive(Clone, Debug)]
pub struct DepositCmd {
    pub user_id: String,
    pub bank_id: Uuid,
    pub amount_minor: i64,
    pub date: NaiveDate,
    pub description: String,
    pub category_id: Option<Uuid>,
    pub created_via: CreatedVia,
}

impl DepositCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        bank_id: Uuid,
        amount_minor: i64,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            bank_id,
            amount_minor,
            date,
            description: description.into(),
            category_id: None,
            created_via: CreatedVia::default(),
        }
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }

    #[must_use]
    pub fn created_via(mut self, via: CreatedVia) -> Self {
        self.created_via = via;
        self
    }
}

/// Move money between two banks of the same user.
#[derive(Clone, Debug)]
pub struct TransferCmd {
    pub user_id: String,
    pub from_bank_id: Uuid,
    pub to_bank_id: Uuid,
    pub amount_minor: i64,
    pub date: NaiveDate,
    pub description: String,
    pub created_via: CreatedVia,
}

impl TransferCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        from_bank_id: Uuid,
        to_bank_id: Uuid,
        amount_minor: i64,
        date: NaiveDate,
        description: impl Into<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            from_bank_id,
            to_bank_id,
            amount_minor,
            date,
            description: description.into(),
            created_via: CreatedVia::default(),
        }
    }

    #[must_use]
    pub fn created_via(mut self, via: CreatedVia) -> Self {
        self.created_via = via;
        self
    }
}

/// Rewrite every row of an installment group.
#[derive(Clone, Debug)]
pub struct UpdateGroupCmd {
    pub user_id: String,
    pub group_id: Uuid,
    pub amount_minor: i64,
    pub description: String,
    pub purchase_date: NaiveDate,
    pub category_id: Option<Uuid>,
    pub total_installments: u32,
}

impl UpdateGroupCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        group_id: Uuid,
        amount_minor: i64,
        description: impl Into<String>,
        purchase_date: NaiveDate,
        total_installments: u32,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            group_id,
            amount_minor,
            description: description.into(),
            purchase_date,
            category_id: None,
            total_installments,
        }
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(category_id);
        self
    }
}

/// Patch a single transaction. Unset fields are left untouched.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub user_id: String,
    pub transaction_id: Uuid,
    pub amount_minor: Option<i64>,
    pub description: Option<String>,
    pub date: Option<NaiveDate>,
    /// `Some(None)` clears the category.
    pub category_id: Option<Option<Uuid>>,
}

impl UpdateTransactionCmd {
    #[must_use]
    pub fn new(user_id: impl Into<String>, transaction_id: Uuid) -> Self {
        Self {
            user_id: user_id.into(),
            transaction_id,
            amount_minor: None,
            description: None,
            date: None,
            category_id: None,
        }
    }

    #[must_use]
    pub fn amount_minor(mut self, amount_minor: i64) -> Self {
        self.amount_minor = Some(amount_minor);
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn date(mut self, date: NaiveDate) -> Self {
        self.date = Some(date);
        self
    }

    #[must_use]
    pub fn category(mut self, category_id: Uuid) -> Self {
        self.category_id = Some(Some(category_id));
        self
    }

    #[must_use]
    pub fn clear_category(mut self) -> Self {
        self.category_id = Some(None);
        self
    }
}

/// Create a card on one of the user's banks.
#[derive(Clone, Debug)]
pub struct NewCardCmd {
    pub user_id: String,
    pub bank_id: Uuid,
    pub name: String,
    pub kind: CardKind,
    pub limit_minor: Option<i64>,
    pub due_day: Option<u32>,
}

impl NewCardCmd {
    #[must_use]
    pub fn new(
        user_id: impl Into<String>,
        bank_id: Uuid,
        name: impl Into<String>,
        kind: CardKind,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            bank_id,
            name: name.into(),
            kind,
            limit_minor: None,
            due_day: None,
        }
    }

    #[must_use]
    pub fn limit_minor(mut self, limit_minor: i64) -> Self {
        self.limit_minor = Some(limit_minor);
        self
    }

    #[must_use]
    pub fn due_day(mut self, due_day: u32) -> Self {
        self.due_day = Some(due_day);
        self
    }
}
