use sea_orm::{DatabaseTransaction, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr};
use uuid::Uuid;

use crate::{
    CreatedVia, InstallmentSpec, ResultEngine, Transaction, TransactionKind, transactions,
};

use super::{Engine, access::PostedTransaction, balances::BalanceAccumulator, with_tx};

mod create;
mod groups;
mod list;
mod status;
mod transfer;
mod update;

pub use list::{PaymentStatus, TransactionListFilter, TransactionPage};
pub use transfer::TransferPair;

/// Keeps `IN (...)` lists well below the SQLite bound parameter limit.
const ID_CHUNK: usize = 500;

fn row_from_spec(
    card_id: Uuid,
    kind: TransactionKind,
    category_id: Option<Uuid>,
    created_via: CreatedVia,
    spec: InstallmentSpec,
) -> ResultEngine<Transaction> {
    let mut tx = Transaction::new(card_id, kind, spec.amount_minor, spec.description, spec.date)?;
    tx.purchase_date = Some(spec.purchase_date);
    tx.category_id = category_id;
    tx.group_id = spec.group_id;
    tx.installment_number = spec.installment_number;
    tx.total_installments = spec.total_installments;
    tx.created_via = created_via;
    Ok(tx)
}

impl Engine {
    /// Return a transaction snapshot from DB.
    pub async fn transaction(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let row = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            Ok(row.tx)
        })
    }

    /// Inserts rows posted on `bank_id` and records the effect of the paid
    /// ones.
    async fn insert_posted(
        &self,
        db_tx: &DatabaseTransaction,
        bank_id: Uuid,
        rows: &[Transaction],
        balances: &mut BalanceAccumulator,
    ) -> ResultEngine<()> {
        if rows.is_empty() {
            return Ok(());
        }
        let models: Vec<transactions::ActiveModel> = rows.iter().map(Into::into).collect();
        transactions::Entity::insert_many(models)
            .exec(db_tx)
            .await?;
        for tx in rows {
            balances.insert(bank_id, tx)?;
        }
        Ok(())
    }

    /// Moves `rows` to `target`, skipping the ones already there. Returns the
    /// number of rows changed.
    async fn set_paid(
        &self,
        db_tx: &DatabaseTransaction,
        rows: &mut [PostedTransaction],
        target: bool,
        balances: &mut BalanceAccumulator,
    ) -> ResultEngine<u64> {
        let mut changed: Vec<Uuid> = Vec::new();
        for row in rows.iter_mut() {
            if balances.transition(row, target)? {
                row.tx.is_paid = target;
                changed.push(row.tx.id);
            }
        }
        for chunk in changed.chunks(ID_CHUNK) {
            transactions::Entity::update_many()
                .col_expr(transactions::Column::IsPaid, Expr::value(target))
                .filter(transactions::Column::Id.is_in(chunk.to_vec()))
                .exec(db_tx)
                .await?;
        }
        Ok(changed.len() as u64)
    }

    /// Deletes `rows`, reversing the effect of the paid ones.
    async fn delete_posted(
        &self,
        db_tx: &DatabaseTransaction,
        rows: &[PostedTransaction],
        balances: &mut BalanceAccumulator,
    ) -> ResultEngine<u64> {
        let ids: Vec<Uuid> = rows.iter().map(|row| row.tx.id).collect();
        let mut deleted = 0;
        for chunk in ids.chunks(ID_CHUNK) {
            deleted += transactions::Entity::delete_many()
                .filter(transactions::Column::Id.is_in(chunk.to_vec()))
                .exec(db_tx)
                .await?
                .rows_affected;
        }
        for row in rows {
            balances.remove(row)?;
        }
        Ok(deleted)
    }
}
