use chrono::NaiveDate;
use sea_orm::{ColumnTrait, Condition, TransactionTrait};
use tracing::info;
use uuid::Uuid;

use crate::{EngineError, ResultEngine, Transaction, transactions};

use super::{
    super::{Engine, balances::BalanceAccumulator, with_tx},
    ID_CHUNK,
};

impl Engine {
    /// Flip `is_paid` of one transaction and move the bank balance
    /// accordingly. Calling it twice restores the original state.
    pub async fn toggle_payment(
        &self,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let row = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let target = !row.tx.is_paid;
            let mut rows = vec![row];

            let mut balances = BalanceAccumulator::new();
            self.set_paid(&db_tx, &mut rows, target, &mut balances)
                .await?;
            balances.persist(&db_tx).await?;

            let row = rows.remove(0);
            info!(transaction_id = %row.tx.id, is_paid = target, "payment toggled");
            Ok(row.tx)
        })
    }

    /// Set `is_paid = target` on every listed transaction of the user.
    ///
    /// Rows already in the target state are left untouched, so repeating the
    /// call is a no-op. Unknown ids are ignored as long as at least one id
    /// matches. Returns the matched transactions in their new state.
    pub async fn bulk_update_status(
        &self,
        user_id: &str,
        transaction_ids: &[Uuid],
        target: bool,
    ) -> ResultEngine<Vec<Transaction>> {
        if transaction_ids.is_empty() {
            return Err(EngineError::KeyNotFound("transactions not exist".to_string()));
        }
        let mut ids = transaction_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();
        with_tx!(self, |db_tx| {
            let mut rows = Vec::with_capacity(ids.len());
            for chunk in ids.chunks(ID_CHUNK) {
                rows.extend(
                    self.find_posted(
                        &db_tx,
                        Some(user_id),
                        Condition::all().add(transactions::Column::Id.is_in(chunk.to_vec())),
                    )
                    .await?,
                );
            }
            if rows.is_empty() {
                return Err(EngineError::KeyNotFound("transactions not exist".to_string()));
            }

            let mut balances = BalanceAccumulator::new();
            let changed = self
                .set_paid(&db_tx, &mut rows, target, &mut balances)
                .await?;
            balances.persist(&db_tx).await?;

            info!(
                matched = rows.len(),
                changed,
                is_paid = target,
                "bulk status update"
            );
            Ok(rows.into_iter().map(|row| row.tx).collect())
        })
    }

    /// Mark as paid every unpaid transaction of the user due before `cutoff`.
    /// Returns how many rows changed.
    pub async fn mark_previous_as_paid(&self, user_id: &str, cutoff: NaiveDate) -> ResultEngine<u64> {
        self.settle_before(Some(user_id), cutoff).await
    }

    /// Same as [`Engine::mark_previous_as_paid`], across every user.
    pub async fn settle_all_before(&self, cutoff: NaiveDate) -> ResultEngine<u64> {
        self.settle_before(None, cutoff).await
    }

    async fn settle_before(&self, user_id: Option<&str>, cutoff: NaiveDate) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let mut rows = self
                .find_posted(
                    &db_tx,
                    user_id,
                    Condition::all()
                        .add(transactions::Column::IsPaid.eq(false))
                        .add(transactions::Column::Date.lt(cutoff)),
                )
                .await?;

            let mut balances = BalanceAccumulator::new();
            let changed = self
                .set_paid(&db_tx, &mut rows, true, &mut balances)
                .await?;
            balances.persist(&db_tx).await?;

            info!(user_id = user_id.unwrap_or("*"), %cutoff, changed, "settled previous transactions");
            Ok(changed)
        })
    }
}
