use sea_orm::TransactionTrait;
use tracing::info;
use uuid::Uuid;

use crate::{
    Card, EngineError, ResultEngine, Transaction, TransactionKind, UpdateGroupCmd,
    installments::expand_in_group,
    util::{ensure_positive_amount, normalize_description},
};

use super::{
    super::{Engine, balances::BalanceAccumulator, with_tx},
    row_from_spec,
};

impl Engine {
    /// Every row of an installment group, in installment order.
    pub async fn group(&self, user_id: &str, group_id: Uuid) -> ResultEngine<Vec<Transaction>> {
        with_tx!(self, |db_tx| {
            let rows = self.require_group(&db_tx, user_id, group_id).await?;
            Ok(rows.into_iter().map(|row| row.tx).collect())
        })
    }

    /// Rewrite an installment group from a new purchase description.
    ///
    /// The existing rows are deleted (reversing the balance effect of the paid
    /// ones) and the purchase is expanded again on the same card, with the
    /// same kind. The new rows are unpaid. With more than one installment the
    /// group keeps its id; with one installment the row is a plain
    /// transaction. Returns the number of rows created.
    pub async fn update_group(&self, cmd: UpdateGroupCmd) -> ResultEngine<u64> {
        ensure_positive_amount(cmd.amount_minor)?;
        let description = normalize_description(&cmd.description)?;

        with_tx!(self, |db_tx| {
            let old_rows = self
                .require_group(&db_tx, &cmd.user_id, cmd.group_id)
                .await?;
            let first = &old_rows[0].tx;
            let (kind, created_via, card_id) = (first.kind, first.created_via, first.card_id);
            if matches!(kind, TransactionKind::TransferOut | TransactionKind::TransferIn) {
                return Err(EngineError::InvalidTransfer(
                    "transfer pairs cannot be rewritten as installments".to_string(),
                ));
            }
            let (card_model, bank) = self.require_card(&db_tx, &cmd.user_id, card_id).await?;
            let card = Card::try_from(card_model)?;
            if let Some(category_id) = cmd.category_id {
                self.require_category(&db_tx, &cmd.user_id, category_id)
                    .await?;
            }

            let new_rows = expand_in_group(
                cmd.amount_minor,
                cmd.total_installments,
                cmd.purchase_date,
                card.due_day,
                &description,
                Some(cmd.group_id),
            )?
            .into_iter()
            .map(|spec| row_from_spec(card.id, kind, cmd.category_id, created_via, spec))
            .collect::<ResultEngine<Vec<_>>>()?;

            let mut balances = BalanceAccumulator::new();
            let removed = self
                .delete_posted(&db_tx, &old_rows, &mut balances)
                .await?;
            self.insert_posted(&db_tx, bank.id, &new_rows, &mut balances)
                .await?;
            balances.persist(&db_tx).await?;

            info!(
                group_id = %cmd.group_id,
                removed,
                created = new_rows.len(),
                "installment group rewritten"
            );
            Ok(new_rows.len() as u64)
        })
    }

    /// Delete every row of an installment group, reversing the balance effect
    /// of the paid ones. Returns the number of rows deleted.
    pub async fn delete_group(&self, user_id: &str, group_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            let rows = self.require_group(&db_tx, user_id, group_id).await?;
            let mut balances = BalanceAccumulator::new();
            let deleted = self.delete_posted(&db_tx, &rows, &mut balances).await?;
            balances.persist(&db_tx).await?;
            info!(%group_id, deleted, "installment group deleted");
            Ok(deleted)
        })
    }

    /// Delete one transaction, reversing its balance effect if it was paid.
    pub async fn delete_transaction(&self, user_id: &str, transaction_id: Uuid) -> ResultEngine<bool> {
        with_tx!(self, |db_tx| {
            let row = self
                .require_transaction(&db_tx, user_id, transaction_id)
                .await?;
            let mut balances = BalanceAccumulator::new();
            let deleted = self
                .delete_posted(&db_tx, std::slice::from_ref(&row), &mut balances)
                .await?;
            balances.persist(&db_tx).await?;
            info!(%transaction_id, was_paid = row.tx.is_paid, "transaction deleted");
            Ok(deleted == 1)
        })
    }
}
