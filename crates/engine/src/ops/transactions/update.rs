use sea_orm::{ActiveModelTrait, TransactionTrait};
use tracing::info;

use crate::{
    ResultEngine, Transaction, UpdateTransactionCmd, transactions,
    util::{ensure_positive_amount, normalize_description},
};

use super::super::{Engine, balances::BalanceAccumulator, with_tx};

impl Engine {
    /// Patch amount, description, date and/or category of a transaction.
    ///
    /// A paid transaction keeps its state: the old effect is reversed and the
    /// new one applied in the same database transaction.
    pub async fn update_transaction(&self, cmd: UpdateTransactionCmd) -> ResultEngine<Transaction> {
        if let Some(amount_minor) = cmd.amount_minor {
            ensure_positive_amount(amount_minor)?;
        }
        let description = cmd
            .description
            .as_deref()
            .map(normalize_description)
            .transpose()?;

        with_tx!(self, |db_tx| {
            let old = self
                .require_transaction(&db_tx, &cmd.user_id, cmd.transaction_id)
                .await?;
            if let Some(Some(category_id)) = cmd.category_id {
                self.require_category(&db_tx, &cmd.user_id, category_id)
                    .await?;
            }

            let mut updated = old.tx.clone();
            if let Some(amount_minor) = cmd.amount_minor {
                updated.amount_minor = amount_minor;
            }
            if let Some(description) = description {
                updated.description = description;
            }
            if let Some(date) = cmd.date {
                updated.date = date;
            }
            if let Some(category_id) = cmd.category_id {
                updated.category_id = category_id;
            }

            let model: transactions::ActiveModel = (&updated).into();
            model.update(&db_tx).await?;

            let mut balances = BalanceAccumulator::new();
            balances.remove(&old)?;
            balances.insert(old.bank_id, &updated)?;
            balances.persist(&db_tx).await?;

            info!(transaction_id = %updated.id, "transaction updated");
            Ok(updated)
        })
    }
}
