use sea_orm::{ActiveModelTrait, TransactionTrait};
use tracing::info;

use crate::{
    Card, CardKind, CreateTransactionCmd, DepositCmd, ResultEngine, Transaction, TransactionKind,
    cards, expand_installments,
    util::{ensure_positive_amount, normalize_description},
};

use super::{
    super::{Engine, balances::BalanceAccumulator, with_tx},
    row_from_spec,
};

impl Engine {
    /// Create a transaction on a card.
    ///
    /// With `installments` set the amount is the purchase total and `date` the
    /// purchase date: one row per installment is created, due on the card's
    /// due day. Otherwise a single row is created on `date`.
    ///
    /// Rows are unpaid unless the kind is [`TransactionKind::Deposit`] or the
    /// command asks for paid rows; paid rows move the bank balance right away.
    pub async fn create_transaction(
        &self,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<Vec<Transaction>> {
        ensure_positive_amount(cmd.amount_minor)?;
        let description = normalize_description(&cmd.description)?;
        let paid = cmd.paid || cmd.kind == TransactionKind::Deposit;

        with_tx!(self, |db_tx| {
            let (card_model, bank) = self
                .require_card(&db_tx, &cmd.user_id, cmd.card_id)
                .await?;
            if let Some(category_id) = cmd.category_id {
                self.require_category(&db_tx, &cmd.user_id, category_id)
                    .await?;
            }
            let card = Card::try_from(card_model)?;

            let mut rows = match cmd.installments {
                Some(total) => expand_installments(
                    cmd.amount_minor,
                    total,
                    cmd.date,
                    card.due_day,
                    &description,
                )?
                .into_iter()
                .map(|spec| {
                    row_from_spec(card.id, cmd.kind, cmd.category_id, cmd.created_via, spec)
                })
                .collect::<ResultEngine<Vec<_>>>()?,
                None => {
                    let mut tx = Transaction::new(
                        card.id,
                        cmd.kind,
                        cmd.amount_minor,
                        description.clone(),
                        cmd.date,
                    )?;
                    tx.category_id = cmd.category_id;
                    tx.created_via = cmd.created_via;
                    vec![tx]
                }
            };
            for row in &mut rows {
                row.is_paid = paid;
            }

            let mut balances = BalanceAccumulator::new();
            self.insert_posted(&db_tx, bank.id, &rows, &mut balances)
                .await?;
            balances.persist(&db_tx).await?;

            info!(
                card_id = %card.id,
                kind = cmd.kind.as_str(),
                rows = rows.len(),
                paid,
                "transaction created"
            );
            Ok(rows)
        })
    }

    /// Deposit money on a bank.
    ///
    /// The deposit is posted on the bank's oldest card; a bank without cards
    /// gets a debit card named `"{bank} deposits"` for the purpose. Deposits
    /// are created paid and credit the bank immediately.
    pub async fn create_deposit(&self, cmd: DepositCmd) -> ResultEngine<Transaction> {
        ensure_positive_amount(cmd.amount_minor)?;
        let description = normalize_description(&cmd.description)?;

        with_tx!(self, |db_tx| {
            let bank = self
                .require_bank(&db_tx, &cmd.user_id, cmd.bank_id)
                .await?;
            if let Some(category_id) = cmd.category_id {
                self.require_category(&db_tx, &cmd.user_id, category_id)
                    .await?;
            }

            let card_id = match self.posting_card(&db_tx, bank.id).await? {
                Some(card) => card.id,
                None => {
                    let card = Card::new(bank.id, format!("{} deposits", bank.name), CardKind::Debit);
                    let model: cards::ActiveModel = (&card).into();
                    model.insert(&db_tx).await?;
                    info!(card_id = %card.id, bank_id = %bank.id, "posting card created");
                    card.id
                }
            };

            let mut tx = Transaction::new(
                card_id,
                TransactionKind::Deposit,
                cmd.amount_minor,
                description,
                cmd.date,
            )?;
            tx.is_paid = true;
            tx.category_id = cmd.category_id;
            tx.created_via = cmd.created_via;

            let mut balances = BalanceAccumulator::new();
            self.insert_posted(&db_tx, bank.id, std::slice::from_ref(&tx), &mut balances)
                .await?;
            balances.persist(&db_tx).await?;

            info!(bank_id = %bank.id, amount_minor = tx.amount_minor, "deposit created");
            Ok(tx)
        })
    }
}
