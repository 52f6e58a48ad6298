use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
    sea_query::Expr,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    Bank, EngineError, ResultEngine, banks, cards, transactions,
    util::{normalize_display_name, normalize_name_key},
};

use super::{Engine, with_tx};

impl Engine {
    /// Add a bank for `user_id`.
    ///
    /// `opening_balance` is the balance before any transaction; it is also the
    /// starting `current_balance`.
    pub async fn create_bank(
        &self,
        user_id: &str,
        name: &str,
        opening_balance: i64,
    ) -> ResultEngine<Bank> {
        let name = normalize_display_name(name, "bank")?;
        let name_norm = normalize_name_key(&name, "bank")?;
        with_tx!(self, |db_tx| {
            self.require_user(&db_tx, user_id).await?;
            self.ensure_bank_name_free(&db_tx, user_id, &name_norm, None)
                .await?;

            let bank = Bank::new(user_id.to_string(), name, opening_balance);
            let model: banks::ActiveModel = (&bank, name_norm).into();
            model.insert(&db_tx).await?;
            info!(bank_id = %bank.id, %user_id, "bank created");
            Ok(bank)
        })
    }

    /// Return a bank snapshot from DB.
    pub async fn bank(&self, user_id: &str, bank_id: Uuid) -> ResultEngine<Bank> {
        with_tx!(self, |db_tx| {
            let model = self.require_bank(&db_tx, user_id, bank_id).await?;
            Ok(Bank::from(model))
        })
    }

    pub async fn list_banks(&self, user_id: &str) -> ResultEngine<Vec<Bank>> {
        let models = banks::Entity::find()
            .filter(banks::Column::UserId.eq(user_id))
            .order_by_asc(banks::Column::NameNorm)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Bank::from).collect())
    }

    pub async fn rename_bank(&self, user_id: &str, bank_id: Uuid, name: &str) -> ResultEngine<Bank> {
        let name = normalize_display_name(name, "bank")?;
        let name_norm = normalize_name_key(&name, "bank")?;
        with_tx!(self, |db_tx| {
            self.require_bank(&db_tx, user_id, bank_id).await?;
            self.ensure_bank_name_free(&db_tx, user_id, &name_norm, Some(bank_id))
                .await?;
            let active = banks::ActiveModel {
                id: ActiveValue::Set(bank_id),
                name: ActiveValue::Set(name),
                name_norm: ActiveValue::Set(name_norm),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Ok(Bank::from(model))
        })
    }

    /// Delete a bank together with its cards and their transactions.
    ///
    /// Transfers on other banks that pointed at this one keep their rows but
    /// lose the `transfer_to_bank_id` reference. Returns the number of
    /// transactions deleted.
    pub async fn delete_bank(&self, user_id: &str, bank_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            self.require_bank(&db_tx, user_id, bank_id).await?;

            let card_ids: Vec<Uuid> = cards::Entity::find()
                .filter(cards::Column::BankId.eq(bank_id))
                .all(&db_tx)
                .await?
                .into_iter()
                .map(|card| card.id)
                .collect();

            let deleted = if card_ids.is_empty() {
                0
            } else {
                transactions::Entity::delete_many()
                    .filter(transactions::Column::CardId.is_in(card_ids))
                    .exec(&db_tx)
                    .await?
                    .rows_affected
            };

            transactions::Entity::update_many()
                .col_expr(
                    transactions::Column::TransferToBankId,
                    Expr::value(Option::<Uuid>::None),
                )
                .filter(transactions::Column::TransferToBankId.eq(bank_id))
                .exec(&db_tx)
                .await?;

            cards::Entity::delete_many()
                .filter(cards::Column::BankId.eq(bank_id))
                .exec(&db_tx)
                .await?;
            banks::Entity::delete_by_id(bank_id).exec(&db_tx).await?;

            info!(%bank_id, transactions = deleted, "bank deleted");
            Ok(deleted)
        })
    }

    async fn ensure_bank_name_free(
        &self,
        db_tx: &DatabaseTransaction,
        user_id: &str,
        name_norm: &str,
        except: Option<Uuid>,
    ) -> ResultEngine<()> {
        let mut query = banks::Entity::find()
            .filter(banks::Column::UserId.eq(user_id))
            .filter(banks::Column::NameNorm.eq(name_norm));
        if let Some(id) = except {
            query = query.filter(banks::Column::Id.ne(id));
        }
        if let Some(existing) = query.one(db_tx).await? {
            return Err(EngineError::ExistingKey(existing.name));
        }
        Ok(())
    }
}
