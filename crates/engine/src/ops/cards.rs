use sea_orm::{
    ActiveValue, Condition, JoinType, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*,
};
use tracing::info;
use uuid::Uuid;

use crate::{
    Card, NewCardCmd, ResultEngine, banks, cards, transactions,
    util::{normalize_display_name, validate_due_day, validate_limit},
};

use super::{Engine, balances::BalanceAccumulator, with_tx};

impl Engine {
    /// Add a card to one of the user's banks.
    pub async fn create_card(&self, cmd: NewCardCmd) -> ResultEngine<Card> {
        let name = normalize_display_name(&cmd.name, "card")?;
        validate_due_day(cmd.due_day)?;
        validate_limit(cmd.limit_minor)?;
        with_tx!(self, |db_tx| {
            self.require_bank(&db_tx, &cmd.user_id, cmd.bank_id).await?;

            let mut card = Card::new(cmd.bank_id, name, cmd.kind);
            card.limit_minor = cmd.limit_minor;
            card.due_day = cmd.due_day;
            let model: cards::ActiveModel = (&card).into();
            model.insert(&db_tx).await?;
            info!(card_id = %card.id, bank_id = %card.bank_id, "card created");
            Ok(card)
        })
    }

    /// Return a card snapshot from DB.
    pub async fn card(&self, user_id: &str, card_id: Uuid) -> ResultEngine<Card> {
        with_tx!(self, |db_tx| {
            let (model, _) = self.require_card(&db_tx, user_id, card_id).await?;
            Card::try_from(model)
        })
    }

    /// Cards of the user, optionally restricted to one bank.
    pub async fn list_cards(&self, user_id: &str, bank_id: Option<Uuid>) -> ResultEngine<Vec<Card>> {
        let mut query = cards::Entity::find()
            .join(JoinType::InnerJoin, cards::Relation::Bank.def())
            .filter(banks::Column::UserId.eq(user_id))
            .order_by_asc(cards::Column::CreatedAt)
            .order_by_asc(cards::Column::Id);
        if let Some(bank_id) = bank_id {
            query = query.filter(cards::Column::BankId.eq(bank_id));
        }
        query
            .all(&self.database)
            .await?
            .into_iter()
            .map(Card::try_from)
            .collect()
    }

    /// Change name, credit limit and due day of a card.
    ///
    /// Existing installments keep their dates; only new purchases use the new
    /// due day.
    pub async fn update_card(
        &self,
        user_id: &str,
        card_id: Uuid,
        name: &str,
        limit_minor: Option<i64>,
        due_day: Option<u32>,
    ) -> ResultEngine<Card> {
        let name = normalize_display_name(name, "card")?;
        validate_due_day(due_day)?;
        validate_limit(limit_minor)?;
        with_tx!(self, |db_tx| {
            self.require_card(&db_tx, user_id, card_id).await?;
            let active = cards::ActiveModel {
                id: ActiveValue::Set(card_id),
                name: ActiveValue::Set(name),
                limit_minor: ActiveValue::Set(limit_minor),
                due_day: ActiveValue::Set(due_day.map(|d| d as i32)),
                ..Default::default()
            };
            let model = active.update(&db_tx).await?;
            Card::try_from(model)
        })
    }

    /// Delete a card and its transactions, reversing the effect of the paid
    /// ones on the bank. Returns the number of transactions deleted.
    pub async fn delete_card(&self, user_id: &str, card_id: Uuid) -> ResultEngine<u64> {
        with_tx!(self, |db_tx| {
            self.require_card(&db_tx, user_id, card_id).await?;
            let rows = self
                .find_posted(
                    &db_tx,
                    Some(user_id),
                    Condition::all().add(transactions::Column::CardId.eq(card_id)),
                )
                .await?;

            let mut balances = BalanceAccumulator::new();
            for row in &rows {
                balances.remove(row)?;
            }

            let deleted = transactions::Entity::delete_many()
                .filter(transactions::Column::CardId.eq(card_id))
                .exec(&db_tx)
                .await?
                .rows_affected;
            cards::Entity::delete_by_id(card_id).exec(&db_tx).await?;
            balances.persist(&db_tx).await?;

            info!(%card_id, transactions = deleted, "card deleted");
            Ok(deleted)
        })
    }
}
