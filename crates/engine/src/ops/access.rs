use sea_orm::{
    Condition, ConnectionTrait, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, banks, cards, categories, transactions, users,
};

use super::Engine;

/// A transaction together with the bank its card belongs to.
#[derive(Clone, Debug)]
pub(super) struct PostedTransaction {
    pub(super) tx: Transaction,
    pub(super) bank_id: Uuid,
}

impl Engine {
    pub(super) async fn require_user<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
    ) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(user_id.to_string())
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("user not exists".to_string()))
    }

    pub(super) async fn require_bank<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        bank_id: Uuid,
    ) -> ResultEngine<banks::Model> {
        banks::Entity::find_by_id(bank_id)
            .filter(banks::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("bank not exists".to_string()))
    }

    /// Loads a card only if its bank belongs to `user_id`.
    pub(super) async fn require_card<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        card_id: Uuid,
    ) -> ResultEngine<(cards::Model, banks::Model)> {
        let row = cards::Entity::find_by_id(card_id)
            .find_also_related(banks::Entity)
            .filter(banks::Column::UserId.eq(user_id))
            .one(db)
            .await?;
        match row {
            Some((card, Some(bank))) => Ok((card, bank)),
            _ => Err(EngineError::KeyNotFound("card not exists".to_string())),
        }
    }

    pub(super) async fn require_category<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        category_id: Uuid,
    ) -> ResultEngine<categories::Model> {
        categories::Entity::find_by_id(category_id)
            .filter(categories::Column::UserId.eq(user_id))
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound("category not exists".to_string()))
    }

    /// The card used to post bank-level movements (deposits, transfers): the
    /// oldest card of the bank.
    pub(super) async fn posting_card<C: ConnectionTrait>(
        &self,
        db: &C,
        bank_id: Uuid,
    ) -> ResultEngine<Option<cards::Model>> {
        cards::Entity::find()
            .filter(cards::Column::BankId.eq(bank_id))
            .order_by_asc(cards::Column::CreatedAt)
            .order_by_asc(cards::Column::Id)
            .one(db)
            .await
            .map_err(Into::into)
    }

    /// Transactions matching `condition`, joined with their bank.
    ///
    /// With `user_id` set only rows posted on that user's banks are returned;
    /// `None` scans every user (maintenance sweeps only).
    pub(super) async fn find_posted<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: Option<&str>,
        condition: Condition,
    ) -> ResultEngine<Vec<PostedTransaction>> {
        let mut query = transactions::Entity::find()
            .find_also_related(cards::Entity)
            .join(JoinType::InnerJoin, cards::Relation::Bank.def())
            .filter(condition)
            .order_by_asc(transactions::Column::Date)
            .order_by_asc(transactions::Column::Id);
        if let Some(user_id) = user_id {
            query = query.filter(banks::Column::UserId.eq(user_id));
        }

        let rows: Vec<(transactions::Model, Option<cards::Model>)> = query.all(db).await?;
        let mut out = Vec::with_capacity(rows.len());
        for (tx_model, card_model) in rows {
            let Some(card_model) = card_model else {
                continue;
            };
            out.push(PostedTransaction {
                tx: Transaction::try_from(tx_model)?,
                bank_id: card_model.bank_id,
            });
        }
        Ok(out)
    }

    pub(super) async fn require_transaction<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        transaction_id: Uuid,
    ) -> ResultEngine<PostedTransaction> {
        self.find_posted(
            db,
            Some(user_id),
            Condition::all().add(transactions::Column::Id.eq(transaction_id)),
        )
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| EngineError::KeyNotFound("transaction not exists".to_string()))
    }

    /// Every row of an installment group, in installment order.
    pub(super) async fn require_group<C: ConnectionTrait>(
        &self,
        db: &C,
        user_id: &str,
        group_id: Uuid,
    ) -> ResultEngine<Vec<PostedTransaction>> {
        let mut rows = self
            .find_posted(
                db,
                Some(user_id),
                Condition::all().add(transactions::Column::GroupId.eq(group_id)),
            )
            .await?;
        if rows.is_empty() {
            return Err(EngineError::KeyNotFound("group not exists".to_string()));
        }
        rows.sort_by_key(|row| (row.tx.installment_number, row.tx.date));
        Ok(rows)
    }
}
