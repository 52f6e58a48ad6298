use std::collections::HashMap;

use sea_orm::{
    ActiveValue, Condition, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    Bank, BalanceDirection, EngineError, ResultEngine, Transaction, banks, transactions,
    util::add_minor,
};

use super::{Engine, access::PostedTransaction, with_tx};

/// Collects the balance deltas of one operation, per bank.
///
/// Every `is_paid` change goes through [`BalanceAccumulator::transition`] (or
/// [`BalanceAccumulator::remove`] for deleted rows) and the summed deltas are
/// written with [`BalanceAccumulator::persist`] inside the same database
/// transaction as the row changes. Sums that leave the `i64` range fail with
/// `InvalidAmount`, which rolls the whole operation back.
#[derive(Debug, Default)]
pub(super) struct BalanceAccumulator {
    deltas: HashMap<Uuid, i64>,
}

impl BalanceAccumulator {
    pub(super) fn new() -> Self {
        Self::default()
    }

    fn add(&mut self, bank_id: Uuid, amount_minor: i64, direction: BalanceDirection) -> ResultEngine<()> {
        let delta = self.deltas.entry(bank_id).or_default();
        *delta = add_minor(*delta, direction.signed(amount_minor))?;
        Ok(())
    }

    /// Records the effect of moving `row` to the `target` paid state.
    ///
    /// Returns `false` (and records nothing) when the row is already there.
    pub(super) fn transition(&mut self, row: &PostedTransaction, target: bool) -> ResultEngine<bool> {
        if row.tx.is_paid == target {
            return Ok(false);
        }
        let direction = row.tx.kind.direction();
        let direction = if target { direction } else { direction.reversed() };
        self.add(row.bank_id, row.tx.amount_minor, direction)?;
        Ok(true)
    }

    /// Records the effect of a new row posted on `bank_id`.
    pub(super) fn insert(&mut self, bank_id: Uuid, tx: &Transaction) -> ResultEngine<()> {
        if !tx.is_paid {
            return Ok(());
        }
        self.add(bank_id, tx.amount_minor, tx.kind.direction())
    }

    /// Records the reversal of a row that is about to be deleted.
    pub(super) fn remove(&mut self, row: &PostedTransaction) -> ResultEngine<()> {
        if !row.tx.is_paid {
            return Ok(());
        }
        self.add(row.bank_id, row.tx.amount_minor, row.tx.kind.direction().reversed())
    }

    #[cfg(test)]
    fn delta(&self, bank_id: Uuid) -> i64 {
        self.deltas.get(&bank_id).copied().unwrap_or_default()
    }

    /// Writes every non-zero delta with a single `UPDATE` per bank.
    ///
    /// The new balance is range-checked against the stored one first; the
    /// `UPDATE` is still relative so it composes with other writers.
    pub(super) async fn persist(self, db_tx: &DatabaseTransaction) -> ResultEngine<()> {
        for (bank_id, delta) in self.deltas {
            if delta == 0 {
                continue;
            }
            let bank = banks::Entity::find_by_id(bank_id)
                .one(db_tx)
                .await?
                .ok_or_else(|| EngineError::KeyNotFound("bank not exists".to_string()))?;
            add_minor(bank.current_balance, delta)?;

            banks::Entity::update_many()
                .col_expr(
                    banks::Column::CurrentBalance,
                    Expr::col(banks::Column::CurrentBalance).add(delta),
                )
                .filter(banks::Column::Id.eq(bank_id))
                .exec(db_tx)
                .await?;
            debug!(%bank_id, delta, "bank balance updated");
        }
        Ok(())
    }
}

impl Engine {
    /// Rebuilds `current_balance` of every bank of `user_id` from its opening
    /// balance and its paid transactions.
    ///
    /// Only needed to repair data written outside the engine; the engine keeps
    /// balances in sync on every write.
    pub async fn recompute_balances(&self, user_id: &str) -> ResultEngine<Vec<Bank>> {
        with_tx!(self, |db_tx| {
            let bank_models: Vec<banks::Model> = banks::Entity::find()
                .filter(banks::Column::UserId.eq(user_id))
                .order_by_asc(banks::Column::Name)
                .all(&db_tx)
                .await?;
            let mut rebuilt: HashMap<Uuid, Bank> = bank_models
                .iter()
                .map(|model| {
                    let mut bank = Bank::from(model.clone());
                    bank.current_balance = bank.opening_balance;
                    (bank.id, bank)
                })
                .collect();

            let paid = self
                .find_posted(
                    &db_tx,
                    Some(user_id),
                    Condition::all().add(transactions::Column::IsPaid.eq(true)),
                )
                .await?;
            for row in &paid {
                if let Some(bank) = rebuilt.get_mut(&row.bank_id) {
                    bank.apply(row.tx.amount_minor, row.tx.kind.direction())?;
                }
            }

            let mut out = Vec::with_capacity(bank_models.len());
            for model in bank_models {
                let Some(bank) = rebuilt.remove(&model.id) else {
                    continue;
                };
                if bank.current_balance != model.current_balance {
                    info!(
                        bank_id = %model.id,
                        stored = model.current_balance,
                        expected = bank.current_balance,
                        "bank balance drift repaired"
                    );
                    let active = banks::ActiveModel {
                        id: ActiveValue::Set(model.id),
                        current_balance: ActiveValue::Set(bank.current_balance),
                        ..Default::default()
                    };
                    active.update(&db_tx).await?;
                }
                out.push(bank);
            }
            Ok(out)
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;
    use crate::TransactionKind;

    fn posted(bank_id: Uuid, kind: TransactionKind, amount: i64, paid: bool) -> PostedTransaction {
        let mut tx = Transaction::new(
            Uuid::new_v4(),
            kind,
            amount,
            "row".to_string(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
        .unwrap();
        tx.is_paid = paid;
        PostedTransaction { tx, bank_id }
    }

    #[test]
    fn transition_only_records_real_changes() {
        let bank = Uuid::new_v4();
        let mut acc = BalanceAccumulator::new();
        let paid = posted(bank, TransactionKind::Expense, 1_000, true);
        let unpaid = posted(bank, TransactionKind::Expense, 500, false);

        assert!(!acc.transition(&paid, true).unwrap());
        assert!(acc.transition(&unpaid, true).unwrap());
        assert_eq!(acc.delta(bank), -500);

        assert!(acc.transition(&paid, false).unwrap());
        assert_eq!(acc.delta(bank), 500);
    }

    #[test]
    fn remove_reverses_only_paid_rows() {
        let bank = Uuid::new_v4();
        let mut acc = BalanceAccumulator::new();
        acc.remove(&posted(bank, TransactionKind::Deposit, 2_000, true))
            .unwrap();
        acc.remove(&posted(bank, TransactionKind::Deposit, 9_999, false))
            .unwrap();
        assert_eq!(acc.delta(bank), -2_000);
        let refund = posted(bank, TransactionKind::Refund, 300, true);
        acc.insert(bank, &refund.tx).unwrap();
        assert_eq!(acc.delta(bank), -1_700);
    }

    #[test]
    fn deltas_are_kept_per_bank() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut acc = BalanceAccumulator::new();
        acc.transition(&posted(a, TransactionKind::TransferOut, 700, false), true)
            .unwrap();
        acc.transition(&posted(b, TransactionKind::TransferIn, 700, false), true)
            .unwrap();
        assert_eq!(acc.delta(a), -700);
        assert_eq!(acc.delta(b), 700);
    }

    #[test]
    fn overflowing_delta_is_an_invalid_amount() {
        let bank = Uuid::new_v4();
        let mut acc = BalanceAccumulator::new();
        let half = i64::MAX / 2 + 10;
        acc.transition(&posted(bank, TransactionKind::Deposit, half, false), true)
            .unwrap();
        let err = acc
            .transition(&posted(bank, TransactionKind::Deposit, half, false), true)
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidAmount(_)));
        assert_eq!(acc.delta(bank), half);
    }
}
