use sea_orm::TransactionTrait;
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, TransactionKind, TransferCmd,
    util::{ensure_positive_amount, normalize_description},
};

use super::super::{Engine, balances::BalanceAccumulator, with_tx};

/// The two rows of a transfer, sharing `group_id`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferPair {
    pub group_id: Uuid,
    pub outgoing: Transaction,
    pub incoming: Transaction,
}

impl Engine {
    /// Move money from one bank to another.
    ///
    /// Creates a `transfer_out` row on the oldest card of `from_bank_id` and a
    /// `transfer_in` row on the oldest card of `to_bank_id`. Both rows are
    /// unpaid and follow the usual toggle lifecycle.
    ///
    /// Fails without writing anything when the banks are the same, either
    /// bank is missing or either bank has no card.
    pub async fn create_transfer(&self, cmd: TransferCmd) -> ResultEngine<TransferPair> {
        if cmd.from_bank_id == cmd.to_bank_id {
            return Err(EngineError::InvalidTransfer(
                "from and to bank must differ".to_string(),
            ));
        }
        ensure_positive_amount(cmd.amount_minor)?;
        let description = normalize_description(&cmd.description)?;

        with_tx!(self, |db_tx| {
            let from_bank = self
                .require_bank(&db_tx, &cmd.user_id, cmd.from_bank_id)
                .await?;
            let to_bank = self
                .require_bank(&db_tx, &cmd.user_id, cmd.to_bank_id)
                .await?;
            let from_card = self.posting_card(&db_tx, from_bank.id).await?.ok_or_else(|| {
                EngineError::InvalidTransfer(format!("bank {} has no posting card", from_bank.name))
            })?;
            let to_card = self.posting_card(&db_tx, to_bank.id).await?.ok_or_else(|| {
                EngineError::InvalidTransfer(format!("bank {} has no posting card", to_bank.name))
            })?;

            let group_id = Uuid::new_v4();
            let mut outgoing = Transaction::new(
                from_card.id,
                TransactionKind::TransferOut,
                cmd.amount_minor,
                format!("Transfer to {}: {description}", to_bank.name),
                cmd.date,
            )?;
            outgoing.group_id = Some(group_id);
            outgoing.transfer_to_bank_id = Some(to_bank.id);
            outgoing.created_via = cmd.created_via;

            let mut incoming = Transaction::new(
                to_card.id,
                TransactionKind::TransferIn,
                cmd.amount_minor,
                format!("Transfer from {}: {description}", from_bank.name),
                cmd.date,
            )?;
            incoming.group_id = Some(group_id);
            incoming.created_via = cmd.created_via;

            let mut balances = BalanceAccumulator::new();
            self.insert_posted(
                &db_tx,
                from_bank.id,
                std::slice::from_ref(&outgoing),
                &mut balances,
            )
            .await?;
            self.insert_posted(
                &db_tx,
                to_bank.id,
                std::slice::from_ref(&incoming),
                &mut balances,
            )
            .await?;
            balances.persist(&db_tx).await?;

            info!(
                from_bank_id = %from_bank.id,
                to_bank_id = %to_bank.id,
                amount_minor = cmd.amount_minor,
                %group_id,
                "transfer created"
            );
            Ok(TransferPair {
                group_id,
                outgoing,
                incoming,
            })
        })
    }
}
