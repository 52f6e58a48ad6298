use sea_orm::DatabaseConnection;

mod access;
mod balances;
mod banks;
mod cards;
mod categories;
mod summary;
mod transactions;
mod users;

pub use summary::{
    BankBalance, BankSummary, CardTotal, CategoryTotal, PeriodTotal, SummaryFilter, TOTAL_ROW,
    UNCATEGORIZED, UsageRow,
};
pub use transactions::{PaymentStatus, TransactionListFilter, TransactionPage, TransferPair};

use crate::ResultEngine;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }
}

/// The builder for `Engine`
#[derive(Default)]
pub struct EngineBuilder {
    database: DatabaseConnection,
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
        })
    }
}
