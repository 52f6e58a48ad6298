pub use banks::Bank;
pub use cards::{Card, CardKind};
pub use categories::Category;
pub use commands::{
    CreateTransactionCmd, DepositCmd, NewCardCmd, TransferCmd, UpdateGroupCmd,
    UpdateTransactionCmd,
};
pub use error::EngineError;
pub use installments::{
    DEFAULT_DUE_DAY, InstallmentSpec, MAX_INSTALLMENTS, expand_installments,
};
pub use money::MoneyCents;
pub use ops::{
    BankBalance, BankSummary, CardTotal, CategoryTotal, Engine, EngineBuilder, PaymentStatus,
    PeriodTotal, SummaryFilter, TOTAL_ROW, TransactionListFilter, TransactionPage, TransferPair,
    UNCATEGORIZED, UsageRow,
};
pub use transactions::{BalanceDirection, CreatedVia, Transaction, TransactionKind};

mod banks;
mod cards;
mod categories;
mod commands;
mod error;
mod installments;
mod money;
mod ops;
mod transactions;
mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
